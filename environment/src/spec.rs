use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{Environment, PointMass, PointMassOptions};

/// Serializable description of the environment a policy was trained against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvironmentSpec {
    PointMass(PointMassOptions),
}

impl EnvironmentSpec {
    pub fn build(&self) -> Result<Box<dyn Environment>> {
        match self {
            EnvironmentSpec::PointMass(options) => Ok(Box::new(PointMass::new(options.clone())?)),
        }
    }
}
