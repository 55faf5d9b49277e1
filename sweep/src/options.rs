use std::collections::BTreeMap;

use anyhow::Result;
use common::{Config, ConfigLoader, HarnessError, Value};
use itertools::Itertools;

use super::VariantGenerator;

/// Parameters shared by every environment section.
pub const SHARED_SECTION: &str = "shared";

pub struct SweepOptions {
    pub tag_keys: Vec<String>,
    pub train_cmd: Option<String>,
    pub parameters: VariantGenerator,
}

impl Config for SweepOptions {
    /// Merges the `shared` section with the loader's scope section, the scope winning on
    /// conflicts. Keys are registered in lexicographic order.
    fn load(config: &ConfigLoader) -> Result<Self> {
        let scope = config.scope();
        if scope == SHARED_SECTION || !config.has_section(scope) {
            let available = config
                .sections()
                .into_iter()
                .filter(|s| s != SHARED_SECTION)
                .join(", ");

            return Err(HarnessError::configuration(format!(
                "Unknown environment {}, available: [{}]",
                scope, available
            ))
            .into());
        }

        let mut merged = BTreeMap::<String, Vec<Value>>::new();
        for section in [SHARED_SECTION, scope] {
            for (key, values) in config.section(section)?.unwrap_or_default() {
                merged.insert(key, values);
            }
        }

        let mut parameters = VariantGenerator::new();
        for (key, values) in merged {
            parameters.add(key, values)?;
        }

        let tag_keys = config
            .get_list("tag_keys")?
            .map(|keys| keys.iter().filter_map(|k| k.as_string()).collect())
            .unwrap_or_else(|| vec!["seed".to_string()]);

        Ok(Self {
            tag_keys,
            train_cmd: config.get("train_cmd").and_then(|v| v.as_string()),
            parameters,
        })
    }
}
