use std::{collections::HashMap, fmt, path::Path};

use anyhow::{Context, Result};
use hocon::{Hocon, HoconLoader};
use log::info;
use serde::{Deserialize, Serialize};

use super::HarnessError;

#[derive(Debug)]
pub struct ConfigLoader {
    hocon: Hocon,
    env: HashMap<String, String>,
    scope: String,
}

impl ConfigLoader {
    pub fn new(path: impl AsRef<Path>, scope: String) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(HarnessError::configuration(format!(
                "The config file {:?} was not found",
                path
            ))
            .into());
        }

        let hocon = HoconLoader::new()
            .load_file(path)
            .with_context(|| format!("Failed to find or load config file at: {:?}", path))?
            .hocon()?;

        info!("Loaded config {:?} with scope {}", path, scope);

        Ok(Self::with_hocon(hocon, scope))
    }

    pub fn from_hocon_str(content: &str, scope: String) -> Result<Self> {
        let hocon = HoconLoader::new()
            .load_str(content)
            .with_context(|| "Failed to parse config")?
            .hocon()?;

        Ok(Self::with_hocon(hocon, scope))
    }

    fn with_hocon(hocon: Hocon, scope: String) -> Self {
        let env = std::env::vars().collect::<HashMap<_, _>>();

        Self { hocon, env, scope }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Looks up a scalar, checking the process environment, then the scope, then the root.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.env.get(name) {
            return Some(Value::String(value.clone()));
        }

        let scope = &self.hocon[self.scope.as_str()];
        if matches!(scope, Hocon::Hash(_)) {
            if let Some(value) = Self::map_hocon(scope, name) {
                return Some(value);
            }
        }

        Self::map_hocon(&self.hocon, name)
    }

    /// Looks up a list in the scope, then the root. A scalar is returned as a singleton list.
    pub fn get_list(&self, name: &str) -> Result<Option<Vec<Value>>> {
        let scope = &self.hocon[self.scope.as_str()];
        if matches!(scope, Hocon::Hash(_)) {
            if let Some(values) = Self::map_entry(name, &scope[name])? {
                return Ok(Some(values));
            }
        }

        Self::map_entry(name, &self.hocon[name])
    }

    pub fn has_section(&self, name: &str) -> bool {
        matches!(self.hocon[name], Hocon::Hash(_))
    }

    /// Names of every root-level object, sorted.
    pub fn sections(&self) -> Vec<String> {
        let mut sections = match &self.hocon {
            Hocon::Hash(hash) => hash
                .iter()
                .filter(|(_, v)| matches!(v, Hocon::Hash(_)))
                .map(|(k, _)| k.clone())
                .collect::<Vec<_>>(),
            _ => vec![],
        };

        sections.sort();
        sections
    }

    /// Entries of a root-level object as `(key, values)` sorted by key. Scalars are normalized to
    /// singleton lists.
    pub fn section(&self, name: &str) -> Result<Option<Vec<(String, Vec<Value>)>>> {
        let hash = match &self.hocon[name] {
            Hocon::Hash(hash) => hash,
            _ => return Ok(None),
        };

        let mut entries = Vec::with_capacity(hash.len());
        for (key, hocon) in hash {
            let values = Self::map_entry(key, hocon)?.ok_or_else(|| {
                HarnessError::configuration(format!(
                    "{}.{} must be a scalar or a list of scalars",
                    name, key
                ))
            })?;
            entries.push((key.clone(), values));
        }

        entries.sort_by(|(a, _), (b, _)| a.cmp(b));

        Ok(Some(entries))
    }

    pub fn load<T: Config>(&self) -> Result<T> {
        let res = T::load(self)?;
        Ok(res)
    }

    fn map_entry(name: &str, hocon: &Hocon) -> Result<Option<Vec<Value>>> {
        match hocon {
            Hocon::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| {
                        Self::map_scalar(item).ok_or_else(|| {
                            HarnessError::configuration(format!(
                                "{} may only contain scalar values",
                                name
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Some(values))
            }
            Hocon::BadValue(_) => Ok(None),
            other => Ok(Self::map_scalar(other).map(|v| vec![v])),
        }
    }

    fn map_hocon(hocon: &Hocon, name: &str) -> Option<Value> {
        Self::map_scalar(&hocon[name])
    }

    fn map_scalar(hocon: &Hocon) -> Option<Value> {
        match hocon {
            Hocon::Real(f64) => Some(Value::Float(*f64)),
            Hocon::Integer(i64) => Some(Value::Integer(*i64)),
            Hocon::String(string) => Some(Value::String(string.clone())),
            Hocon::Boolean(bool) => Some(Value::Boolean(*bool)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(val) => Some(*val),
            Value::String(val) => Hocon::String(val.clone()).as_bool(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(val) => Some(*val),
            Value::String(val) => val.parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.as_i64().and_then(|v| usize::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(val) => Some(*val),
            Value::Integer(val) => Some(*val as f64),
            Value::String(val) => val.parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::String(val) => Some(val.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(val) => write!(f, "{}", val),
            Value::Integer(val) => write!(f, "{}", val),
            Value::Float(val) => write!(f, "{}", val),
            Value::String(val) => write!(f, "{}", val),
        }
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Boolean(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::Integer(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::Float(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

pub trait Config {
    fn load(config: &ConfigLoader) -> Result<Self>
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::fs;
    use tempfile::tempdir;

    const SWEEP: &str = r#"
        tag_keys = [seed]
        shared {
            seed = [1, 2]
            lr = 3E-4
            snapshot_mode = gap
            sync_pkl = true
        }
        swimmer {
            prefix = swimmer
            max_path_length = 1000
            lr = 1E-3
        }
    "#;

    fn loader(scope: &str) -> ConfigLoader {
        ConfigLoader::from_hocon_str(SWEEP, scope.to_string()).unwrap()
    }

    #[test]
    fn test_get_prefers_scope_over_root() {
        let config = loader("swimmer");

        assert_eq!(
            config.get("prefix").and_then(|v| v.as_string()),
            Some("swimmer".to_string())
        );
        assert_eq!(config.get("missing"), None);
    }

    #[test]
    fn test_section_is_sorted_and_normalized() {
        let config = loader("swimmer");
        let shared = config.section("shared").unwrap().unwrap();
        let keys = shared.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();

        assert_eq!(keys, vec!["lr", "seed", "snapshot_mode", "sync_pkl"]);
        assert_eq!(shared[1].1, vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(shared[3].1, vec![Value::Boolean(true)]);
        assert_approx_eq!(shared[0].1[0].as_f64().unwrap(), 0.0003);
    }

    #[test]
    fn test_missing_section() {
        let config = loader("swimmer");

        assert!(config.section("ant").unwrap().is_none());
        assert!(!config.has_section("ant"));
        assert_eq!(config.sections(), vec!["shared", "swimmer"]);
    }

    #[test]
    fn test_get_list_falls_back_to_root() {
        let config = loader("swimmer");

        assert_eq!(
            config.get_list("tag_keys").unwrap(),
            Some(vec![Value::String("seed".to_string())])
        );
        assert_eq!(config.get_list("nope").unwrap(), None);
    }

    #[test]
    fn test_nested_object_in_section_is_rejected() {
        let config =
            ConfigLoader::from_hocon_str("shared { inner { a = 1 } }", "shared".to_string()).unwrap();
        let err = config.section("shared").unwrap_err();

        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Configuration { .. })
        ));
    }

    #[test]
    fn test_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep.conf");
        fs::write(&path, SWEEP).unwrap();

        let config = ConfigLoader::new(&path, "swimmer".to_string()).unwrap();

        assert_eq!(config.scope(), "swimmer");
        assert_eq!(config.get("max_path_length").and_then(|v| v.as_usize()), Some(1000));
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let dir = tempdir().unwrap();
        let err = ConfigLoader::new(dir.path().join("none.conf"), "swimmer".to_string())
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Configuration { .. })
        ));
    }

    #[test]
    fn test_value_display_and_json() {
        assert_eq!(Value::Float(0.0003).to_string(), "0.0003");
        assert_eq!(Value::String("gap".into()).to_string(), "gap");
        assert_eq!(Value::Integer(7).to_string(), "7");

        let json = serde_json::to_string(&vec![Value::Integer(1), Value::Boolean(false)]).unwrap();
        assert_eq!(json, "[1,false]");
    }
}
