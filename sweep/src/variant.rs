use std::collections::BTreeMap;

use anyhow::Result;
use common::{HarnessError, Value};
use itertools::Itertools;
use serde::Serialize;

/// One concrete assignment of every swept parameter.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Variant {
    params: BTreeMap<String, Value>,
}

impl Variant {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Joins `key_value` pairs for the given keys with `__`, e.g. `seed_1__lr_0.001`.
    pub fn tag(&self, tag_keys: &[String]) -> Result<String> {
        let pairs = tag_keys
            .iter()
            .map(|key| {
                self.get(key)
                    .map(|value| format!("{}_{}", key, value))
                    .ok_or_else(|| {
                        HarnessError::configuration(format!(
                            "Tag key {} is not a swept parameter",
                            key
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pairs.iter().join("__"))
    }

    fn with(&self, key: &str, value: &Value) -> Self {
        let mut params = self.params.clone();
        params.insert(key.to_string(), value.clone());

        Self { params }
    }
}

/// Expands registered parameter dimensions into their cartesian product.
///
/// Ordering is nested iteration in registration order: the first registered key varies slowest
/// and the last registered key varies fastest.
#[derive(Clone, Debug, Default)]
pub struct VariantGenerator {
    dimensions: Vec<(String, Vec<Value>)>,
}

impl VariantGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let key = key.into();
        if self.dimensions.iter().any(|(k, _)| *k == key) {
            return Err(HarnessError::configuration(format!(
                "Parameter {} was registered twice",
                key
            ))
            .into());
        }

        self.dimensions.push((key, values));

        Ok(())
    }

    pub fn add_value(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        self.add(key, vec![value])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.dimensions.iter().map(|(k, _)| k.as_str())
    }

    /// Keys registered with no candidate values. Any such key empties the whole sweep.
    pub fn empty_keys(&self) -> Vec<&str> {
        self.dimensions
            .iter()
            .filter(|(_, values)| values.is_empty())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn num_variants(&self) -> usize {
        self.dimensions.iter().map(|(_, values)| values.len()).product()
    }

    pub fn variants(&self) -> Vec<Variant> {
        self.dimensions
            .iter()
            .fold(vec![Variant::default()], |variants, (key, values)| {
                variants
                    .iter()
                    .flat_map(|variant| values.iter().map(move |value| variant.with(key, value)))
                    .collect()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|v| Value::Integer(*v)).collect()
    }

    #[test]
    fn test_variant_count_is_product_of_cardinalities() {
        let mut vg = VariantGenerator::new();
        vg.add("seed", ints(&[1, 2, 3])).unwrap();
        vg.add("lr", vec![Value::Float(0.1), Value::Float(0.01)]).unwrap();
        vg.add_value("prefix", "swimmer".into()).unwrap();

        let variants = vg.variants();

        assert_eq!(variants.len(), 6);
        assert_eq!(vg.num_variants(), 6);
        assert!(variants.iter().all(|v| v.len() == 3));
    }

    #[test]
    fn test_first_registered_key_varies_slowest() {
        let mut vg = VariantGenerator::new();
        vg.add("a", ints(&[1, 2])).unwrap();
        vg.add("b", ints(&[10, 20, 30])).unwrap();

        let pairs = vg
            .variants()
            .iter()
            .map(|v| {
                (
                    v.get("a").and_then(|x| x.as_i64()).unwrap(),
                    v.get("b").and_then(|x| x.as_i64()).unwrap(),
                )
            })
            .collect::<Vec<_>>();

        assert_eq!(
            pairs,
            vec![(1, 10), (1, 20), (1, 30), (2, 10), (2, 20), (2, 30)]
        );
        assert_eq!(vg.variants(), vg.variants());
    }

    #[test]
    fn test_empty_list_yields_no_variants() {
        let mut vg = VariantGenerator::new();
        vg.add("seed", ints(&[1, 2])).unwrap();
        vg.add("lr", vec![]).unwrap();

        assert!(vg.variants().is_empty());
        assert_eq!(vg.num_variants(), 0);
        assert_eq!(vg.empty_keys(), vec!["lr"]);
    }

    #[test]
    fn test_no_dimensions_yields_single_empty_variant() {
        let vg = VariantGenerator::new();

        assert_eq!(vg.variants(), vec![Variant::default()]);
    }

    #[test]
    fn test_duplicate_key_is_configuration_error() {
        let mut vg = VariantGenerator::new();
        vg.add("seed", ints(&[1])).unwrap();
        let err = vg.add("seed", ints(&[2])).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Configuration { .. })
        ));
    }

    #[test]
    fn test_tag_is_deterministic() {
        let mut vg = VariantGenerator::new();
        vg.add("seed", ints(&[4])).unwrap();
        vg.add("lr", vec![Value::Float(0.0003)]).unwrap();
        let variant = &vg.variants()[0];
        let keys = vec!["seed".to_string(), "lr".to_string()];

        assert_eq!(variant.tag(&keys).unwrap(), "seed_4__lr_0.0003");
        assert_eq!(variant.tag(&keys).unwrap(), variant.tag(&keys).unwrap());
    }

    #[test]
    fn test_tag_with_unknown_key_fails() {
        let mut vg = VariantGenerator::new();
        vg.add("seed", ints(&[4])).unwrap();

        assert!(vg.variants()[0].tag(&["env".to_string()]).is_err());
    }
}
