use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A bounded box in `R^n`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    low: Vec<f64>,
    high: Vec<f64>,
}

impl BoxSpace {
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Result<Self> {
        if low.len() != high.len() {
            bail!(
                "Box bounds differ in length: low {} vs high {}",
                low.len(),
                high.len()
            );
        }

        if let Some(i) = low.iter().zip(&high).position(|(l, h)| l > h) {
            bail!("Box low bound exceeds high bound at dimension {}", i);
        }

        Ok(Self { low, high })
    }

    pub fn uniform(dim: usize, low: f64, high: f64) -> Result<Self> {
        Self::new(vec![low; dim], vec![high; dim])
    }

    pub fn flat_dim(&self) -> usize {
        self.low.len()
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.flat_dim()
            && x
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(v, (l, h))| v >= l && v <= h)
    }

    pub fn clip(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.low.iter().zip(&self.high))
            .map(|(v, (l, h))| v.clamp(*l, *h))
            .collect()
    }
}
