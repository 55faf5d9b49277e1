use anyhow::{anyhow, bail, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::Policy;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearGaussianParams {
    /// One row per action dimension, one column per observation dimension.
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub log_std: Vec<f64>,
    #[serde(default)]
    pub seed: u64,
}

/// `a = tanh(W·o + b)`, with Gaussian exploration noise when stochastic.
///
/// The noise generator is re-seeded every time the mode is set so that entering an evaluation
/// scope always replays the same noise sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "LinearGaussianParams", into = "LinearGaussianParams")]
pub struct LinearGaussianPolicy {
    params: LinearGaussianParams,
    observation_dim: usize,
    rng: StdRng,
    deterministic: bool,
}

impl LinearGaussianPolicy {
    pub fn new(params: LinearGaussianParams) -> Result<Self> {
        let action_dim = params.weights.len();
        if action_dim == 0 {
            bail!("Policy must have at least one action dimension");
        }

        if params.bias.len() != action_dim || params.log_std.len() != action_dim {
            bail!(
                "Policy bias ({}) and log_std ({}) must match the {} weight rows",
                params.bias.len(),
                params.log_std.len(),
                action_dim
            );
        }

        let observation_dim = params.weights[0].len();
        if observation_dim == 0 || params.weights.iter().any(|row| row.len() != observation_dim) {
            bail!("Policy weight rows must all have the same, non-zero length");
        }

        let rng = StdRng::seed_from_u64(params.seed);

        Ok(Self {
            params,
            observation_dim,
            rng,
            deterministic: false,
        })
    }

    pub fn params(&self) -> &LinearGaussianParams {
        &self.params
    }
}

impl TryFrom<LinearGaussianParams> for LinearGaussianPolicy {
    type Error = anyhow::Error;

    fn try_from(params: LinearGaussianParams) -> Result<Self> {
        Self::new(params)
    }
}

impl From<LinearGaussianPolicy> for LinearGaussianParams {
    fn from(policy: LinearGaussianPolicy) -> Self {
        policy.params
    }
}

impl Policy for LinearGaussianPolicy {
    fn observation_dim(&self) -> usize {
        self.observation_dim
    }

    fn action_dim(&self) -> usize {
        self.params.weights.len()
    }

    fn get_action(&mut self, observation: &[f64]) -> Result<Vec<f64>> {
        if observation.len() != self.observation_dim {
            bail!(
                "Expected an observation of dimension {} but received {}",
                self.observation_dim,
                observation.len()
            );
        }

        let mut action = Vec::with_capacity(self.action_dim());
        for ((row, bias), log_std) in self
            .params
            .weights
            .iter()
            .zip(&self.params.bias)
            .zip(&self.params.log_std)
        {
            let activation = row.iter().zip(observation).map(|(w, o)| w * o).sum::<f64>() + bias;
            let mean = activation.tanh();

            if self.deterministic {
                action.push(mean);
            } else {
                let noise = Normal::new(0.0, log_std.exp())
                    .map_err(|e| anyhow!("Invalid policy log_std {}: {}", log_std, e))?;
                action.push(mean + noise.sample(&mut self.rng));
            }
        }

        Ok(action)
    }

    fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    fn set_deterministic(&mut self, deterministic: bool) {
        self.deterministic = deterministic;
        self.rng = StdRng::seed_from_u64(self.params.seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn params() -> LinearGaussianParams {
        LinearGaussianParams {
            weights: vec![vec![1.0, 0.0, 0.5], vec![0.0, -1.0, 0.0]],
            bias: vec![0.0, 0.1],
            log_std: vec![-1.0, -1.0],
            seed: 7,
        }
    }

    #[test]
    fn test_deterministic_action_is_tanh_of_affine() {
        let mut policy = LinearGaussianPolicy::new(params()).unwrap();
        policy.set_deterministic(true);

        let action = policy.get_action(&[0.5, 1.0, 1.0]).unwrap();

        assert_approx_eq!(action[0], 1.0f64.tanh());
        assert_approx_eq!(action[1], (-0.9f64).tanh());
    }

    #[test]
    fn test_stochastic_noise_replays_after_mode_change() {
        let mut policy = LinearGaussianPolicy::new(params()).unwrap();
        policy.set_deterministic(false);
        let first = (0..5)
            .map(|_| policy.get_action(&[0.1, 0.2, 0.3]).unwrap())
            .collect::<Vec<_>>();

        policy.set_deterministic(false);
        let second = (0..5)
            .map(|_| policy.get_action(&[0.1, 0.2, 0.3]).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(first, second);
        assert_ne!(first[0], first[1]);
    }

    #[test]
    fn test_shape_validation() {
        let mut bad = params();
        bad.bias.pop();
        assert!(LinearGaussianPolicy::new(bad).is_err());

        let mut ragged = params();
        ragged.weights[1].push(1.0);
        assert!(LinearGaussianPolicy::new(ragged).is_err());
    }

    #[test]
    fn test_wrong_observation_dimension() {
        let mut policy = LinearGaussianPolicy::new(params()).unwrap();

        assert!(policy.get_action(&[0.0; 2]).is_err());
    }
}
