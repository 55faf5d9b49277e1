use anyhow::{bail, Result};
use common::HarnessError;

use super::Policy;

/// Feeds a constant one-hot skill `z` to a skill-conditioned policy alongside every observation.
pub struct FixedSkillPolicy<'a, P: Policy + ?Sized> {
    policy: &'a mut P,
    num_skills: usize,
    skill: usize,
    augmented: Vec<f64>,
}

impl<'a, P: Policy + ?Sized> FixedSkillPolicy<'a, P> {
    pub fn new(policy: &'a mut P, num_skills: usize, skill: usize) -> Result<Self> {
        if skill >= num_skills {
            return Err(HarnessError::configuration(format!(
                "Skill {} is out of range for {} skills",
                skill, num_skills
            ))
            .into());
        }

        if policy.observation_dim() < num_skills {
            return Err(HarnessError::configuration(format!(
                "Policy observation dimension {} cannot hold {} skills",
                policy.observation_dim(),
                num_skills
            ))
            .into());
        }

        let augmented = Vec::with_capacity(policy.observation_dim());

        Ok(Self {
            policy,
            num_skills,
            skill,
            augmented,
        })
    }

    pub fn skill(&self) -> usize {
        self.skill
    }
}

impl<P: Policy + ?Sized> Policy for FixedSkillPolicy<'_, P> {
    fn observation_dim(&self) -> usize {
        self.policy.observation_dim() - self.num_skills
    }

    fn action_dim(&self) -> usize {
        self.policy.action_dim()
    }

    fn get_action(&mut self, observation: &[f64]) -> Result<Vec<f64>> {
        if observation.len() != self.observation_dim() {
            bail!(
                "Expected an observation of dimension {} but received {}",
                self.observation_dim(),
                observation.len()
            );
        }

        self.augmented.clear();
        self.augmented.extend_from_slice(observation);
        self.augmented
            .extend((0..self.num_skills).map(|z| if z == self.skill { 1.0 } else { 0.0 }));

        self.policy.get_action(&self.augmented)
    }

    fn is_deterministic(&self) -> bool {
        self.policy.is_deterministic()
    }

    fn set_deterministic(&mut self, deterministic: bool) {
        self.policy.set_deterministic(deterministic)
    }
}
