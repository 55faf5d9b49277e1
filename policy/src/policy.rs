use std::ops::{Deref, DerefMut};

use anyhow::Result;

pub trait Policy {
    /// Dimension of the observations accepted by `get_action`.
    fn observation_dim(&self) -> usize;
    fn action_dim(&self) -> usize;
    fn get_action(&mut self, observation: &[f64]) -> Result<Vec<f64>>;
    fn is_deterministic(&self) -> bool;
    fn set_deterministic(&mut self, deterministic: bool);
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn observation_dim(&self) -> usize {
        (**self).observation_dim()
    }

    fn action_dim(&self) -> usize {
        (**self).action_dim()
    }

    fn get_action(&mut self, observation: &[f64]) -> Result<Vec<f64>> {
        (**self).get_action(observation)
    }

    fn is_deterministic(&self) -> bool {
        (**self).is_deterministic()
    }

    fn set_deterministic(&mut self, deterministic: bool) {
        (**self).set_deterministic(deterministic)
    }
}

/// Pins a policy's action-selection mode until dropped, then restores the previous mode.
pub struct DeterministicScope<'a, P: Policy + ?Sized> {
    policy: &'a mut P,
    previous: bool,
}

impl<'a, P: Policy + ?Sized> DeterministicScope<'a, P> {
    pub fn enter(policy: &'a mut P, deterministic: bool) -> Self {
        let previous = policy.is_deterministic();
        policy.set_deterministic(deterministic);

        Self { policy, previous }
    }
}

impl<P: Policy + ?Sized> Deref for DeterministicScope<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.policy
    }
}

impl<P: Policy + ?Sized> DerefMut for DeterministicScope<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.policy
    }
}

impl<P: Policy + ?Sized> Drop for DeterministicScope<'_, P> {
    fn drop(&mut self) {
        self.policy.set_deterministic(self.previous);
    }
}
