use std::collections::HashMap;

use anyhow::Result;

use super::{BoxSpace, Frame};

#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub observation: Vec<f64>,
    pub reward: f64,
    pub done: bool,
    pub info: HashMap<String, f64>,
}

/// A single simulated environment instance. Calls are blocking and are never issued concurrently.
pub trait Environment {
    fn observation_space(&self) -> &BoxSpace;
    fn action_space(&self) -> &BoxSpace;
    fn reset(&mut self) -> Result<Vec<f64>>;
    fn step(&mut self, action: &[f64]) -> Result<Step>;
    fn render(&mut self) -> Result<Frame>;

    /// Releases the underlying resource. Must be called exactly once.
    fn terminate(&mut self) -> Result<()>;
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn observation_space(&self) -> &BoxSpace {
        (**self).observation_space()
    }

    fn action_space(&self) -> &BoxSpace {
        (**self).action_space()
    }

    fn reset(&mut self) -> Result<Vec<f64>> {
        (**self).reset()
    }

    fn step(&mut self, action: &[f64]) -> Result<Step> {
        (**self).step(action)
    }

    fn render(&mut self) -> Result<Frame> {
        (**self).render()
    }

    fn terminate(&mut self) -> Result<()> {
        (**self).terminate()
    }
}
