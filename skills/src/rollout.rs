use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use environment::{Environment, Frame};
use policy::Policy;

#[derive(Clone, Debug)]
pub struct RolloutOptions {
    pub max_path_length: usize,
    pub render: bool,
    /// Checked after every step. A call that never returns still blocks.
    pub episode_timeout: Option<Duration>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    pub observations: Vec<Vec<f64>>,
    pub actions: Vec<Vec<f64>>,
    pub rewards: Vec<f64>,
    /// One frame after reset and one after every step when rendering.
    pub frames: Vec<Frame>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn total_return(&self) -> f64 {
        self.rewards.iter().sum()
    }
}

/// Runs one episode until the environment reports done or `max_path_length` steps are taken.
pub fn rollout<E, P>(env: &mut E, policy: &mut P, options: &RolloutOptions) -> Result<Trajectory>
where
    E: Environment + ?Sized,
    P: Policy + ?Sized,
{
    let started = Instant::now();
    let mut trajectory = Trajectory::default();

    let mut observation = env.reset()?;
    if options.render {
        trajectory.frames.push(env.render()?);
    }

    while trajectory.len() < options.max_path_length {
        let action = policy.get_action(&observation)?;
        let step = env.step(&action)?;

        trajectory.observations.push(observation);
        trajectory.actions.push(action);
        trajectory.rewards.push(step.reward);

        if options.render {
            trajectory.frames.push(env.render()?);
        }

        if let Some(timeout) = options.episode_timeout {
            if started.elapsed() > timeout {
                bail!(
                    "Episode exceeded its {:?} deadline after {} steps",
                    timeout,
                    trajectory.len()
                );
            }
        }

        if step.done {
            break;
        }

        observation = step.observation;
    }

    Ok(trajectory)
}
