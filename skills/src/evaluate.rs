use anyhow::Result;
use common::HarnessError;
use environment::Environment;
use log::info;
use policy::{DeterministicScope, FixedSkillPolicy, Policy};

use super::{rollout, RolloutOptions, SkillRanking, Trajectory};

/// Number of skill dimensions a policy appends to the environment's observation.
pub fn derive_num_skills(policy_dim: usize, env_dim: usize) -> Result<usize> {
    if env_dim >= policy_dim {
        return Err(HarnessError::configuration(format!(
            "Policy observation dimension {} must exceed the environment observation dimension {} \
             to leave room for a skill vector",
            policy_dim, env_dim
        ))
        .into());
    }

    Ok(policy_dim - env_dim)
}

#[derive(Clone, Debug)]
pub struct SkillRollout {
    pub skill: usize,
    pub trajectory: Trajectory,
}

impl SkillRollout {
    pub fn total_return(&self) -> f64 {
        self.trajectory.total_return()
    }
}

#[derive(Clone, Debug)]
pub struct SkillEvaluation {
    /// Indexed by skill.
    pub rollouts: Vec<SkillRollout>,
}

impl SkillEvaluation {
    pub fn num_skills(&self) -> usize {
        self.rollouts.len()
    }

    pub fn returns(&self) -> Vec<f64> {
        self.rollouts.iter().map(|r| r.total_return()).collect()
    }

    pub fn ranking(&self) -> Result<SkillRanking> {
        SkillRanking::from_returns(self.returns())
    }
}

/// Rolls out every skill in increasing order with the policy held in the requested mode.
///
/// The policy's previous mode is restored on return, including when a rollout fails.
pub fn evaluate_skills<E, P>(
    env: &mut E,
    policy: &mut P,
    deterministic: bool,
    options: &RolloutOptions,
) -> Result<SkillEvaluation>
where
    E: Environment + ?Sized,
    P: Policy + ?Sized,
{
    let num_skills = derive_num_skills(
        policy.observation_dim(),
        env.observation_space().flat_dim(),
    )?;

    info!(
        "Evaluating {} skills, deterministic: {}, max path length: {}",
        num_skills, deterministic, options.max_path_length
    );

    let mut scope = DeterministicScope::enter(policy, deterministic);
    let mut rollouts = Vec::with_capacity(num_skills);

    for skill in 0..num_skills {
        let trajectory = rollout_skill(env, &mut *scope, num_skills, skill, options)?;

        info!(
            "Skill {:02}: {} steps, return {:.3}",
            skill,
            trajectory.len(),
            trajectory.total_return()
        );

        rollouts.push(SkillRollout { skill, trajectory });
    }

    Ok(SkillEvaluation { rollouts })
}

/// A single rollout with the policy conditioned on `skill`.
pub fn rollout_skill<E, P>(
    env: &mut E,
    policy: &mut P,
    num_skills: usize,
    skill: usize,
    options: &RolloutOptions,
) -> Result<Trajectory>
where
    E: Environment + ?Sized,
    P: Policy + ?Sized,
{
    let mut fixed = FixedSkillPolicy::new(policy, num_skills, skill)?;

    rollout(env, &mut fixed, options)
        .map_err(|source| HarnessError::Evaluation { skill, source }.into())
}
