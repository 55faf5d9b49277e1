use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use common::HarnessError;
use environment::{Environment, EnvironmentSession};
use log::info;
use policy::Policy;

use super::{evaluate_skills, ArtifactAggregator, ArtifactNames, RolloutOptions, VideoWriter};

/// Extremal skills are re-run over this many multiples of the evaluation horizon.
pub const EXTENDED_HORIZON_MULTIPLIER: usize = 3;

#[derive(Clone, Debug)]
pub struct VisualizeOptions {
    pub max_path_length: usize,
    pub deterministic: bool,
    pub separate_videos: bool,
    pub episode_timeout: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct VisualizeReport {
    pub returns: Vec<f64>,
    pub best_skill: usize,
    pub worst_skill: usize,
    pub best_return: f64,
    pub worst_return: f64,
    pub extended_best_return: f64,
    pub extended_worst_return: f64,
    pub artifacts: Vec<PathBuf>,
}

impl VisualizeReport {
    pub fn num_skills(&self) -> usize {
        self.returns.len()
    }
}

/// Evaluates every skill of a skill-conditioned policy, writes per-skill artifacts, then records
/// extended rollouts of the best and worst skills.
///
/// Best and worst rewards are printed to stdout. A skill whose artifacts fail to write does not
/// stop the extremal videos; the failure is returned once they are written.
///
/// The environment is owned for the whole run and terminated exactly once, whether or not the
/// run succeeds.
pub fn visualize<E, P, W>(
    env: E,
    policy: &mut P,
    names: &ArtifactNames,
    writer: &mut W,
    options: &VisualizeOptions,
) -> Result<VisualizeReport>
where
    E: Environment,
    P: Policy + ?Sized,
    W: VideoWriter + ?Sized,
{
    let mut session = EnvironmentSession::new(env);
    let outcome = run(session.env_mut(), policy, names, writer, options);
    let terminated = session.terminate();

    let report = outcome?;
    terminated?;

    Ok(report)
}

fn run<E, P, W>(
    env: &mut E,
    policy: &mut P,
    names: &ArtifactNames,
    writer: &mut W,
    options: &VisualizeOptions,
) -> Result<VisualizeReport>
where
    E: Environment + ?Sized,
    P: Policy + ?Sized,
    W: VideoWriter + ?Sized,
{
    if options.max_path_length == 0 {
        return Err(HarnessError::configuration("max_path_length must be at least 1").into());
    }

    let extended_path_length = options
        .max_path_length
        .checked_mul(EXTENDED_HORIZON_MULTIPLIER)
        .ok_or_else(|| {
            HarnessError::configuration(format!(
                "max_path_length {} is too large to extend {} times",
                options.max_path_length, EXTENDED_HORIZON_MULTIPLIER
            ))
        })?;

    let rollout_options = RolloutOptions {
        max_path_length: options.max_path_length,
        render: true,
        episode_timeout: options.episode_timeout,
    };

    let evaluation = evaluate_skills(env, policy, options.deterministic, &rollout_options)?;
    let ranking = evaluation.ranking()?;

    let mut aggregator = ArtifactAggregator::new(names, writer, options.separate_videos);
    let skill_artifacts = aggregator.write_skill_artifacts(&evaluation)?;
    drop(evaluation);

    info!(
        "Best skill {:02} with reward {:.3}, worst skill {:02} with reward {:.3}",
        ranking.best(),
        ranking.best_return(),
        ranking.worst(),
        ranking.worst_return()
    );
    println!("Best reward: {}", rounded(ranking.best_return()));
    println!("Worst reward: {}", rounded(ranking.worst_return()));

    let extended_options = RolloutOptions {
        max_path_length: extended_path_length,
        ..rollout_options
    };

    let extended = aggregator.record_extremal(
        env,
        policy,
        &ranking,
        options.deterministic,
        &extended_options,
    )?;

    skill_artifacts.ensure_complete()?;

    let mut artifacts = skill_artifacts.written;
    artifacts.push(names.best_video());
    artifacts.push(names.worst_video());

    Ok(VisualizeReport {
        returns: ranking.returns().to_vec(),
        best_skill: ranking.best(),
        worst_skill: ranking.worst(),
        best_return: ranking.best_return(),
        worst_return: ranking.worst_return(),
        extended_best_return: extended.best,
        extended_worst_return: extended.worst,
        artifacts,
    })
}

// Rounds to the nearest integer without printing negative zero.
fn rounded(value: f64) -> i64 {
    value.round() as i64
}
