use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use common::{HarnessError, Value};
use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};

use super::{TrainingBackend, Variant, VariantGenerator};

/// Only sequential training is supported. Higher degrees break learning of the
/// skill-conditioned policy.
pub const REQUIRED_PARALLELISM: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotMode {
    All,
    Last,
    Gap,
    None,
}

impl FromStr for SnapshotMode {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(SnapshotMode::All),
            "last" => Ok(SnapshotMode::Last),
            "gap" => Ok(SnapshotMode::Gap),
            "none" => Ok(SnapshotMode::None),
            other => Err(HarnessError::configuration(format!(
                "Unknown snapshot_mode {}, expected one of all, last, gap, none",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub exp_name: String,
    pub mode: String,
    pub log_dir: PathBuf,
    pub n_parallel: usize,
    pub tag_keys: Vec<String>,
    pub env_idx: usize,
    pub no_graphics: bool,
}

/// Everything the training backend needs to run one variant.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunRequest {
    pub index: usize,
    pub tag: String,
    pub exp_prefix: String,
    pub exp_name: String,
    pub log_dir: PathBuf,
    pub mode: String,
    pub n_parallel: usize,
    pub seed: i64,
    pub snapshot_mode: SnapshotMode,
    pub snapshot_gap: usize,
    pub sync_snapshots: bool,
    pub terminate_machine: bool,
    pub env_idx: usize,
    pub no_graphics: bool,
    pub variant: Variant,
}

/// Validates every variant and derives its names and paths. Nothing is dispatched.
pub fn plan_experiments(variants: &[Variant], options: &LaunchOptions) -> Result<Vec<RunRequest>> {
    if options.n_parallel != REQUIRED_PARALLELISM {
        return Err(HarnessError::configuration(format!(
            "Parallelism degree must be {} but {} was requested",
            REQUIRED_PARALLELISM, options.n_parallel
        ))
        .into());
    }

    if options.tag_keys.is_empty() {
        return Err(HarnessError::configuration("At least one tag key is required").into());
    }

    let width = index_width(variants.len());

    variants
        .iter()
        .enumerate()
        .map(|(index, variant)| plan_experiment(index, width, variant, options))
        .collect()
}

/// Dispatches every variant sequentially, one blocking backend call each. The first failure
/// aborts the remaining variants.
pub fn launch_experiments<B: TrainingBackend + ?Sized>(
    generator: &VariantGenerator,
    options: &LaunchOptions,
    backend: &mut B,
) -> Result<Vec<RunRequest>> {
    let variants = generator.variants();

    if variants.is_empty() {
        return Err(HarnessError::configuration(format!(
            "Parameter space expands to zero variants, empty keys: [{}]",
            generator.empty_keys().iter().join(", ")
        ))
        .into());
    }

    let requests = plan_experiments(&variants, options)?;

    info!("Launching {} experiments.", requests.len());

    for request in &requests {
        info!(
            "Dispatching {} ({}) to {:?}",
            request.exp_name, request.tag, request.log_dir
        );

        backend
            .run(request)
            .map_err(|source| HarnessError::Dispatch {
                index: request.index,
                tag: request.tag.clone(),
                source,
            })?;
    }

    Ok(requests)
}

fn plan_experiment(
    index: usize,
    width: usize,
    variant: &Variant,
    options: &LaunchOptions,
) -> Result<RunRequest> {
    let tag = variant.tag(&options.tag_keys)?;
    let invalid = |key: &str, expected: &str| {
        HarnessError::configuration(format!(
            "Variant {} ({}): {} must be {}",
            index, tag, key, expected
        ))
    };

    if let Some(n_parallel) = variant.get("n_parallel") {
        if n_parallel.as_usize() != Some(REQUIRED_PARALLELISM) {
            return Err(invalid("n_parallel", "1").into());
        }
    }

    let prefix = match variant.get("prefix") {
        Some(Value::String(prefix)) => prefix.clone(),
        _ => return Err(invalid("prefix", "a string").into()),
    };

    let seed = variant
        .get("seed")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| invalid("seed", "an integer"))?;

    let snapshot_mode = match variant.get("snapshot_mode") {
        Some(value) => value
            .as_string()
            .and_then(|mode| mode.parse::<SnapshotMode>().ok())
            .ok_or_else(|| invalid("snapshot_mode", "one of all, last, gap, none"))?,
        None => SnapshotMode::Last,
    };

    let snapshot_gap = match variant.get("snapshot_gap") {
        Some(value) => value
            .as_usize()
            .filter(|gap| *gap > 0)
            .ok_or_else(|| invalid("snapshot_gap", "a positive integer"))?,
        None => 1,
    };

    let sync_snapshots = match variant.get("sync_pkl") {
        Some(value) => value
            .as_bool()
            .ok_or_else(|| invalid("sync_pkl", "a boolean"))?,
        None => false,
    };

    Ok(RunRequest {
        index,
        exp_prefix: format!("{}/{}", prefix, options.exp_name),
        exp_name: format!(
            "{}-{}-{:0width$}",
            prefix,
            options.exp_name,
            index,
            width = width
        ),
        log_dir: options.log_dir.join(&tag),
        tag,
        mode: options.mode.clone(),
        n_parallel: options.n_parallel,
        seed,
        snapshot_mode,
        snapshot_gap,
        sync_snapshots,
        terminate_machine: true,
        env_idx: options.env_idx,
        no_graphics: options.no_graphics,
        variant: variant.clone(),
    })
}

// Two digits at minimum, more when needed so names keep sorting in launch order.
fn index_width(num_variants: usize) -> usize {
    let max_index = num_variants.saturating_sub(1);

    max_index.to_string().len().max(2)
}
