mod cli;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, LaunchCommand, VisualizeCommand};
use common::{ConfigLoader, FsExt, HarnessError};
use dotenv::dotenv;
use env_logger::Env;
use log::info;
use policy::Snapshot;
use skills::{visualize, ArtifactNames, RawVideoWriter, VideoWriter, VisualizeOptions};
use sweep::{
    launch_experiments, CommandBackend, DryRunBackend, LaunchOptions, SweepOptions,
    TrainingBackend, REQUIRED_PARALLELISM,
};

fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Launch(launch_args) => launch(launch_args),
        Commands::Visualize(visualize_args) => visualize_snapshot(visualize_args),
    }
}

fn launch(args: &LaunchCommand) -> Result<()> {
    let config_path = args.config.relative_to_cwd()?;
    let config = ConfigLoader::new(config_path, args.env.clone())?;

    let sweep_options: SweepOptions = config.load()?;

    let exp_name = match &args.exp_name {
        Some(exp_name) => exp_name.clone(),
        None => SystemTime::now()
            .duration_since(UNIX_EPOCH)?
            .as_secs()
            .to_string(),
    };

    let launch_options = LaunchOptions {
        exp_name,
        mode: args.mode.clone(),
        log_dir: args.log_dir.relative_to_cwd()?,
        n_parallel: REQUIRED_PARALLELISM,
        tag_keys: sweep_options.tag_keys.clone(),
        env_idx: args.idx,
        no_graphics: args.no_graphics,
    };

    let mut backend: Box<dyn TrainingBackend> = if args.dry_run {
        Box::new(DryRunBackend::new())
    } else {
        let train_cmd = sweep_options.train_cmd.clone().ok_or_else(|| {
            HarnessError::configuration("train_cmd must be set unless --dry-run is given")
        })?;

        Box::new(CommandBackend::new(train_cmd))
    };

    let requests = launch_experiments(&sweep_options.parameters, &launch_options, &mut *backend)?;

    info!("Completed {} experiments", requests.len());

    Ok(())
}

fn visualize_snapshot(args: &VisualizeCommand) -> Result<()> {
    let snapshot_path = args.file.relative_to_cwd()?;
    let data_dir = args.data_dir.relative_to_cwd()?;

    let (mut policy, env) = Snapshot::load(&snapshot_path)?.into_parts()?;

    let mut writer = RawVideoWriter::new(args.speedup)?;
    let names = ArtifactNames::new(&snapshot_path, &data_dir, writer.extension());

    let options = VisualizeOptions {
        max_path_length: args.max_path_length,
        deterministic: args.deterministic(),
        separate_videos: args.separate_videos,
        episode_timeout: args.episode_timeout_secs.map(Duration::from_secs),
    };

    let report = visualize(env, &mut policy, &names, &mut writer, &options)?;

    info!("Wrote {} artifacts", report.artifacts.len());

    Ok(())
}
