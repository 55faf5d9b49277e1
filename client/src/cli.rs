use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[clap(author, version)]
#[clap(name = "Skill Discovery Experiment Client")]
#[clap(about = "Launches hyperparameter sweeps and visualizes trained skill policies", long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Launch(LaunchCommand),
    Visualize(VisualizeCommand),
}

#[derive(Args)]
#[clap(about = "Expands the sweep for an environment and runs one training job per variant", long_about = None)]
pub struct LaunchCommand {
    #[clap(short, long, default_value_t = String::from("sweep.conf"))]
    pub config: String,

    /// Environment section of the sweep file.
    #[clap(short, long, default_value_t = String::from("swimmer"))]
    pub env: String,

    /// Defaults to the current UNIX timestamp.
    #[clap(long)]
    pub exp_name: Option<String>,

    #[clap(long, default_value_t = String::from("local"))]
    pub mode: String,

    #[clap(long, default_value_t = String::from("./logs/unity"))]
    pub log_dir: String,

    /// Index of the environment instance, forwarded to every run.
    #[clap(long, default_value_t = 0)]
    pub idx: usize,

    #[clap(long)]
    pub no_graphics: bool,

    /// Log the planned runs without executing them.
    #[clap(long)]
    pub dry_run: bool,
}

#[derive(Args)]
#[clap(about = "Rolls out every skill of a snapshot and records traces and videos", long_about = None)]
pub struct VisualizeCommand {
    /// Path to the snapshot file.
    pub file: String,

    #[clap(short = 'l', long, default_value_t = 100)]
    pub max_path_length: usize,

    /// Playback speedup of the written videos.
    #[clap(short, long, default_value_t = 1.0)]
    pub speedup: f64,

    #[clap(short, long, overrides_with = "no_deterministic")]
    pub deterministic: bool,

    #[clap(long, overrides_with = "deterministic")]
    pub no_deterministic: bool,

    #[clap(long)]
    pub separate_videos: bool,

    #[clap(long, default_value_t = String::from("./data"))]
    pub data_dir: String,

    #[clap(long)]
    pub episode_timeout_secs: Option<u64>,
}

impl VisualizeCommand {
    /// Deterministic unless `--no-deterministic` was given last.
    pub fn deterministic(&self) -> bool {
        self.deterministic || !self.no_deterministic
    }
}
