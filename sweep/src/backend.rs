use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{bail, Context, Result};
use log::info;

use super::RunRequest;

pub const VARIANT_FILE_NAME: &str = "variant.json";

/// Runs one training job to completion, or fails.
pub trait TrainingBackend {
    fn run(&mut self, request: &RunRequest) -> Result<()>;
}

/// Hands each run to an external training command.
///
/// The request is written to `<log_dir>/variant.json` and the command template is run through
/// bash with `{variant}`, `{log_dir}`, `{exp_name}`, `{exp_prefix}`, `{mode}` and `{seed}`
/// substituted verbatim.
pub struct CommandBackend {
    template: String,
}

impl CommandBackend {
    pub fn new(template: String) -> Self {
        Self { template }
    }

    pub fn render(&self, request: &RunRequest, variant_path: &Path) -> String {
        self.template
            .replace("{variant}", &variant_path.to_string_lossy())
            .replace("{log_dir}", &request.log_dir.to_string_lossy())
            .replace("{exp_name}", &request.exp_name)
            .replace("{exp_prefix}", &request.exp_prefix)
            .replace("{mode}", &request.mode)
            .replace("{seed}", &request.seed.to_string())
    }
}

impl TrainingBackend for CommandBackend {
    fn run(&mut self, request: &RunRequest) -> Result<()> {
        fs::create_dir_all(&request.log_dir)
            .with_context(|| format!("Failed to create log dir {:?}", request.log_dir))?;

        let variant_path = request.log_dir.join(VARIANT_FILE_NAME);
        let mut writer = BufWriter::new(File::create(&variant_path)?);
        serde_json::to_writer_pretty(&mut writer, request)?;
        writer.flush()?;

        let cmd = self.render(request, &variant_path);
        let status = run_cmd(&cmd)?;

        if !status.success() {
            bail!("Training command for {} exited with {}", request.exp_name, status);
        }

        Ok(())
    }
}

/// Logs each request instead of training. Used by `--dry-run`.
#[derive(Default)]
pub struct DryRunBackend {
    requests: Vec<RunRequest>,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> &[RunRequest] {
        &self.requests
    }
}

impl TrainingBackend for DryRunBackend {
    fn run(&mut self, request: &RunRequest) -> Result<()> {
        info!("[dry run] {}", serde_json::to_string(request)?);
        self.requests.push(request.clone());

        Ok(())
    }
}

pub fn run_cmd(cmd: &str) -> Result<ExitStatus> {
    info!("{}", cmd);

    let mut child = Command::new("/bin/bash")
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("Failed to spawn: {}", cmd))?;

    let status = child.wait()?;

    info!("OUTPUT: {:?}", status);

    Ok(status)
}
