use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use environment::{Environment, EnvironmentSpec};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::info;
use serde::{Deserialize, Serialize};

use super::{LinearGaussianPolicy, Policy};

/// A trained policy bundled with the environment it was trained against.
///
/// Stored as JSON, gzip-compressed when the file name ends in `.gz`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub policy: LinearGaussianPolicy,
    pub environment: EnvironmentSpec,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open snapshot at {:?}", path))?;

        let reader: Box<dyn Read> = if is_compressed(path) {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(BufReader::new(file))
        };

        let snapshot: Snapshot = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse snapshot at {:?}", path))?;

        info!(
            "Loaded snapshot {:?}: policy observation dim {}, action dim {}",
            path,
            snapshot.policy.observation_dim(),
            snapshot.policy.action_dim()
        );

        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create snapshot at {:?}", path))?;

        if is_compressed(path) {
            let mut compressor = GzEncoder::new(file, Compression::default());
            serde_json::to_writer(&mut compressor, self)?;
            compressor.finish()?;
        } else {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
        }

        Ok(())
    }

    /// Builds the environment and hands out the policy, consuming the snapshot.
    pub fn into_parts(self) -> Result<(LinearGaussianPolicy, Box<dyn Environment>)> {
        let env = self
            .environment
            .build()
            .with_context(|| "Failed to build snapshot environment")?;

        Ok((self.policy, env))
    }
}

fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}
