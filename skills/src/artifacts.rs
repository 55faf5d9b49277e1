use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use common::base_filename;
use environment::{Environment, Frame};
use itertools::Itertools;
use log::{error, info};
use policy::{DeterministicScope, Policy};

use super::{rollout_skill, write_trace, RolloutOptions, SkillEvaluation, SkillRanking, VideoWriter};

/// Output locations derived from a snapshot path.
///
/// For `runs/itr_100.json.gz` with data dir `data` and extension `rgbv`:
/// `runs/itr_100.rgbv`, `runs/itr_100_skill_03.rgbv`, `runs/itr_100_best.rgbv`,
/// `runs/itr_100_worst.rgbv` and `data/itr_100/path03.csv`.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactNames {
    base: PathBuf,
    trace_dir: PathBuf,
    extension: String,
}

impl ArtifactNames {
    pub fn new(snapshot_path: &Path, data_dir: &Path, extension: &str) -> Self {
        let base = base_filename(snapshot_path);
        let trace_dir = match base.file_name() {
            Some(stem) => data_dir.join(stem),
            None => data_dir.to_path_buf(),
        };

        Self {
            base,
            trace_dir,
            extension: extension.to_string(),
        }
    }

    pub fn trace_dir(&self) -> &Path {
        &self.trace_dir
    }

    pub fn consolidated_video(&self) -> PathBuf {
        self.with_suffix("")
    }

    pub fn skill_video(&self, skill: usize) -> PathBuf {
        self.with_suffix(&format!("_skill_{:02}", skill))
    }

    pub fn best_video(&self) -> PathBuf {
        self.with_suffix("_best")
    }

    pub fn worst_video(&self) -> PathBuf {
        self.with_suffix("_worst")
    }

    pub fn trace(&self, skill: usize) -> PathBuf {
        self.trace_dir.join(format!("path{:02}.csv", skill))
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut name = self.base.clone().into_os_string();
        name.push(suffix);
        name.push(".");
        name.push(&self.extension);
        PathBuf::from(name)
    }
}

/// Outcome of writing per-skill artifacts. Skills listed in `failed` have incomplete artifacts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkillArtifacts {
    pub written: Vec<PathBuf>,
    pub failed: Vec<usize>,
}

impl SkillArtifacts {
    /// Fails with the list of skills whose artifacts could not be written.
    pub fn ensure_complete(&self) -> Result<()> {
        if !self.failed.is_empty() {
            bail!(
                "Failed to write artifacts for skills [{}]",
                self.failed.iter().join(", ")
            );
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtremalReturns {
    pub best: f64,
    pub worst: f64,
}

/// Persists per-skill traces and videos and records the extremal skills.
pub struct ArtifactAggregator<'a, W: VideoWriter + ?Sized> {
    names: &'a ArtifactNames,
    writer: &'a mut W,
    separate_videos: bool,
}

impl<'a, W: VideoWriter + ?Sized> ArtifactAggregator<'a, W> {
    pub fn new(names: &'a ArtifactNames, writer: &'a mut W, separate_videos: bool) -> Self {
        Self {
            names,
            writer,
            separate_videos,
        }
    }

    /// Writes a trace and a video per skill, or a single video of all skills back to back.
    ///
    /// A failed skill does not stop the remaining skills from being written. Failed skills are
    /// returned in [`SkillArtifacts::failed`] for the caller to report once the run is complete.
    pub fn write_skill_artifacts(&mut self, evaluation: &SkillEvaluation) -> Result<SkillArtifacts> {
        if !self.separate_videos {
            let path = self.names.consolidated_video();
            let frames = evaluation
                .rollouts
                .iter()
                .flat_map(|r| r.trajectory.frames.iter())
                .collect::<Vec<_>>();

            self.writer.write(&path, &frames)?;
            info!("Wrote {} frames to {:?}", frames.len(), path);

            return Ok(SkillArtifacts {
                written: vec![path],
                failed: vec![],
            });
        }

        fs::create_dir_all(self.names.trace_dir()).with_context(|| {
            format!("Failed to create trace dir {:?}", self.names.trace_dir())
        })?;

        let mut written = Vec::with_capacity(evaluation.num_skills() * 2);
        let mut failed = Vec::new();

        for rollout in &evaluation.rollouts {
            let skill = rollout.skill;
            let trace = self.names.trace(skill);
            let video = self.names.skill_video(skill);

            let result = write_trace(&trace, &rollout.trajectory.observations).and_then(|_| {
                let frames = rollout.trajectory.frames.iter().collect::<Vec<_>>();
                self.writer.write(&video, &frames)
            });

            match result {
                Ok(()) => {
                    info!("Wrote skill {:02} to {:?} and {:?}", skill, trace, video);
                    written.push(trace);
                    written.push(video);
                }
                Err(err) => {
                    error!("Failed to write artifacts for skill {:02}: {:?}", skill, err);
                    failed.push(skill);
                }
            }
        }

        Ok(SkillArtifacts { written, failed })
    }

    /// Re-runs the best and worst skills over `options.max_path_length` and writes a video of each.
    pub fn record_extremal<E, P>(
        &mut self,
        env: &mut E,
        policy: &mut P,
        ranking: &SkillRanking,
        deterministic: bool,
        options: &RolloutOptions,
    ) -> Result<ExtremalReturns>
    where
        E: Environment + ?Sized,
        P: Policy + ?Sized,
    {
        let num_skills = ranking.num_skills();
        let mut scope = DeterministicScope::enter(policy, deterministic);

        let best = rollout_skill(env, &mut *scope, num_skills, ranking.best(), options)?;
        self.write_video(&self.names.best_video(), &best.frames)?;
        info!(
            "Best skill {:02} over {} steps: return {:.3}",
            ranking.best(),
            best.len(),
            best.total_return()
        );

        let worst = rollout_skill(env, &mut *scope, num_skills, ranking.worst(), options)?;
        self.write_video(&self.names.worst_video(), &worst.frames)?;
        info!(
            "Worst skill {:02} over {} steps: return {:.3}",
            ranking.worst(),
            worst.len(),
            worst.total_return()
        );

        Ok(ExtremalReturns {
            best: best.total_return(),
            worst: worst.total_return(),
        })
    }

    fn write_video(&mut self, path: &Path, frames: &[Frame]) -> Result<()> {
        let frames = frames.iter().collect::<Vec<_>>();
        self.writer.write(path, &frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_strip_compression_and_extension() {
        let names = ArtifactNames::new(
            Path::new("runs/itr_100.json.gz"),
            Path::new("data"),
            "rgbv",
        );

        assert_eq!(names.consolidated_video(), PathBuf::from("runs/itr_100.rgbv"));
        assert_eq!(names.skill_video(3), PathBuf::from("runs/itr_100_skill_03.rgbv"));
        assert_eq!(names.best_video(), PathBuf::from("runs/itr_100_best.rgbv"));
        assert_eq!(names.worst_video(), PathBuf::from("runs/itr_100_worst.rgbv"));
        assert_eq!(names.trace(3), PathBuf::from("data/itr_100/path03.csv"));
    }

    #[test]
    fn test_incomplete_artifacts_list_failed_skills() {
        let artifacts = SkillArtifacts {
            written: vec![],
            failed: vec![1, 3],
        };

        let err = artifacts.ensure_complete().unwrap_err();

        assert_eq!(err.to_string(), "Failed to write artifacts for skills [1, 3]");
        assert!(SkillArtifacts::default().ensure_complete().is_ok());
    }

    #[test]
    fn test_names_keep_two_digit_minimum() {
        let names = ArtifactNames::new(Path::new("params.json"), Path::new("./data"), "rgbv");

        assert_eq!(names.skill_video(12), PathBuf::from("params_skill_12.rgbv"));
        assert_eq!(names.trace(0), PathBuf::from("./data/params/path00.csv"));
    }
}
