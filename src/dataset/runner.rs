use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::layout::{artifact_paths, create_split_dir, list_clips, prepare_output_dir, SplitKind};
use super::manifest::write_manifest;
use super::split::{split_clips, ClipSplit};
use crate::backend::VideoBackend;
use crate::config::PrepConfig;
use crate::core::ClipTransformer;
use crate::error::{PrepError, Result};

/// One label class after listing and splitting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPlan {
    pub label: String,
    pub source_dir: PathBuf,
    pub split: ClipSplit,
}

impl ClassPlan {
    pub fn clips(&self, split: SplitKind) -> &[String] {
        match split {
            SplitKind::Test => &self.split.test,
            SplitKind::Train => &self.split.train,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPlan {
    pub seed: u64,
    pub classes: Vec<ClassPlan>,
}

/// A single clip scheduled for processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipJob {
    pub label: String,
    pub clip: String,
    pub source: PathBuf,
    pub split: SplitKind,
    pub split_dir: PathBuf,
    /// 1-based position within its class and split, for progress output
    pub position: usize,
    pub total: usize,
}

/// Frame counts through the recipe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFrames {
    pub source: u64,
    pub downsampled: u64,
    pub context: u64,
    pub fovea: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipArtifacts {
    pub label: String,
    pub clip: String,
    pub split: SplitKind,
    pub context: PathBuf,
    pub fovea: PathBuf,
    pub frames: StageFrames,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipFailure {
    pub label: String,
    pub clip: String,
    pub split: SplitKind,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub seed: u64,
    pub backend: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub plan: DatasetPlan,
    pub artifacts: Vec<ClipArtifacts>,
    pub failures: Vec<ClipFailure>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn artifacts_in(&self, split: SplitKind) -> impl Iterator<Item = &ClipArtifacts> {
        self.artifacts.iter().filter(move |a| a.split == split)
    }
}

/// List every class directory and split it with the configured seed.
///
/// Class `i` is split with `seed + i` so adding a class leaves the
/// earlier classes' splits untouched.
pub fn plan(config: &PrepConfig) -> Result<DatasetPlan> {
    config.validate()?;
    let seed = config.seed.unwrap_or_else(rand::random);

    let mut classes = Vec::with_capacity(config.classes.len());
    for (i, class) in config.classes.iter().enumerate() {
        let source_dir = config.class_dir(class);
        let clips = list_clips(&source_dir)?;
        let split = split_clips(&clips, config.test_fraction, seed.wrapping_add(i as u64));

        info!(
            label = %class.label,
            total = clips.len(),
            train = split.train.len(),
            test = split.test.len(),
            "split class"
        );

        classes.push(ClassPlan {
            label: class.label.clone(),
            source_dir,
            split,
        });
    }

    let plan = DatasetPlan { seed, classes };
    check_artifact_collisions(&plan, &config.output_root)?;
    Ok(plan)
}

/// Two clips landing in the same split must not share any artifact path.
fn check_artifact_collisions(plan: &DatasetPlan, output_root: &Path) -> Result<()> {
    for split in [SplitKind::Test, SplitKind::Train] {
        let split_dir = output_root.join(split.dir_name());
        let mut owners: HashMap<PathBuf, String> = HashMap::new();

        for class in &plan.classes {
            for clip in class.clips(split) {
                let id = format!("{}/{}", class.label, clip);
                for path in artifact_paths(&split_dir, clip).all() {
                    if let Some(first) = owners.insert(path.to_path_buf(), id.clone()) {
                        return Err(PrepError::DuplicateArtifact {
                            first,
                            second: id,
                            target: path.to_path_buf(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Run the full recipe for one clip.
///
/// Intermediates are removed afterwards unless `keep_intermediates` is set,
/// including when a stage fails; the stage error takes precedence.
pub fn process_clip(backend: &dyn VideoBackend, config: &PrepConfig, job: &ClipJob) -> Result<ClipArtifacts> {
    let paths = artifact_paths(&job.split_dir, &job.clip);
    let transformer = ClipTransformer::new(backend).with_codec(config.codec);

    let outcome = (|| -> Result<StageFrames> {
        let down = transformer.downsample(&job.source, &paths.downsampled, config.target_fps)?;
        transformer.crop(&paths.downsampled, config.center_crop, &paths.center)?;
        transformer.grayscale(&paths.center, &paths.gray)?;
        let context = transformer.resize(&paths.gray, config.context_size, &paths.context)?;
        let fovea = transformer.crop(&paths.gray, config.fovea_size, &paths.fovea)?;
        Ok(StageFrames {
            source: down.frames_read,
            downsampled: down.frames_written,
            context: context.frames_written,
            fovea: fovea.frames_written,
        })
    })();

    let cleanup = if config.keep_intermediates {
        Ok(())
    } else {
        remove_intermediates(&paths.intermediates())
    };

    let frames = outcome?;
    cleanup?;

    Ok(ClipArtifacts {
        label: job.label.clone(),
        clip: job.clip.clone(),
        split: job.split,
        context: paths.context,
        fovea: paths.fovea,
        frames,
    })
}

fn remove_intermediates(paths: &[&Path]) -> Result<()> {
    let mut first_error = None;
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), "failed to remove intermediate: {}", e);
                if first_error.is_none() {
                    first_error = Some(PrepError::io(*path, e));
                }
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}

fn jobs_for(plan: &DatasetPlan, split: SplitKind, split_dir: &Path) -> Vec<ClipJob> {
    plan.classes
        .iter()
        .flat_map(|class| {
            let clips = class.clips(split);
            clips.iter().enumerate().map(move |(i, clip)| ClipJob {
                label: class.label.clone(),
                clip: clip.clone(),
                source: class.source_dir.join(clip),
                split,
                split_dir: split_dir.to_path_buf(),
                position: i + 1,
                total: clips.len(),
            })
        })
        .collect()
}

/// `Created test dataset with 2 clips with cheating and 2 clips with not_cheating. Total: 4`
pub fn summary_line(plan: &DatasetPlan, split: SplitKind) -> String {
    let parts: Vec<String> = plan
        .classes
        .iter()
        .map(|c| format!("{} clips with {}", c.clips(split).len(), c.label))
        .collect();
    let total: usize = plan.classes.iter().map(|c| c.clips(split).len()).sum();

    let listed = match parts.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => "no clips".to_string(),
    };
    format!("Created {} dataset with {}. Total: {}", split, listed, total)
}

/// Prepare the whole dataset: plan, check the output directory, then
/// process the test split followed by the train split.
///
/// Per-clip failures are logged and collected in the report; only setup
/// errors abort the run.
pub fn run(backend: &dyn VideoBackend, config: &PrepConfig) -> Result<RunReport> {
    let started_at = Utc::now();
    let plan = plan(config)?;
    prepare_output_dir(&config.output_root)?;

    info!(seed = plan.seed, backend = backend.name(), jobs = config.jobs, "preparing dataset");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()
        .map_err(|e| PrepError::Config(format!("failed to build worker pool: {}", e)))?;

    let mut artifacts = Vec::new();
    let mut failures = Vec::new();

    for split in [SplitKind::Test, SplitKind::Train] {
        let split_dir = create_split_dir(&config.output_root, split)?;
        let jobs = jobs_for(&plan, split, &split_dir);

        let results: Vec<(ClipJob, Result<ClipArtifacts>)> = pool.install(|| {
            jobs.into_par_iter()
                .map(|job| {
                    info!("{} video: {}/{}", job.clip, job.position, job.total);
                    let result = process_clip(backend, config, &job);
                    (job, result)
                })
                .collect()
        });

        for (job, result) in results {
            match result {
                Ok(done) => artifacts.push(done),
                Err(e) => {
                    error!(label = %job.label, clip = %job.clip, split = %split, "clip failed: {}", e);
                    failures.push(ClipFailure {
                        label: job.label,
                        clip: job.clip,
                        split,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!("{}", summary_line(&plan, split));
    }

    if !failures.is_empty() {
        warn!(failed = failures.len(), "some clips could not be processed");
    }

    let report = RunReport {
        seed: plan.seed,
        backend: backend.name().to_string(),
        started_at,
        finished_at: Utc::now(),
        plan,
        artifacts,
        failures,
    };

    if config.write_manifest {
        let path = write_manifest(&config.output_root, &report)?;
        info!(path = %path.display(), "wrote manifest");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_class_plan() -> DatasetPlan {
        DatasetPlan {
            seed: 1,
            classes: vec![
                ClassPlan {
                    label: "cheating".to_string(),
                    source_dir: PathBuf::from("/in/cheating"),
                    split: ClipSplit {
                        train: vec!["a.mp4".into(), "b.mp4".into(), "c.mp4".into()],
                        test: vec!["d.mp4".into()],
                    },
                },
                ClassPlan {
                    label: "not_cheating".to_string(),
                    source_dir: PathBuf::from("/in/not_cheating"),
                    split: ClipSplit {
                        train: vec!["e.mp4".into()],
                        test: vec!["f.mp4".into(), "g.mp4".into()],
                    },
                },
            ],
        }
    }

    #[test]
    fn test_summary_line() {
        let plan = two_class_plan();
        assert_eq!(
            summary_line(&plan, SplitKind::Test),
            "Created test dataset with 1 clips with cheating and 2 clips with not_cheating. Total: 3"
        );
        assert_eq!(
            summary_line(&plan, SplitKind::Train),
            "Created train dataset with 3 clips with cheating and 1 clips with not_cheating. Total: 4"
        );
    }

    #[test]
    fn test_jobs_for_numbers_per_class() {
        let plan = two_class_plan();
        let jobs = jobs_for(&plan, SplitKind::Train, Path::new("/out/train"));
        assert_eq!(jobs.len(), 4);
        assert_eq!(jobs[2].clip, "c.mp4");
        assert_eq!((jobs[2].position, jobs[2].total), (3, 3));
        assert_eq!(jobs[3].source, PathBuf::from("/in/not_cheating/e.mp4"));
        assert_eq!((jobs[3].position, jobs[3].total), (1, 1));
    }

    #[test]
    fn test_collision_across_classes_is_rejected() {
        let mut plan = two_class_plan();
        plan.classes[1].split.test.push("d.mp4".into());
        let err = check_artifact_collisions(&plan, Path::new("/out")).unwrap_err();
        assert!(matches!(err, PrepError::DuplicateArtifact { .. }));

        // same name in different splits is fine
        let mut plan = two_class_plan();
        plan.classes[1].split.train.push("d.mp4".into());
        assert!(check_artifact_collisions(&plan, Path::new("/out")).is_ok());
    }
}
