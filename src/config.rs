use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::encoder::Codec;
use crate::error::{PrepError, Result};

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A labeled folder of source clips, relative to the input root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSource {
    pub label: String,
    pub dir: PathBuf,
}

impl ClassSource {
    pub fn new(label: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            dir: dir.into(),
        }
    }
}

/// Everything a dataset preparation run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub classes: Vec<ClassSource>,
    pub test_fraction: f64,
    /// Seed for the train/test split; drawn at random when absent
    pub seed: Option<u64>,
    pub target_fps: f64,
    pub center_crop: Size,
    pub context_size: Size,
    pub fovea_size: Size,
    pub codec: Codec,
    pub jobs: usize,
    pub keep_intermediates: bool,
    pub write_manifest: bool,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("./dataset"),
            output_root: PathBuf::from("./dataset_processed"),
            classes: vec![
                ClassSource::new("cheating", "cheating"),
                ClassSource::new("not_cheating", "not_cheating/very-good-players"),
            ],
            test_fraction: 0.2,
            seed: None,
            target_fps: 20.0,
            center_crop: Size::new(500, 500),
            context_size: Size::new(89, 89),
            fovea_size: Size::new(89, 89),
            codec: Codec::MP4V,
            jobs: num_cpus::get().max(1),
            keep_intermediates: false,
            write_manifest: true,
        }
    }
}

impl PrepConfig {
    /// Load a JSON config; missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        let config: PrepConfig = serde_json::from_str(&text)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.test_fraction) {
            return Err(PrepError::Config(format!(
                "test_fraction must be within [0, 1], got {}",
                self.test_fraction
            )));
        }
        if !(self.target_fps.is_finite() && self.target_fps > 0.0) {
            return Err(PrepError::Config(format!(
                "target_fps must be positive, got {}",
                self.target_fps
            )));
        }
        for (name, size) in [
            ("center_crop", self.center_crop),
            ("context_size", self.context_size),
            ("fovea_size", self.fovea_size),
        ] {
            if size.width == 0 || size.height == 0 {
                return Err(PrepError::Config(format!("{} must be non-zero, got {}", name, size)));
            }
        }
        if self.jobs == 0 {
            return Err(PrepError::Config("jobs must be at least 1".to_string()));
        }
        if self.classes.is_empty() {
            return Err(PrepError::Config("at least one class is required".to_string()));
        }
        Ok(())
    }

    pub fn class_dir(&self, class: &ClassSource) -> PathBuf {
        self.input_root.join(&class.dir)
    }
}
