use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while transforming clips or preparing a dataset
#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Output directory {0} is not empty, provide a clean output directory")]
    OutputNotEmpty(PathBuf),

    #[error("Clips {first} and {second} would both write artifacts to {target}")]
    DuplicateArtifact {
        first: String,
        second: String,
        target: PathBuf,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to open clip {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

impl PrepError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PrepError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PrepError::Open {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PrepError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn encode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PrepError::Encode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for clip_prep operations
pub type Result<T> = std::result::Result<T, PrepError>;
