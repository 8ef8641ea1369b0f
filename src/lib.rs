//! Labeled video dataset preparation.
//!
//! Each source clip goes through a fixed recipe of frame transforms
//! (temporal downsampling, center crop, grayscale, area resize) and the
//! resulting "context" and "fovea" clips are written into a train/test
//! split layout.

pub mod backend;
pub mod config;
pub mod core;
pub mod dataset;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod logging;

pub use backend::{BackendKind, VideoBackend};
pub use config::{ClassSource, PrepConfig, Size};
pub use error::{PrepError, Result};
