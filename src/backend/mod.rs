pub mod raw;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::decoder::{ClipInfo, ClipReader};
use crate::encoder::{ClipWriter, WriterSpec};
use crate::error::{PrepError, Result};

pub use raw::RawBackend;

/// Opens clip readers and writers for one container/codec implementation.
///
/// Shared by every worker of a batch run, hence `Send + Sync`; readers and
/// writers themselves stay on the thread that opened them.
pub trait VideoBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn open_reader(&self, path: &Path) -> Result<Box<dyn ClipReader>>;

    fn open_writer(&self, path: &Path, spec: &WriterSpec) -> Result<Box<dyn ClipWriter>>;

    fn probe(&self, path: &Path) -> Result<ClipInfo> {
        let reader = self.open_reader(path)?;
        Ok(*reader.info())
    }
}

/// ffprobe + ffmpeg child processes over rawvideo pipes
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegBackend;

impl VideoBackend for FfmpegBackend {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn open_reader(&self, path: &Path) -> Result<Box<dyn ClipReader>> {
        Ok(Box::new(crate::decoder::ffmpeg::FfmpegReader::open(path)?))
    }

    fn open_writer(&self, path: &Path, spec: &WriterSpec) -> Result<Box<dyn ClipWriter>> {
        Ok(Box::new(crate::encoder::ffmpeg::FfmpegWriter::open(path, spec)?))
    }

    fn probe(&self, path: &Path) -> Result<ClipInfo> {
        crate::decoder::ffmpeg::probe_clip(path)
    }
}

/// OpenCV `VideoCapture` / `VideoWriter`
#[cfg(feature = "opencv")]
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvBackend;

#[cfg(feature = "opencv")]
impl VideoBackend for OpenCvBackend {
    fn name(&self) -> &'static str {
        "opencv"
    }

    fn open_reader(&self, path: &Path) -> Result<Box<dyn ClipReader>> {
        Ok(Box::new(crate::decoder::video::VideoDecoder::new(path)?))
    }

    fn open_writer(&self, path: &Path, spec: &WriterSpec) -> Result<Box<dyn ClipWriter>> {
        Ok(Box::new(crate::encoder::video::VideoEncoder::new(path, spec)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Ffmpeg,
    Opencv,
    Raw,
}

impl BackendKind {
    pub fn create(self) -> Result<Box<dyn VideoBackend>> {
        match self {
            BackendKind::Ffmpeg => Ok(Box::new(FfmpegBackend)),
            BackendKind::Raw => Ok(Box::new(RawBackend)),
            #[cfg(feature = "opencv")]
            BackendKind::Opencv => Ok(Box::new(OpenCvBackend)),
            #[cfg(not(feature = "opencv"))]
            BackendKind::Opencv => Err(PrepError::Config(
                "this build does not include the opencv backend, rebuild with --features opencv"
                    .to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_create() {
        assert_eq!(BackendKind::Raw.create().unwrap().name(), "raw");
        assert_eq!(BackendKind::Ffmpeg.create().unwrap().name(), "ffmpeg");
        #[cfg(not(feature = "opencv"))]
        assert!(BackendKind::Opencv.create().is_err());
    }
}
