use opencv::{core, imgproc, prelude::*, videoio};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{ClipInfo, ClipReader, Frame};
use crate::error::{PrepError, Result};

/// Decodes a clip through OpenCV's `VideoCapture`.
pub struct VideoDecoder {
    path: PathBuf,
    capture: videoio::VideoCapture,
    info: ClipInfo,
}

impl VideoDecoder {
    pub fn new(path: &Path) -> Result<Self> {
        let path_str = path.to_string_lossy();

        // CAP_ANY allows OpenCV to choose the best backend
        let capture = videoio::VideoCapture::from_file(&path_str, videoio::CAP_ANY)?;

        if !capture.is_opened()? {
            return Err(PrepError::open(path, "VideoCapture could not open file"));
        }

        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as u64;
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;

        let info = ClipInfo {
            fps,
            frame_count,
            width,
            height,
            channels: 3,
        };
        debug!(clip = %path.display(), ?info, "OpenCV VideoCapture opened");

        Ok(Self {
            path: path.to_path_buf(),
            capture,
            info,
        })
    }
}

impl ClipReader for VideoDecoder {
    fn info(&self) -> &ClipInfo {
        &self.info
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None); // EOF
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color(
            &frame,
            &mut rgb,
            imgproc::COLOR_BGR2RGB,
            0,
            core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )?;

        if !rgb.is_continuous() {
            return Err(PrepError::decode(&self.path, "frame data is not continuous"));
        }

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let data = rgb.data_bytes()?.to_vec();
        Frame::from_raw(width, height, 3, data).map(Some)
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            debug!(clip = %self.path.display(), "VideoCapture release failed: {}", e);
        }
    }
}
