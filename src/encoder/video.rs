use opencv::{core, imgproc, prelude::*, videoio};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{ClipWriter, WriterSpec};
use crate::decoder::Frame;
use crate::error::{PrepError, Result};

/// Encodes a clip through OpenCV's `VideoWriter`.
pub struct VideoEncoder {
    path: PathBuf,
    spec: WriterSpec,
    writer: videoio::VideoWriter,
    released: bool,
    frames_written: u64,
}

impl VideoEncoder {
    pub fn new(path: &Path, spec: &WriterSpec) -> Result<Self> {
        let [a, b, c, d] = spec.codec.chars();
        let fourcc = videoio::VideoWriter::fourcc(a, b, c, d)?;
        let size = core::Size::new(spec.size.width as i32, spec.size.height as i32);

        let writer =
            videoio::VideoWriter::new(&path.to_string_lossy(), fourcc, spec.fps, size, spec.color)?;
        if !writer.is_opened()? {
            return Err(PrepError::encode(path, "VideoWriter could not open file"));
        }
        debug!(clip = %path.display(), codec = %spec.codec, fps = spec.fps, "OpenCV VideoWriter opened");

        Ok(Self {
            path: path.to_path_buf(),
            spec: *spec,
            writer,
            released: false,
            frames_written: 0,
        })
    }
}

impl ClipWriter for VideoEncoder {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.spec.check_frame(&self.path, frame)?;

        let typ = if frame.is_color() {
            core::CV_8UC3
        } else {
            core::CV_8UC1
        };
        let mut mat = Mat::new_rows_cols_with_default(
            frame.height() as i32,
            frame.width() as i32,
            typ,
            core::Scalar::all(0.0),
        )?;
        mat.data_bytes_mut()?.copy_from_slice(frame.as_bytes());

        if frame.is_color() {
            let mut bgr = Mat::default();
            imgproc::cvt_color(
                &mat,
                &mut bgr,
                imgproc::COLOR_RGB2BGR,
                0,
                core::AlgorithmHint::ALGO_HINT_DEFAULT,
            )?;
            self.writer.write(&bgr)?;
        } else {
            self.writer.write(&mat)?;
        }

        self.frames_written += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<u64> {
        self.released = true;
        self.writer.release()?;
        Ok(self.frames_written)
    }
}

impl Drop for VideoEncoder {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.writer.release() {
                debug!(clip = %self.path.display(), "VideoWriter release failed: {}", e);
            }
        }
    }
}
