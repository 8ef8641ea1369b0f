use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

use super::{center_crop, center_crop_region, drops_all_frames, resize_area, should_keep_frame, to_grayscale};
use crate::backend::VideoBackend;
use crate::config::Size;
use crate::decoder::{ClipInfo, Frame};
use crate::encoder::{Codec, WriterSpec};
use crate::error::{PrepError, Result};

/// Frame counters for one clip-level transform
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub frames_read: u64,
    pub frames_written: u64,
}

/// Runs whole-clip transforms: one reader and one writer per call, both
/// released before returning on every path.
pub struct ClipTransformer<'a> {
    backend: &'a dyn VideoBackend,
    codec: Codec,
}

impl<'a> ClipTransformer<'a> {
    pub fn new(backend: &'a dyn VideoBackend) -> Self {
        Self {
            backend,
            codec: Codec::MP4V,
        }
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Drop frames according to [`should_keep_frame`] and write the
    /// survivors at `target_fps`.
    pub fn downsample(&self, src: &Path, dst: &Path, target_fps: f64) -> Result<TransformStats> {
        if !(target_fps.is_finite() && target_fps > 0.0) {
            return Err(PrepError::Config(format!("target fps must be positive, got {}", target_fps)));
        }
        let codec = self.codec;
        self.run(
            src,
            dst,
            |info| {
                if drops_all_frames(info.frame_count, info.fps) {
                    warn!(
                        clip = %src.display(),
                        fps = info.fps,
                        "source rate is 61 fps or more, downsampled clip will be empty"
                    );
                }
                Ok(WriterSpec {
                    codec,
                    fps: target_fps,
                    size: Size::new(info.width, info.height),
                    color: info.is_color(),
                })
            },
            |info, index, frame| Ok(should_keep_frame(index, info.frame_count, info.fps).then_some(frame)),
        )
    }

    /// Convert every frame to single-channel luma.
    pub fn grayscale(&self, src: &Path, dst: &Path) -> Result<TransformStats> {
        let codec = self.codec;
        self.run(
            src,
            dst,
            |info| {
                Ok(WriterSpec {
                    codec,
                    fps: info.fps,
                    size: Size::new(info.width, info.height),
                    color: false,
                })
            },
            |_, _, frame| Ok(Some(to_grayscale(&frame))),
        )
    }

    /// Centered crop to `target`, clamped to the source frame size.
    ///
    /// The writer is declared with the clamped region computed from the
    /// source metadata, so an oversized target yields a smaller clip rather
    /// than a clip whose container geometry disagrees with its frames.
    pub fn crop(&self, src: &Path, target: Size, dst: &Path) -> Result<TransformStats> {
        let codec = self.codec;
        self.run(
            src,
            dst,
            |info| {
                let region = center_crop_region(info.width, info.height, target);
                if region.is_empty() {
                    return Err(PrepError::InvalidFrame(format!(
                        "centered crop of {} from {}x{} is empty",
                        target, info.width, info.height
                    )));
                }
                Ok(WriterSpec {
                    codec,
                    fps: info.fps,
                    size: region.size(),
                    color: info.is_color(),
                })
            },
            |_, _, frame| Ok(Some(center_crop(&frame, target))),
        )
    }

    /// Area-interpolated resize of every frame to exactly `target`.
    pub fn resize(&self, src: &Path, target: Size, dst: &Path) -> Result<TransformStats> {
        let codec = self.codec;
        self.run(
            src,
            dst,
            |info| {
                if target.width == 0 || target.height == 0 {
                    return Err(PrepError::InvalidFrame(format!("cannot resize to {}", target)));
                }
                Ok(WriterSpec {
                    codec,
                    fps: info.fps,
                    size: target,
                    color: info.is_color(),
                })
            },
            |_, _, frame| resize_area(&frame, target).map(Some),
        )
    }

    fn run<S, F>(&self, src: &Path, dst: &Path, writer_spec: S, mut per_frame: F) -> Result<TransformStats>
    where
        S: FnOnce(&ClipInfo) -> Result<WriterSpec>,
        F: FnMut(&ClipInfo, u64, Frame) -> Result<Option<Frame>>,
    {
        let mut reader = self.backend.open_reader(src)?;
        let info = *reader.info();
        let spec = writer_spec(&info)?;
        let mut writer = self.backend.open_writer(dst, &spec)?;

        let mut stats = TransformStats::default();
        loop {
            let frame = match reader.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    // A failed read ends the clip the same way end-of-stream does
                    warn!(clip = %src.display(), frame = stats.frames_read, "stopping decode: {}", e);
                    break;
                }
            };

            let index = stats.frames_read;
            stats.frames_read += 1;
            if let Some(out) = per_frame(&info, index, frame)? {
                writer.write_frame(&out)?;
                stats.frames_written += 1;
            }
        }

        drop(reader);
        writer.finish()?;

        debug!(
            src = %src.display(),
            dst = %dst.display(),
            read = stats.frames_read,
            written = stats.frames_written,
            "transform complete"
        );
        Ok(stats)
    }
}
