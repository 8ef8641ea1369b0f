pub mod ffmpeg;
pub mod frame_data;
#[cfg(feature = "opencv")]
pub mod video;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use frame_data::Frame;

/// Stream metadata reported by a clip reader
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipInfo {
    pub fps: f64,
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl ClipInfo {
    pub fn is_color(&self) -> bool {
        self.channels != 1
    }
}

/// An open clip being decoded frame by frame.
///
/// Implementations release their underlying handle when dropped, so a
/// reader abandoned halfway through a transform never leaks.
pub trait ClipReader {
    fn info(&self) -> &ClipInfo;

    /// Next frame in decode order, `None` once the stream is exhausted.
    fn read_frame(&mut self) -> Result<Option<Frame>>;
}

/// Parse an ffprobe style rate such as `30000/1001` or `25`.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let rate = rate.trim();
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Frame count the way OpenCV estimates it when the container has none.
pub fn estimate_frame_count(duration_secs: Option<f64>, fps: f64) -> u64 {
    match duration_secs {
        Some(d) if d.is_finite() && d > 0.0 => (d * fps).round() as u64,
        _ => 0,
    }
}
