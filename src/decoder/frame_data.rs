use image::{GrayImage, RgbImage};

use crate::error::{PrepError, Result};

/// A single decoded video frame.
///
/// Color frames are stored in R,G,B order. Backends that decode BGR
/// (OpenCV) swap channels at the boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Color(RgbImage),
    Gray(GrayImage),
}

impl Frame {
    /// Build a frame from a tightly packed pixel buffer.
    pub fn from_raw(width: u32, height: u32, channels: u8, buffer: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * channels as usize;
        if buffer.len() != expected {
            return Err(PrepError::InvalidFrame(format!(
                "{}x{}x{} frame needs {} bytes, got {}",
                width,
                height,
                channels,
                expected,
                buffer.len()
            )));
        }

        let frame = match channels {
            3 => RgbImage::from_raw(width, height, buffer).map(Frame::Color),
            1 => GrayImage::from_raw(width, height, buffer).map(Frame::Gray),
            other => {
                return Err(PrepError::InvalidFrame(format!(
                    "unsupported channel count {}",
                    other
                )))
            }
        };
        frame.ok_or_else(|| PrepError::InvalidFrame("buffer does not fit frame".to_string()))
    }

    pub fn width(&self) -> u32 {
        match self {
            Frame::Color(img) => img.width(),
            Frame::Gray(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Frame::Color(img) => img.height(),
            Frame::Gray(img) => img.height(),
        }
    }

    pub fn channels(&self) -> u8 {
        match self {
            Frame::Color(_) => 3,
            Frame::Gray(_) => 1,
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Frame::Color(_))
    }

    /// Packed pixel bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Frame::Color(img) => img.as_raw(),
            Frame::Gray(img) => img.as_raw(),
        }
    }
}
