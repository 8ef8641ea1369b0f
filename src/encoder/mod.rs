pub mod ffmpeg;
#[cfg(feature = "opencv")]
pub mod video;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::config::Size;
use crate::decoder::Frame;
use crate::error::{PrepError, Result};

/// Four character codec tag written into every output container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Codec(pub [u8; 4]);

impl Codec {
    /// MPEG-4 Part 2, the tag used for all dataset artifacts.
    pub const MP4V: Codec = Codec(*b"mp4v");

    pub fn chars(&self) -> [char; 4] {
        self.0.map(char::from)
    }
}

impl TryFrom<String> for Codec {
    type Error = String;

    fn try_from(tag: String) -> std::result::Result<Self, Self::Error> {
        let bytes: [u8; 4] = tag
            .as_bytes()
            .try_into()
            .map_err(|_| format!("codec tag must be 4 ASCII characters, got {:?}", tag))?;
        if !bytes.iter().all(u8::is_ascii_graphic) {
            return Err(format!("codec tag must be printable ASCII, got {:?}", tag));
        }
        Ok(Codec(bytes))
    }
}

impl From<Codec> for String {
    fn from(codec: Codec) -> Self {
        codec.to_string()
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Geometry and format an output clip is declared with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriterSpec {
    pub codec: Codec,
    pub fps: f64,
    pub size: Size,
    pub color: bool,
}

impl WriterSpec {
    pub fn channels(&self) -> u8 {
        if self.color {
            3
        } else {
            1
        }
    }

    /// Reject frames whose geometry differs from the declared output.
    pub fn check_frame(&self, path: &Path, frame: &Frame) -> Result<()> {
        if frame.width() != self.size.width
            || frame.height() != self.size.height
            || frame.channels() != self.channels()
        {
            return Err(PrepError::encode(
                path,
                format!(
                    "frame {}x{}x{} does not match writer {}x{}x{}",
                    frame.width(),
                    frame.height(),
                    frame.channels(),
                    self.size.width,
                    self.size.height,
                    self.channels()
                ),
            ));
        }
        Ok(())
    }
}

/// An output clip receiving frames in order.
///
/// `finish` flushes and closes the container and reports close-time
/// failures. A writer dropped without `finish` still releases its handle,
/// leaving a truncated file behind.
pub trait ClipWriter {
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Close the output and return the number of frames written.
    fn finish(self: Box<Self>) -> Result<u64>;
}
