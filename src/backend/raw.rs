//! Lossless clip container.
//!
//! Layout (little endian):
//! `[magic "RAWC"][version u8][channels u8][width u32][height u32][fps f64][frame_count u64]`
//! followed by `frame_count` tightly packed frames of `width * height * channels` bytes.
//! The frame count is patched in when the writer finishes; a file whose writer
//! never finished reports 0 but its frames can still be read up to EOF.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::VideoBackend;
use crate::decoder::{ClipInfo, ClipReader, Frame};
use crate::encoder::{ClipWriter, WriterSpec};
use crate::error::{PrepError, Result};

const MAGIC: &[u8; 4] = b"RAWC";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 30;
const FRAME_COUNT_OFFSET: u64 = 22;

#[derive(Debug, Default, Clone, Copy)]
pub struct RawBackend;

impl VideoBackend for RawBackend {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn open_reader(&self, path: &Path) -> Result<Box<dyn ClipReader>> {
        Ok(Box::new(RawReader::open(path)?))
    }

    fn open_writer(&self, path: &Path, spec: &WriterSpec) -> Result<Box<dyn ClipWriter>> {
        Ok(Box::new(RawWriter::create(path, spec)?))
    }
}

fn encode_header(info: &ClipInfo) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(MAGIC);
    header[4] = VERSION;
    header[5] = info.channels;
    header[6..10].copy_from_slice(&info.width.to_le_bytes());
    header[10..14].copy_from_slice(&info.height.to_le_bytes());
    header[14..22].copy_from_slice(&info.fps.to_le_bytes());
    header[22..30].copy_from_slice(&info.frame_count.to_le_bytes());
    header
}

fn decode_header(path: &Path, header: &[u8; HEADER_LEN]) -> Result<ClipInfo> {
    if &header[0..4] != MAGIC {
        return Err(PrepError::open(path, "not a raw clip container"));
    }
    if header[4] != VERSION {
        return Err(PrepError::open(path, format!("unsupported raw clip version {}", header[4])));
    }

    let channels = header[5];
    if channels != 1 && channels != 3 {
        return Err(PrepError::open(path, format!("unsupported channel count {}", channels)));
    }

    let le_u32 = |at: usize| u32::from_le_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]]);
    let mut fps = [0u8; 8];
    fps.copy_from_slice(&header[14..22]);
    let mut frame_count = [0u8; 8];
    frame_count.copy_from_slice(&header[22..30]);

    Ok(ClipInfo {
        fps: f64::from_le_bytes(fps),
        frame_count: u64::from_le_bytes(frame_count),
        width: le_u32(6),
        height: le_u32(10),
        channels,
    })
}

/// Reads frames back out of a raw clip container.
pub struct RawReader {
    path: PathBuf,
    reader: BufReader<File>,
    info: ClipInfo,
    frame_size: usize,
}

impl RawReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| PrepError::open(path, e))?;
        let mut reader = BufReader::new(file);

        let mut header = [0u8; HEADER_LEN];
        reader
            .read_exact(&mut header)
            .map_err(|e| PrepError::open(path, e))?;
        let info = decode_header(path, &header)?;
        let frame_size = info.width as usize * info.height as usize * info.channels as usize;

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            info,
            frame_size,
        })
    }
}

impl ClipReader for RawReader {
    fn info(&self) -> &ClipInfo {
        &self.info
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut buffer = vec![0u8; self.frame_size];
        let mut filled = 0;
        while filled < buffer.len() {
            match self.reader.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(PrepError::decode(&self.path, e)),
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < buffer.len() {
            return Err(PrepError::decode(
                &self.path,
                format!("truncated frame ({} of {} bytes)", filled, buffer.len()),
            ));
        }

        Frame::from_raw(self.info.width, self.info.height, self.info.channels, buffer).map(Some)
    }
}

/// Writes a raw clip container.
pub struct RawWriter {
    path: PathBuf,
    spec: WriterSpec,
    writer: BufWriter<File>,
    frames_written: u64,
}

impl RawWriter {
    pub fn create(path: &Path, spec: &WriterSpec) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| PrepError::encode(path, e))?;
        let mut writer = BufWriter::new(file);

        let info = ClipInfo {
            fps: spec.fps,
            frame_count: 0,
            width: spec.size.width,
            height: spec.size.height,
            channels: spec.channels(),
        };
        writer
            .write_all(&encode_header(&info))
            .map_err(|e| PrepError::encode(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            spec: *spec,
            writer,
            frames_written: 0,
        })
    }
}

impl ClipWriter for RawWriter {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.spec.check_frame(&self.path, frame)?;
        self.writer
            .write_all(frame.as_bytes())
            .map_err(|e| PrepError::encode(&self.path, e))?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<u64> {
        let path = self.path.clone();
        let frames = self.frames_written;

        self.writer.flush().map_err(|e| PrepError::encode(&path, e))?;
        let file = self.writer.get_mut();
        file.seek(SeekFrom::Start(FRAME_COUNT_OFFSET))
            .and_then(|_| file.write_all(&frames.to_le_bytes()))
            .and_then(|_| file.sync_all())
            .map_err(|e| PrepError::encode(&path, e))?;

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Size;
    use crate::encoder::Codec;
    use image::{GrayImage, Luma};
    use tempfile::tempdir;

    fn gray_spec(width: u32, height: u32) -> WriterSpec {
        WriterSpec {
            codec: Codec::MP4V,
            fps: 25.0,
            size: Size::new(width, height),
            color: false,
        }
    }

    #[test]
    fn test_header_layout() {
        let info = ClipInfo {
            fps: 29.97,
            frame_count: 42,
            width: 640,
            height: 360,
            channels: 3,
        };
        let header = encode_header(&info);
        assert_eq!(&header[0..4], b"RAWC");
        assert_eq!(decode_header(Path::new("x"), &header).unwrap(), info);
    }

    #[test]
    fn test_finish_patches_frame_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.raw");

        let mut writer: Box<dyn ClipWriter> = Box::new(RawWriter::create(&path, &gray_spec(3, 2)).unwrap());
        for v in [10u8, 20, 30] {
            writer.write_frame(&Frame::Gray(GrayImage::from_pixel(3, 2, Luma([v])))).unwrap();
        }
        assert_eq!(writer.finish().unwrap(), 3);

        let mut reader = RawReader::open(&path).unwrap();
        assert_eq!(reader.info().frame_count, 3);
        assert_eq!(reader.info().channels, 1);
        let mut seen = Vec::new();
        while let Some(frame) = reader.read_frame().unwrap() {
            seen.push(frame.as_bytes()[0]);
        }
        assert_eq!(seen, vec![10, 20, 30]);
    }

    #[test]
    fn test_unfinished_writer_leaves_readable_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aborted.raw");
        {
            let mut writer = RawWriter::create(&path, &gray_spec(2, 2)).unwrap();
            writer.write_frame(&Frame::Gray(GrayImage::new(2, 2))).unwrap();
        }

        let mut reader = RawReader::open(&path).unwrap();
        assert_eq!(reader.info().frame_count, 0);
        assert!(reader.read_frame().unwrap().is_some());
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_truncated_frame_is_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.raw");
        let info = ClipInfo {
            fps: 25.0,
            frame_count: 1,
            width: 4,
            height: 4,
            channels: 1,
        };
        let mut bytes = encode_header(&info).to_vec();
        bytes.extend_from_slice(&[0u8; 5]);
        std::fs::write(&path, bytes).unwrap();

        let mut reader = RawReader::open(&path).unwrap();
        assert!(matches!(reader.read_frame(), Err(PrepError::Decode { .. })));
    }

    #[test]
    fn test_rejects_foreign_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, vec![0u8; 64]).unwrap();
        assert!(matches!(RawReader::open(&path), Err(PrepError::Open { .. })));
    }
}
