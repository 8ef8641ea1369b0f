#![allow(dead_code, unused_imports)]

use std::path::Path;

use clip_prep::backend::{RawBackend, VideoBackend};
use clip_prep::decoder::{ClipInfo, ClipReader, Frame};
use clip_prep::encoder::{ClipWriter, Codec, WriterSpec};
use clip_prep::Size;
use image::{Rgb, RgbImage};

/// Color frame whose blue channel encodes the frame index.
pub fn marked_frame(width: u32, height: u32, index: u32) -> Frame {
    Frame::Color(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, ((y * 3) % 256) as u8, (index * 7 % 256) as u8])
    }))
}

pub fn frame_marker(frame: &Frame) -> u8 {
    frame.as_bytes()[2]
}

pub fn write_clip(path: &Path, fps: f64, frames: &[Frame]) {
    let first = frames.first().expect("clip needs at least one frame");
    let spec = WriterSpec {
        codec: Codec::MP4V,
        fps,
        size: Size::new(first.width(), first.height()),
        color: first.is_color(),
    };
    let mut writer = RawBackend.open_writer(path, &spec).expect("open raw writer");
    for frame in frames {
        writer.write_frame(frame).expect("write frame");
    }
    writer.finish().expect("finish raw writer");
}

pub fn write_marked_clip(path: &Path, fps: f64, width: u32, height: u32, count: u32) {
    let frames: Vec<Frame> = (0..count).map(|i| marked_frame(width, height, i)).collect();
    write_clip(path, fps, &frames);
}

pub fn read_clip(path: &Path) -> (ClipInfo, Vec<Frame>) {
    let mut reader = RawBackend.open_reader(path).expect("open raw reader");
    let info = *reader.info();
    let mut frames = Vec::new();
    while let Some(frame) = reader.read_frame().expect("read frame") {
        frames.push(frame);
    }
    (info, frames)
}
