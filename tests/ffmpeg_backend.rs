use std::path::Path;
use std::process::{Command, Stdio};

use clip_prep::backend::{FfmpegBackend, VideoBackend};
use clip_prep::core::ClipTransformer;
use clip_prep::decoder::{ClipReader, Frame};
use clip_prep::encoder::{ClipWriter, Codec, WriterSpec};
use clip_prep::Size;
use image::{Rgb, RgbImage};
use tempfile::TempDir;

fn tools_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        Command::new(tool)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

fn write_source(path: &Path, fps: f64, width: u32, height: u32, count: u32) {
    let spec = WriterSpec {
        codec: Codec::MP4V,
        fps,
        size: Size::new(width, height),
        color: true,
    };
    let mut writer = FfmpegBackend.open_writer(path, &spec).unwrap();
    for i in 0..count {
        let frame = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 4 % 256) as u8, (y * 4 % 256) as u8, (i * 8 % 256) as u8])
        });
        writer.write_frame(&Frame::Color(frame)).unwrap();
    }
    assert_eq!(writer.finish().unwrap(), count as u64);
}

fn count_frames(path: &Path) -> u64 {
    let mut reader = FfmpegBackend.open_reader(path).unwrap();
    let mut frames = 0;
    while let Some(frame) = reader.read_frame().unwrap() {
        assert_eq!(frame.channels(), 3);
        frames += 1;
    }
    frames
}

#[test]
fn test_recipe_round_trip_through_ffmpeg() {
    if !tools_available() {
        eprintln!("ffmpeg/ffprobe not on PATH, skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("clip.mp4");
    write_source(&src, 30.0, 64, 48, 31);

    let info = FfmpegBackend.probe(&src).unwrap();
    assert_eq!((info.width, info.height), (64, 48));
    assert!((info.fps - 30.0).abs() < 0.01);
    assert_eq!(info.frame_count, 31);

    let transformer = ClipTransformer::new(&FfmpegBackend);
    let down = dir.path().join("down.mp4");
    let stats = transformer.downsample(&src, &down, 20.0).unwrap();
    assert_eq!((stats.frames_read, stats.frames_written), (31, 10));

    let center = dir.path().join("down-center.mp4");
    transformer.crop(&down, Size::new(32, 32), &center).unwrap();
    let gray = dir.path().join("down-gray.mp4");
    transformer.grayscale(&center, &gray).unwrap();
    let context = dir.path().join("down-context.mp4");
    transformer.resize(&gray, Size::new(89, 89), &context).unwrap();

    let center_info = FfmpegBackend.probe(&center).unwrap();
    assert_eq!((center_info.width, center_info.height), (32, 32));
    let context_info = FfmpegBackend.probe(&context).unwrap();
    assert_eq!((context_info.width, context_info.height), (89, 89));
    assert!((context_info.fps - 20.0).abs() < 0.01);
    assert_eq!(count_frames(&context), 10);
}

#[test]
fn test_high_rate_source_downsamples_to_empty_output() {
    if !tools_available() {
        eprintln!("ffmpeg/ffprobe not on PATH, skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("fast.mp4");
    write_source(&src, 90.0, 32, 32, 100);

    let down = dir.path().join("fast-down.mp4");
    let stats = ClipTransformer::new(&FfmpegBackend)
        .downsample(&src, &down, 20.0)
        .unwrap();
    assert_eq!(stats.frames_read, 100);
    assert_eq!(stats.frames_written, 0);
    assert!(down.exists());
}

#[test]
fn test_writer_with_no_frames_closes_cleanly() {
    if !tools_available() {
        eprintln!("ffmpeg/ffprobe not on PATH, skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.mp4");
    let spec = WriterSpec {
        codec: Codec::MP4V,
        fps: 20.0,
        size: Size::new(89, 89),
        color: false,
    };
    let writer = FfmpegBackend.open_writer(&path, &spec).unwrap();
    assert_eq!(writer.finish().unwrap(), 0);
}
