use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::ChildStdout;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use super::{estimate_frame_count, parse_frame_rate, ClipInfo, ClipReader, Frame};
use crate::error::{PrepError, Result};

/// The ffprobe fields a [`ClipInfo`] is built from
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct StreamFacts<'a> {
    pub avg_frame_rate: &'a str,
    pub r_frame_rate: &'a str,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub nb_frames: Option<&'a str>,
    pub duration: Option<&'a str>,
}

/// Map probed stream fields to clip metadata.
///
/// `avg_frame_rate` wins over `r_frame_rate`; a positive `nb_frames` wins
/// over `round(duration * fps)`.
pub(crate) fn clip_info_from(facts: &StreamFacts<'_>) -> std::result::Result<ClipInfo, &'static str> {
    let fps = parse_frame_rate(facts.avg_frame_rate)
        .or_else(|| parse_frame_rate(facts.r_frame_rate))
        .ok_or("unknown frame rate")?;

    let (width, height) = match (facts.width, facts.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w as u32, h as u32),
        _ => return Err("unknown frame size"),
    };

    let frame_count = facts
        .nb_frames
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(|| {
            let duration = facts.duration.and_then(|d| d.parse::<f64>().ok());
            estimate_frame_count(duration, fps)
        });

    Ok(ClipInfo {
        fps,
        frame_count,
        width,
        height,
        channels: 3,
    })
}

/// Probe a clip with ffprobe and return the first video stream's metadata.
pub fn probe_clip(path: &Path) -> Result<ClipInfo> {
    let metadata = ffprobe::ffprobe(path).map_err(|e| PrepError::open(path, e))?;

    let stream = metadata
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| PrepError::open(path, "no video stream"))?;

    let facts = StreamFacts {
        avg_frame_rate: &stream.avg_frame_rate,
        r_frame_rate: &stream.r_frame_rate,
        width: stream.width.map(|w| w as i64),
        height: stream.height.map(|h| h as i64),
        nb_frames: stream.nb_frames.as_deref(),
        duration: metadata.format.duration.as_deref(),
    };
    clip_info_from(&facts).map_err(|reason| PrepError::open(path, reason))
}

/// Decoder arguments: every frame passed through unchanged as packed rgb24
/// on stdout.
pub(crate) fn decoder_args(path: &Path) -> Vec<String> {
    let mut args = vec!["-noautorotate".to_string(), "-i".to_string()];
    args.push(path.to_string_lossy().into_owned());
    args.extend(["-fps_mode", "passthrough", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"].map(String::from));
    args
}

/// Decodes a clip by piping rgb24 frames out of an ffmpeg child process.
pub struct FfmpegReader {
    path: PathBuf,
    info: ClipInfo,
    child: FfmpegChild,
    stdout: Option<ChildStdout>,
    stderr_handle: Option<JoinHandle<()>>,
    frame_size: usize,
}

impl FfmpegReader {
    pub fn open(path: &Path) -> Result<Self> {
        let info = probe_clip(path)?;

        let mut command = FfmpegCommand::new();
        command.hide_banner();
        command.args(decoder_args(path));

        debug!(clip = %path.display(), ?info, "spawning ffmpeg decoder");

        let mut child = command.spawn().map_err(|e| PrepError::open(path, e))?;
        let stdout = child
            .take_stdout()
            .ok_or_else(|| PrepError::open(path, "ffmpeg stdout not available"))?;
        let stderr_handle = spawn_stderr_drain(&mut child, path);

        let frame_size = info.width as usize * info.height as usize * 3;

        Ok(Self {
            path: path.to_path_buf(),
            info,
            child,
            stdout: Some(stdout),
            stderr_handle,
            frame_size,
        })
    }
}

impl ClipReader for FfmpegReader {
    fn info(&self) -> &ClipInfo {
        &self.info
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buffer = vec![0u8; self.frame_size];
        match stdout.read_exact(&mut buffer) {
            Ok(()) => Frame::from_raw(self.info.width, self.info.height, 3, buffer).map(Some),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.stdout = None;
                Ok(None)
            }
            Err(e) => Err(PrepError::decode(&self.path, e)),
        }
    }
}

impl Drop for FfmpegReader {
    fn drop(&mut self) {
        // Closing the pipe first lets ffmpeg exit on SIGPIPE if it is mid-stream
        self.stdout.take();
        if let Err(e) = self.child.kill() {
            debug!(clip = %self.path.display(), "ffmpeg decoder already exited: {}", e);
        }
        let _ = self.child.wait();
        if let Some(handle) = self.stderr_handle.take() {
            let _ = handle.join();
        }
    }
}

/// Drain ffmpeg's stderr on a helper thread so the child never blocks on a
/// full pipe. Lines are forwarded to the debug log.
pub(crate) fn spawn_stderr_drain(child: &mut FfmpegChild, path: &Path) -> Option<JoinHandle<()>> {
    let stderr = child.take_stderr()?;
    let clip = path.display().to_string();

    Some(thread::spawn(move || {
        let reader = BufReader::new(stderr);
        for line in reader.lines().map_while(|l| l.ok()) {
            if line.contains("rror") || line.contains("atal") {
                warn!(clip = %clip, "[ffmpeg] {}", line);
            } else {
                debug!(clip = %clip, "[ffmpeg] {}", line);
            }
        }
    }))
}
