use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ChildStdin;
use std::thread::JoinHandle;
use tracing::debug;

use super::{ClipWriter, WriterSpec};
use crate::decoder::ffmpeg::spawn_stderr_drain;
use crate::decoder::Frame;
use crate::error::{PrepError, Result};

/// Arguments after the global flags: a rawvideo stdin input declared with
/// the writer geometry, encoded as MPEG-4 part 2 under the codec tag.
pub(crate) fn encoder_args(path: &Path, spec: &WriterSpec) -> Vec<String> {
    let pix_fmt = if spec.color { "rgb24" } else { "gray" };
    let mut args: Vec<String> = ["-f", "rawvideo", "-pix_fmt", pix_fmt].map(String::from).to_vec();
    args.extend([
        "-s".to_string(),
        spec.size.to_string(),
        "-r".to_string(),
        spec.fps.to_string(),
        "-i".to_string(),
        "pipe:0".to_string(),
    ]);
    args.extend(["-c:v", "mpeg4", "-tag:v"].map(String::from));
    args.push(spec.codec.to_string());
    args.extend(["-pix_fmt", "yuv420p"].map(String::from));
    args.push(path.to_string_lossy().into_owned());
    args
}

/// Encodes a clip by feeding raw frames into an ffmpeg child process.
pub struct FfmpegWriter {
    path: PathBuf,
    spec: WriterSpec,
    child: FfmpegChild,
    stdin: Option<BufWriter<ChildStdin>>,
    stderr_handle: Option<JoinHandle<()>>,
    frames_written: u64,
}

impl FfmpegWriter {
    pub fn open(path: &Path, spec: &WriterSpec) -> Result<Self> {
        let mut command = FfmpegCommand::new();
        command.hide_banner();
        command.overwrite();
        command.args(encoder_args(path, spec));

        debug!(clip = %path.display(), codec = %spec.codec, fps = spec.fps, size = %spec.size, "spawning ffmpeg encoder");

        let mut child = command.spawn().map_err(|e| PrepError::encode(path, e))?;
        let stdin = child
            .take_stdin()
            .ok_or_else(|| PrepError::encode(path, "ffmpeg stdin not available"))?;
        let stderr_handle = spawn_stderr_drain(&mut child, path);

        Ok(Self {
            path: path.to_path_buf(),
            spec: *spec,
            child,
            stdin: Some(BufWriter::new(stdin)),
            stderr_handle,
            frames_written: 0,
        })
    }

    fn close(&mut self) -> Result<()> {
        let flushed = match self.stdin.take() {
            Some(mut stdin) => stdin.flush().map_err(|e| PrepError::encode(&self.path, e)),
            None => Ok(()),
        };
        let status = self.child.wait().map_err(|e| PrepError::encode(&self.path, e));
        if let Some(handle) = self.stderr_handle.take() {
            let _ = handle.join();
        }

        flushed?;
        let status = status?;
        if !status.success() {
            return Err(PrepError::encode(
                &self.path,
                format!("ffmpeg exited with {}", status),
            ));
        }
        Ok(())
    }
}

impl ClipWriter for FfmpegWriter {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.spec.check_frame(&self.path, frame)?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| PrepError::encode(&self.path, "writer already closed"))?;
        stdin
            .write_all(frame.as_bytes())
            .map_err(|e| PrepError::encode(&self.path, e))?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<u64> {
        self.close()?;
        Ok(self.frames_written)
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        if self.stdin.is_some() {
            if let Err(e) = self.close() {
                debug!(clip = %self.path.display(), "ffmpeg encoder closed with error: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Size;
    use crate::encoder::Codec;

    fn spec(width: u32, height: u32, color: bool) -> WriterSpec {
        WriterSpec {
            codec: Codec::MP4V,
            fps: 20.0,
            size: Size::new(width, height),
            color,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
        args.windows(2)
            .filter(|w| w[0] == flag)
            .map(|w| w[1].as_str())
            .collect()
    }

    #[test]
    fn test_color_writer_feeds_rgb24() {
        let args = encoder_args(Path::new("out/a.mp4"), &spec(500, 500, true));
        assert_eq!(value_after(&args, "-pix_fmt"), vec!["rgb24", "yuv420p"]);
        assert_eq!(value_after(&args, "-s"), vec!["500x500"]);
        assert_eq!(value_after(&args, "-r"), vec!["20"]);
        assert_eq!(value_after(&args, "-i"), vec!["pipe:0"]);
        assert_eq!(args.last().map(String::as_str), Some("out/a.mp4"));
    }

    #[test]
    fn test_gray_writer_feeds_gray() {
        let args = encoder_args(Path::new("a-gray.mp4"), &spec(500, 500, false));
        assert_eq!(value_after(&args, "-pix_fmt"), vec!["gray", "yuv420p"]);
    }

    #[test]
    fn test_context_size_uses_mp4v_tag() {
        let args = encoder_args(Path::new("a-context.mp4"), &spec(89, 89, false));
        assert_eq!(value_after(&args, "-s"), vec!["89x89"]);
        assert_eq!(value_after(&args, "-c:v"), vec!["mpeg4"]);
        assert_eq!(value_after(&args, "-tag:v"), vec!["mp4v"]);

        // input options precede the input, output options follow it
        let input = args.iter().position(|a| a == "pipe:0").unwrap();
        let codec = args.iter().position(|a| a == "mpeg4").unwrap();
        let rate = args.iter().position(|a| a == "-r").unwrap();
        assert!(rate < input && input < codec);
    }
}
