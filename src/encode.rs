//!
//! Destinations for rendered frames: an mp4 encoded by the system `ffmpeg`, a directory
//! of numbered png files, or a single png.
//!

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use image::RgbImage;
use tracing::{debug, warn};

use crate::error::{TrifadeError, TrifadeResult};

/// Consumer of a sequence of equally sized frames.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &RgbImage) -> TrifadeResult<()>;

    /// Flush and close the output.
    fn finish(self: Box<Self>) -> TrifadeResult<()>;

    /// Stop early, releasing whatever was partially written.
    fn abort(self: Box<Self>);
}

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn new(out_path: impl Into<PathBuf>, width: u32, height: u32, fps: f64) -> Self {
        EncodeConfig {
            width,
            height,
            fps,
            out_path: out_path.into(),
            overwrite: true,
        }
    }

    pub fn validate(&self) -> TrifadeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TrifadeError::invalid_parameter(
                "encode width/height must be non-zero",
            ));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(TrifadeError::invalid_parameter(
                "encode fps must be positive",
            ));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            // yuv420p output needs even sizes
            return Err(TrifadeError::invalid_parameter(
                "encode width/height must be even",
            ));
        }
        Ok(())
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn ensure_parent_dir(path: &Path) -> TrifadeResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub struct FfmpegSink {
    cfg: EncodeConfig,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl FfmpegSink {
    pub fn create(cfg: EncodeConfig) -> TrifadeResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(TrifadeError::export_sink(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(TrifadeError::export_sink(
                "ffmpeg is required for mp4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.arg(if cfg.overwrite { "-y" } else { "-n" });
        cmd.args(&[
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd
            .spawn()
            .map_err(|e| TrifadeError::export_sink(format!("failed to spawn ffmpeg: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TrifadeError::export_sink("failed to open ffmpeg stdin"))?;

        debug!(path = %cfg.out_path.display(), "started ffmpeg");

        Ok(FfmpegSink {
            cfg,
            child,
            stdin: Some(stdin),
        })
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &RgbImage) -> TrifadeResult<()> {
        if frame.width() != self.cfg.width || frame.height() != self.cfg.height {
            return Err(TrifadeError::export_sink(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                self.cfg.width,
                self.cfg.height
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| TrifadeError::export_sink("ffmpeg encoder is already finalized"))?;

        stdin.write_all(frame.as_raw()).map_err(|e| {
            TrifadeError::export_sink(format!("failed to write frame to ffmpeg stdin: {}", e))
        })
    }

    fn finish(self: Box<Self>) -> TrifadeResult<()> {
        let FfmpegSink { cfg, child, stdin } = *self;
        drop(stdin);

        let res = finish_child(child);
        if res.is_err() {
            remove_partial_output(&cfg.out_path);
        }
        res
    }

    fn abort(mut self: Box<Self>) {
        drop(self.stdin.take());
        if let Err(e) = self.child.kill() {
            debug!("ffmpeg already exited: {}", e);
        }
        let _ = self.child.wait();

        remove_partial_output(&self.cfg.out_path);
    }
}

fn finish_child(child: Child) -> TrifadeResult<()> {
    let output = child
        .wait_with_output()
        .map_err(|e| TrifadeError::export_sink(format!("failed to wait for ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TrifadeError::export_sink(format!(
            "ffmpeg exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}

fn remove_partial_output(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        debug!("no partial output to remove at '{}': {}", path.display(), e);
    }
}

/// Writes `frame-00000.png`, `frame-00001.png`, ... into a directory.
pub struct PngSequenceSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl PngSequenceSink {
    pub fn create(dir: impl Into<PathBuf>) -> TrifadeResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(PngSequenceSink {
            dir,
            written: vec![],
        })
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame-{:05}.png", index))
    }
}

impl FrameSink for PngSequenceSink {
    fn write_frame(&mut self, frame: &RgbImage) -> TrifadeResult<()> {
        let path = self.frame_path(self.written.len());
        save_png(frame, &path)?;
        self.written.push(path);
        Ok(())
    }

    fn finish(self: Box<Self>) -> TrifadeResult<()> {
        debug!(frames = self.written.len(), dir = %self.dir.display(), "wrote png sequence");
        Ok(())
    }

    fn abort(self: Box<Self>) {
        for path in &self.written {
            if let Err(e) = fs::remove_file(path) {
                warn!("failed to remove partial frame '{}': {}", path.display(), e);
            }
        }
    }
}

pub fn save_png(frame: &RgbImage, path: &Path) -> TrifadeResult<()> {
    ensure_parent_dir(path)?;
    frame
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| {
            TrifadeError::export_sink(format!("failed to save '{}': {}", path.display(), e))
        })
}
