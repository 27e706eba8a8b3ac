use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::scratch::ScratchFile;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ComposeError, ComposeResult};
use crate::foundation::math::mul_div255;
use crate::frame::FrameRGBA;

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    /// Replace `out_path` if it already exists.
    pub overwrite: bool,
    /// libx264 constant rate factor.
    pub crf: u8,
    /// libx264 preset name.
    pub preset: String,
    /// Colour that translucent output pixels are flattened onto.
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            crf: 23,
            preset: "medium".to_owned(),
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Streams raw frames into the system `ffmpeg`, producing H.264/yuv420p MP4.
///
/// Output goes to a `*.partial.mp4` scratch file that is renamed over `out_path` by
/// [`FrameSink::end`] and deleted on abort, failure or drop.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Option<ScratchFile>,

    /// Last frame written, flattened.
    buf: Vec<u8>,
    next: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: None,
            buf: Vec::new(),
            next: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    fn build_command(&self, cfg: &SinkConfig, scratch_path: &Path) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // The scratch file is ours; always overwrite it.
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);

        if let Some(audio) = cfg.audio_source.as_ref() {
            cmd.arg("-i").arg(audio);
            cmd.args(["-map", "0:v:0", "-map", "1:a:0?", "-c:a", "aac", "-shortest"]);
        } else {
            cmd.arg("-an");
        }

        if let Some(track) = cfg.subtitles.as_ref() {
            cmd.args(["-vf", &track.filter_arg()]);
        }

        cmd.args([
            "-c:v",
            "libx264",
            "-preset",
            &self.opts.preset,
            "-crf",
            &self.opts.crf.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
        ])
        .arg(scratch_path);
        cmd
    }

    fn join_stderr(&mut self) -> ComposeResult<Vec<u8>> {
        match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ComposeError::resource("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| ComposeError::resource(format!("ffmpeg stderr read failed: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    fn kill_child(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = self.join_stderr();
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ComposeResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ComposeError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ComposeError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if let Some(track) = cfg.subtitles.as_ref() {
            track.style.validate()?;
            if !track.path.is_file() {
                return Err(ComposeError::validation(format!(
                    "subtitle file '{}' does not exist",
                    track.path.display()
                )));
            }
        }
        if let Some(audio) = cfg.audio_source.as_ref()
            && !audio.is_file()
        {
            return Err(ComposeError::validation(format!(
                "audio source '{}' does not exist",
                audio.display()
            )));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(ComposeError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(ComposeError::resource(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let scratch = ScratchFile::beside(&self.opts.out_path);
        let scratch_path = scratch
            .path()
            .map(Path::to_path_buf)
            .ok_or_else(|| ComposeError::resource("scratch path unavailable"))?;
        let mut child = self.build_command(&cfg, &scratch_path).spawn().map_err(|e| {
            ComposeError::resource(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ComposeError::resource("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ComposeError::resource("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(
            out = %self.opts.out_path.display(),
            scratch = %scratch_path.display(),
            size = %cfg.canvas(),
            audio = cfg.audio_source.is_some(),
            subtitles = cfg.subtitles.is_some(),
            "ffmpeg sink started"
        );

        self.buf = vec![0u8; cfg.canvas().rgba_len()?];
        self.next = self.buf.clone();
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.scratch = Some(scratch);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ComposeResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ComposeError::resource("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(ComposeError::resource(format!(
                "ffmpeg sink received out-of-order frame {idx} after {last}"
            )));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ComposeError::dimension_mismatch(
                idx.0,
                format!(
                    "frame is {}x{}, sink expects {}x{}",
                    frame.width, frame.height, cfg.width, cfg.height
                ),
            ));
        }
        let last = self.last_idx.replace(idx);

        flatten_to_opaque_rgba8(&mut self.next, &frame.data, self.opts.bg_rgba)
            .map_err(|_| ComposeError::dimension_mismatch(idx.0, "frame data length mismatch"))?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ComposeError::resource("ffmpeg sink is already finalized"));
        };
        let written = write_gap_filled(stdin, &self.buf, &self.next, last, idx).map_err(|e| {
            ComposeError::resource(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        if written > 1 {
            tracing::debug!(idx = idx.0, filled = written - 1, "repeated frames over skipped slots");
        }
        std::mem::swap(&mut self.buf, &mut self.next);
        Ok(())
    }

    fn end(&mut self) -> ComposeResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ComposeError::resource("ffmpeg sink not started"))?;
        let status = child.wait().map_err(|e| {
            ComposeError::resource(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = self.join_stderr()?;
        let scratch = self.scratch.take();
        self.cfg = None;

        if !status.success() {
            drop(scratch);
            return Err(ComposeError::resource(format!(
                "ffmpeg exited with status {}: {}",
                status,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        let scratch = scratch.ok_or_else(|| ComposeError::resource("scratch file missing"))?;
        scratch.persist(&self.opts.out_path)?;
        tracing::debug!(out = %self.opts.out_path.display(), "ffmpeg sink finished");
        Ok(())
    }

    fn abort(&mut self) {
        if self.child.is_some() {
            tracing::debug!(out = %self.opts.out_path.display(), "ffmpeg sink aborted");
        }
        self.kill_child();
        self.scratch = None;
        self.cfg = None;
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.kill_child();
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // `-r` before `-i` sets the rawvideo input rate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Flatten straight-alpha RGBA8 over an opaque background colour.
fn flatten_to_opaque_rgba8(dst: &mut [u8], src: &[u8], bg_rgba: [u8; 4]) -> ComposeResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ComposeError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            d[c] = mul_div255(u16::from(s[c]), a)
                .saturating_add(mul_div255(u16::from(bg_rgba[c]), inv));
        }
        d[3] = 255;
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
/// Write `frame` to a constant-rate raw stream. Every index skipped since `last` is covered by
/// repeating `prev` (or `frame` itself for a leading gap), so later frames keep their timestamps
/// relative to audio and subtitles. Returns the number of frames written.
fn write_gap_filled<W: std::io::Write>(
    out: &mut W,
    prev: &[u8],
    frame: &[u8],
    last: Option<FrameIndex>,
    idx: FrameIndex,
) -> std::io::Result<u64> {
    let (fill, missing) = match last {
        Some(last) => (prev, idx.0.saturating_sub(last.0 + 1)),
        None => (frame, idx.0),
    };
    for _ in 0..missing {
        out.write_all(fill)?;
    }
    out.write_all(frame)?;
    Ok(missing + 1)
}

pub fn ensure_parent_dir(path: &Path) -> ComposeResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            ComposeError::resource(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    cfg!(feature = "media-ffmpeg")
        && Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
