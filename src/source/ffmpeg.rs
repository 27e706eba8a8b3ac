use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use crate::foundation::core::Fps;
use crate::foundation::error::{ComposeError, ComposeResult};
use crate::frame::{Frame, FrameRGBA};
use crate::source::{FrameSource, SourceInfo};

/// Streams RGBA8 frames out of a video file through the system `ffmpeg`.
///
/// One decoder process runs per pass over the file; [`FrameSource::rewind`] starts a new one.
pub struct FfmpegSource {
    info: SourceInfo,
    path: PathBuf,
    frame_len: usize,
    decoder: Option<Decoder>,
    next_seq: u64,
    /// Bytes of the current slot read so far; kept across failed reads.
    pending: Vec<u8>,
    filled: usize,
    exhausted: bool,
}

struct Decoder {
    child: Child,
    stdout: ChildStdout,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl Decoder {
    /// Reap the process and report a non-zero exit.
    fn finish(mut self) -> ComposeResult<()> {
        let status = self
            .child
            .wait()
            .map_err(|e| ComposeError::resource(format!("failed to wait for ffmpeg decoder: {e}")))?;
        let stderr = self.take_stderr();
        if !status.success() {
            return Err(ComposeError::resource(format!(
                "ffmpeg decoder exited with status {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(())
    }

    fn take_stderr(&mut self) -> Vec<u8> {
        self.stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .and_then(|r| r.ok())
            .unwrap_or_default()
    }
}

impl Drop for Decoder {
    fn drop(&mut self) {
        if self.stderr_drain.is_some() {
            let _ = self.child.kill();
            let _ = self.child.wait();
            let _ = self.take_stderr();
        }
    }
}

impl FfmpegSource {
    /// Probe `path` and start decoding from its first frame.
    pub fn open(path: impl Into<PathBuf>) -> ComposeResult<Self> {
        let path = path.into();
        let info = probe_video(&path)?;
        let frame_len = info.canvas().rgba_len()?;
        if frame_len == 0 {
            return Err(ComposeError::resource(format!(
                "'{}' has zero-sized video frames",
                path.display()
            )));
        }
        let decoder = spawn_decoder(&path)?;
        tracing::debug!(
            path = %path.display(),
            size = %info.canvas(),
            fps = info.fps.as_f64(),
            duration = info.duration_secs,
            "opened ffmpeg source"
        );
        Ok(Self {
            info,
            path,
            frame_len,
            decoder: Some(decoder),
            next_seq: 0,
            pending: vec![0u8; frame_len],
            filled: 0,
            exhausted: false,
        })
    }

    /// Read the rest of the current slot into `pending`.
    ///
    /// Returns `Ok(false)` on a clean end of stream before any byte of the slot.
    fn fill_slot(&mut self) -> ComposeResult<bool> {
        let seq = self.next_seq;
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(false);
        };
        while self.filled < self.frame_len {
            match decoder.stdout.read(&mut self.pending[self.filled..]) {
                Ok(0) if self.filled == 0 => return Ok(false),
                Ok(0) => {
                    return Err(ComposeError::frame_decode(
                        seq,
                        format!(
                            "stream ended after {} of {} bytes",
                            self.filled, self.frame_len
                        ),
                    ));
                }
                Ok(n) => self.filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    return Err(ComposeError::frame_decode(
                        seq,
                        format!("failed to read decoded frame: {e}"),
                    ));
                }
            }
        }
        Ok(true)
    }

    fn end_of_stream(&mut self) -> ComposeResult<()> {
        self.exhausted = true;
        match self.decoder.take() {
            Some(decoder) => decoder.finish(),
            None => Ok(()),
        }
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn next_frame(&mut self) -> ComposeResult<Option<Frame>> {
        if self.exhausted {
            return Ok(None);
        }
        if !self.fill_slot()? {
            self.end_of_stream()?;
            return Ok(None);
        }

        let seq = self.next_seq;
        let data = std::mem::replace(&mut self.pending, vec![0u8; self.frame_len]);
        self.filled = 0;
        self.next_seq += 1;
        let image = FrameRGBA::from_raw(self.info.width, self.info.height, data)?;
        Ok(Some(Frame::new(seq, self.info.fps.frames_to_secs(seq), image)))
    }

    fn skip_frame(&mut self) -> ComposeResult<()> {
        if self.exhausted {
            return Ok(());
        }
        let seq = self.next_seq;
        match self.fill_slot() {
            Ok(true) => {}
            Ok(false) => return self.end_of_stream(),
            Err(e) => {
                // Truncated tail or broken pipe: nothing after this slot can be trusted.
                tracing::warn!(seq, error = %e, "decoder stream unusable after skipped frame");
                self.end_of_stream()?;
            }
        }
        self.filled = 0;
        self.next_seq += 1;
        Ok(())
    }

    fn rewind(&mut self) -> ComposeResult<()> {
        drop(self.decoder.take());
        self.decoder = Some(spawn_decoder(&self.path)?);
        self.next_seq = 0;
        self.filled = 0;
        self.exhausted = false;
        Ok(())
    }
}

#[cfg(feature = "media-ffmpeg")]
fn spawn_decoder(path: &Path) -> ComposeResult<Decoder> {
    let mut child = Command::new("ffmpeg")
        .args(["-v", "error", "-nostdin", "-i"])
        .arg(path)
        .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            ComposeError::resource(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ComposeError::resource("failed to open ffmpeg stdout (unexpected)"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| ComposeError::resource("failed to open ffmpeg stderr (unexpected)"))?;
    let stderr_drain = std::thread::spawn(move || {
        let mut bytes = Vec::new();
        stderr.read_to_end(&mut bytes)?;
        Ok(bytes)
    });

    Ok(Decoder {
        child,
        stdout,
        stderr_drain: Some(stderr_drain),
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
fn spawn_decoder(_path: &Path) -> ComposeResult<Decoder> {
    Err(ComposeError::resource(
        "video decoding requires the 'media-ffmpeg' feature",
    ))
}

/// Read stream geometry, frame rate, duration and audio presence with `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(path: &Path) -> ComposeResult<SourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        avg_frame_rate: Option<String>,
        nb_frames: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| ComposeError::resource(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ComposeError::resource(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ComposeError::resource(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            ComposeError::resource(format!("no video stream found in '{}'", path.display()))
        })?;
    let width = video
        .width
        .ok_or_else(|| ComposeError::resource("missing video width from ffprobe"))?;
    let height = video
        .height
        .ok_or_else(|| ComposeError::resource("missing video height from ffprobe"))?;

    // `avg_frame_rate` is 0/0 for some streams; fall back to the container's base rate.
    let fps = [video.avg_frame_rate.as_deref(), video.r_frame_rate.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|s| Fps::parse_ratio(s).ok())
        .ok_or_else(|| ComposeError::resource("invalid or missing video frame rate"))?;
    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);
    let frame_count = video
        .nb_frames
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|&n| n > 0);
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(SourceInfo {
        width,
        height,
        fps,
        duration_secs,
        frame_count,
        path: Some(path.to_path_buf()),
        has_audio,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_path: &Path) -> ComposeResult<SourceInfo> {
    Err(ComposeError::resource(
        "video probing requires the 'media-ffmpeg' feature",
    ))
}

/// Decode the single frame shown at `time_secs`.
#[cfg(feature = "media-ffmpeg")]
pub fn decode_frame_at(path: &Path, time_secs: f64) -> ComposeResult<Frame> {
    let info = probe_video(path)?;
    let expected = info.canvas().rgba_len()?;
    let t = time_secs.max(0.0);
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-nostdin", "-ss", &format!("{t:.9}")])
        .arg("-i")
        .arg(path)
        .args([
            "-frames:v",
            "1",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| ComposeError::resource(format!("failed to run ffmpeg for decode: {e}")))?;
    if !out.status.success() {
        return Err(ComposeError::resource(format!(
            "ffmpeg decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let seq = info.fps.secs_to_frames_floor(t);
    if out.stdout.len() < expected {
        return Err(ComposeError::frame_decode(
            seq,
            format!(
                "ffmpeg returned {} bytes at t={t:.3}s in '{}', expected {expected}",
                out.stdout.len(),
                path.display()
            ),
        ));
    }
    let mut data = out.stdout;
    data.truncate(expected);
    let image = FrameRGBA::from_raw(info.width, info.height, data)?;
    Ok(Frame::new(seq, t, image))
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn decode_frame_at(_path: &Path, _time_secs: f64) -> ComposeResult<Frame> {
    Err(ComposeError::resource(
        "video decoding requires the 'media-ffmpeg' feature",
    ))
}
