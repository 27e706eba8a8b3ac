use std::path::PathBuf;

use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::ComposeResult;
use crate::frame::FrameRGBA;
use crate::subtitle::SubtitleTrack;

/// Configuration handed to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Media file whose first audio stream is passed through to the output.
    pub audio_source: Option<PathBuf>,
    /// Subtitles burned into the output.
    pub subtitles: Option<SubtitleTrack>,
}

impl SinkConfig {
    pub fn new(canvas: Canvas, fps: Fps) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            fps,
            audio_source: None,
            subtitles: None,
        }
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// Consumer of composited frames.
///
/// `push_frame` is called in strictly increasing [`FrameIndex`] order. Indices of skipped frames
/// are absent; sinks that write a constant-rate stream must cover the gap themselves (the ffmpeg
/// sink repeats the previous frame) so later frames keep their timestamps.
pub trait FrameSink: Send {
    fn begin(&mut self, cfg: SinkConfig) -> ComposeResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ComposeResult<()>;
    /// Finalize the output after the last frame.
    fn end(&mut self) -> ComposeResult<()>;
    /// Discard partial output and release resources. Must be safe to call in any state.
    fn abort(&mut self) {}
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
    aborted: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    pub fn indices(&self) -> Vec<u64> {
        self.frames.iter().map(|(idx, _)| idx.0).collect()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ComposeResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ComposeResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ComposeResult<()> {
        self.ended = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}
