//! Frame sources feeding the pipeline.

mod ffmpeg;
mod memory;

pub use ffmpeg::{FfmpegSource, decode_frame_at, probe_video};
pub use memory::MemorySource;

use std::path::PathBuf;

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::ComposeResult;
use crate::frame::Frame;

/// Static description of a source, known before the first frame is read.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Container duration in seconds; 0 when unknown.
    pub duration_secs: f64,
    /// Exact frame count when the source knows it.
    pub frame_count: Option<u64>,
    /// Backing file, for sinks that re-read streams such as audio.
    pub path: Option<PathBuf>,
    pub has_audio: bool,
}

impl SourceInfo {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Best estimate of the number of frames: the exact count, or duration times fps.
    pub fn estimated_frames(&self) -> Option<u64> {
        self.frame_count.or_else(|| {
            (self.duration_secs > 0.0).then(|| self.fps.secs_to_frames_floor(self.duration_secs))
        })
    }
}

/// Sequential frame reader.
///
/// Frames come out with consecutive sequence numbers starting at 0. A failed
/// [`next_frame`](FrameSource::next_frame) does not advance the source, so the same slot can be
/// retried; [`skip_frame`](FrameSource::skip_frame) gives up on the current slot.
pub trait FrameSource: Send {
    fn info(&self) -> &SourceInfo;

    /// Read the next frame, or `Ok(None)` at the end of the stream.
    fn next_frame(&mut self) -> ComposeResult<Option<Frame>>;

    /// Drop the current slot and move on to the next sequence number.
    fn skip_frame(&mut self) -> ComposeResult<()>;

    /// Restart from the first frame.
    fn rewind(&mut self) -> ComposeResult<()>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn info(&self) -> &SourceInfo {
        (**self).info()
    }

    fn next_frame(&mut self) -> ComposeResult<Option<Frame>> {
        (**self).next_frame()
    }

    fn skip_frame(&mut self) -> ComposeResult<()> {
        (**self).skip_frame()
    }

    fn rewind(&mut self) -> ComposeResult<()> {
        (**self).rewind()
    }
}
