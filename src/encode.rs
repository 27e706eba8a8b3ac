//! Encoding sinks.
//!
//! Sinks consume composited frames in sequence order. Every run ends in exactly one of
//! [`FrameSink::end`] (success) or [`FrameSink::abort`] (failure or cancellation).

mod ffmpeg;
mod png;
mod scratch;
mod sink;

pub use ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, is_ffmpeg_on_path};
pub use png::{PngSequenceSink, save_png};
pub use scratch::ScratchFile;
pub use sink::{FrameSink, InMemorySink, SinkConfig};
