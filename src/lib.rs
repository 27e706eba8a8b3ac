#![forbid(unsafe_code)]
//! Blue-screen picture-in-picture compositing with a progressive zoom effect.
//!
//! A [`ComposeSession`] keys a foreground clip against its blue (or green) screen, scales it by
//! the zoom effect's clock and composites it over every background frame, streaming the result
//! into a [`FrameSink`].

mod foundation;

pub mod composite;
pub mod config;
pub mod effect;
pub mod encode;
pub mod frame;
pub mod key;
pub mod pipeline;
pub mod source;
pub mod subtitle;

pub use composite::{Anchor, Placement, composite};
pub use config::ComposeConfig;
pub use effect::{CyclePhase, CycleState, Ease, EffectConfig, EffectSample, EffectTimeline};
pub use encode::{FfmpegSink, FfmpegSinkOpts, FrameSink, InMemorySink, PngSequenceSink, SinkConfig};
pub use foundation::core::{Canvas, Fps, FrameIndex, Point};
pub use foundation::error::{ComposeError, ComposeResult};
pub use frame::{CompositeFrame, Frame, FrameRGBA, SharedFrame};
pub use key::{ChromaKeyMask, ChromaKeyer, KeyColor, KeyParams};
pub use pipeline::{
    CancelToken, ComposeSession, FgEndPolicy, LogProgress, Progress, ProgressReporter, RunStats,
    SessionOpts,
};
pub use source::{FfmpegSource, FrameSource, MemorySource, SourceInfo};
pub use subtitle::{AssColor, SubtitleStyle, SubtitleTrack};
