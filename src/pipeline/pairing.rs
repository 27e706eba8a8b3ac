use std::sync::Arc;

use crate::foundation::error::{ComposeError, ComposeResult};
use crate::frame::{Frame, SharedFrame};
use crate::pipeline::reader::{ReadOutcome, RetryingReader};
use crate::source::FrameSource;

/// What happens when the foreground clip is shorter than the background.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FgEndPolicy {
    /// Keep showing the last foreground frame.
    #[default]
    Hold,
    /// Restart the foreground from its first frame.
    Loop,
}

/// Pairs background timestamps with the foreground frame of nearest timestamp, reading the
/// foreground lazily. Timestamps are relative to the start of each clip; ties go to the later
/// frame.
pub struct FramePairer {
    policy: FgEndPolicy,
    current: SharedFrame,
    /// Timeline position of `current`.
    current_t: f64,
    lookahead: Option<(SharedFrame, f64)>,
    /// Foreground pts of its first frame in the current pass.
    origin: f64,
    /// Added to foreground pts to place the current pass on the background timeline.
    offset: f64,
    frame_secs: f64,
    last_t: f64,
    ended: bool,
    loops: u64,
}

impl FramePairer {
    /// Start pairing from the first foreground frame, already read by the caller.
    pub fn new(first: Frame, policy: FgEndPolicy, frame_secs: f64) -> Self {
        let origin = first.pts;
        Self {
            policy,
            current: Arc::new(first),
            current_t: 0.0,
            lookahead: None,
            origin,
            offset: 0.0,
            frame_secs: if frame_secs.is_finite() && frame_secs > 0.0 {
                frame_secs
            } else {
                1.0 / 30.0
            },
            last_t: 0.0,
            ended: false,
            loops: 0,
        }
    }

    pub fn current(&self) -> &SharedFrame {
        &self.current
    }

    /// Number of times the foreground restarted.
    pub fn loops(&self) -> u64 {
        self.loops
    }

    /// Foreground frame nearest to background elapsed time `t`.
    pub fn frame_for(
        &mut self,
        t: f64,
        src: &mut dyn FrameSource,
        reader: &mut RetryingReader,
    ) -> ComposeResult<SharedFrame> {
        loop {
            let Some((next, next_t)) = self.peek(src, reader)? else {
                break;
            };
            if (next_t - t).abs() <= (self.current_t - t).abs() {
                self.current = next;
                self.current_t = next_t;
                self.lookahead = None;
            } else {
                break;
            }
        }
        Ok(self.current.clone())
    }

    fn peek(
        &mut self,
        src: &mut dyn FrameSource,
        reader: &mut RetryingReader,
    ) -> ComposeResult<Option<(SharedFrame, f64)>> {
        if self.lookahead.is_none() && !self.ended {
            self.lookahead = self.read_next(src, reader)?;
        }
        Ok(self.lookahead.clone())
    }

    fn read_next(
        &mut self,
        src: &mut dyn FrameSource,
        reader: &mut RetryingReader,
    ) -> ComposeResult<Option<(SharedFrame, f64)>> {
        let mut restarted = false;
        loop {
            match reader.read(src, "foreground")? {
                ReadOutcome::Frame(frame) => {
                    let t = frame.pts - self.origin + self.offset;
                    self.last_t = self.last_t.max(t);
                    return Ok(Some((Arc::new(frame), t)));
                }
                ReadOutcome::Skipped(_) => continue,
                ReadOutcome::End => match self.policy {
                    FgEndPolicy::Hold => {
                        self.ended = true;
                        return Ok(None);
                    }
                    FgEndPolicy::Loop => {
                        if restarted {
                            return Err(ComposeError::resource(
                                "foreground produced no frames after rewinding",
                            ));
                        }
                        restarted = true;
                        src.rewind()?;
                        self.offset = self.last_t + self.frame_secs;
                        self.loops += 1;
                        tracing::debug!(loops = self.loops, offset = self.offset, "foreground looped");
                    }
                },
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/pairing.rs"]
mod tests;
