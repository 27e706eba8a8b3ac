use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ComposeError, ComposeResult};
use crate::frame::Frame;
use crate::source::FrameSource;

/// Result of one policy-governed read.
#[derive(Debug)]
pub enum ReadOutcome {
    Frame(Frame),
    /// The slot failed past its retries and was dropped within the skip budget.
    Skipped(FrameIndex),
    End,
}

/// Applies the per-frame decode failure policy: retry `retry_count` times, then skip while
/// `max_skipped_frames` allows, then escalate.
#[derive(Clone, Debug)]
pub struct RetryingReader {
    retry_count: u32,
    max_skipped: u32,
    skipped: u32,
    retries: u64,
}

impl RetryingReader {
    pub fn new(retry_count: u32, max_skipped_frames: u32) -> Self {
        Self {
            retry_count,
            max_skipped: max_skipped_frames,
            skipped: 0,
            retries: 0,
        }
    }

    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    pub fn retries(&self) -> u64 {
        self.retries
    }

    /// Read the next slot of `src`. Errors other than
    /// [`FrameDecode`](ComposeError::FrameDecode) are returned unchanged on first sight.
    pub fn read(&mut self, src: &mut dyn FrameSource, label: &str) -> ComposeResult<ReadOutcome> {
        let mut attempt = 0u32;
        loop {
            let err = match src.next_frame() {
                Ok(Some(frame)) => return Ok(ReadOutcome::Frame(frame)),
                Ok(None) => return Ok(ReadOutcome::End),
                Err(e) if e.is_recoverable() => e,
                Err(e) => return Err(e),
            };
            let seq = match &err {
                ComposeError::FrameDecode { seq, .. } => *seq,
                _ => 0,
            };

            if attempt < self.retry_count {
                attempt += 1;
                self.retries += 1;
                tracing::warn!(source = label, seq, attempt, error = %err, "retrying frame decode");
                continue;
            }
            if self.skipped < self.max_skipped {
                self.skipped += 1;
                tracing::warn!(
                    source = label,
                    seq,
                    skipped = self.skipped,
                    budget = self.max_skipped,
                    error = %err,
                    "skipping undecodable frame"
                );
                src.skip_frame()?;
                return Ok(ReadOutcome::Skipped(FrameIndex(seq)));
            }
            return Err(err);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/reader.rs"]
mod tests;
