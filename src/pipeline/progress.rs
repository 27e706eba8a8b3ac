use std::time::Duration;

/// Snapshot of run progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Background frames handled so far, composited or skipped.
    pub frames_processed: u64,
    pub frames_total: Option<u64>,
    pub elapsed: Duration,
}

impl Progress {
    /// Completed fraction in `[0, 1]`, when the total is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.frames_total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.frames_processed as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

/// Receives progress from the encoder stage after every frame.
pub trait ProgressReporter: Send {
    fn report(&mut self, progress: Progress);
}

impl<F> ProgressReporter for F
where
    F: FnMut(Progress) + Send,
{
    fn report(&mut self, progress: Progress) {
        self(progress)
    }
}

/// Logs progress through `tracing` every `every` frames and on the last frame.
#[derive(Clone, Debug)]
pub struct LogProgress {
    every: u64,
}

impl LogProgress {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ProgressReporter for LogProgress {
    fn report(&mut self, p: Progress) {
        let last = p.frames_total == Some(p.frames_processed);
        if !last && !p.frames_processed.is_multiple_of(self.every) {
            return;
        }
        let fps = if p.elapsed.as_secs_f64() > 0.0 {
            p.frames_processed as f64 / p.elapsed.as_secs_f64()
        } else {
            0.0
        };
        match p.fraction() {
            Some(f) => tracing::info!(
                frames = p.frames_processed,
                total = p.frames_total.unwrap_or(0),
                percent = format_args!("{:.1}", f * 100.0),
                fps = format_args!("{fps:.1}"),
                "progress"
            ),
            None => tracing::info!(
                frames = p.frames_processed,
                fps = format_args!("{fps:.1}"),
                "progress"
            ),
        }
    }
}
