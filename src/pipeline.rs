//! Staged compose pipeline.
//!
//! `decode` (thread) → `key + clock + composite` (calling thread, optional rayon pool) →
//! `encode` (thread), connected by bounded channels. The encode stage re-sequences completions
//! so the sink always sees increasing frame indices.

mod cancel;
mod pairing;
mod progress;
mod reader;
mod reorder;
mod session;

pub use cancel::CancelToken;
pub use pairing::{FgEndPolicy, FramePairer};
pub use progress::{LogProgress, Progress, ProgressReporter};
pub use reader::{ReadOutcome, RetryingReader};
pub use reorder::{ReorderBuffer, Slot};
pub use session::{ComposeSession, RunStats, SessionOpts};
