//! Progressive zoom effect.
//!
//! The effect is a pure function of elapsed time: [`EffectConfig`] describes the levels and
//! durations, [`CycleState`] freezes the randomized hold durations of one cycle, and
//! [`EffectTimeline`] chains cycles so any timestamp of a run maps to exactly one
//! [`EffectSample`].

mod clock;
mod config;
mod cycle;
mod ease;

pub use clock::EffectTimeline;
pub use config::EffectConfig;
pub use cycle::{CyclePhase, CycleState, EffectSample};
pub use ease::Ease;
