use crate::effect::config::EffectConfig;
use crate::effect::cycle::{CycleState, EffectSample};
use crate::foundation::error::ComposeResult;

/// Chain of cycles covering a run. Immutable once built; share it by reference across workers.
#[derive(Clone, Debug)]
pub struct EffectTimeline {
    config: EffectConfig,
    seed: u64,
    /// Start offset of each pre-drawn cycle, strictly increasing.
    starts: Vec<f64>,
    cycles: Vec<CycleState>,
}

impl EffectTimeline {
    /// Validate `config` and pre-draw the cycles covering `[0, horizon)`.
    pub fn new(config: EffectConfig, seed: u64, horizon: f64) -> ComposeResult<Self> {
        config.validate()?;
        let horizon = if horizon.is_finite() { horizon.max(0.0) } else { 0.0 };

        let mut starts = Vec::new();
        let mut cycles = Vec::new();
        let mut offset = 0.0;
        loop {
            let cycle = CycleState::draw(&config, seed, cycles.len() as u64);
            let len = cycle.duration();
            starts.push(offset);
            cycles.push(cycle);
            offset += len;
            if offset > horizon {
                break;
            }
        }
        tracing::debug!(
            cycles = cycles.len(),
            horizon,
            seed,
            "effect timeline drawn"
        );

        Ok(Self {
            config,
            seed,
            starts,
            cycles,
        })
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Pre-drawn cycles, in order.
    pub fn cycles(&self) -> &[CycleState] {
        &self.cycles
    }

    /// End of the pre-drawn range in seconds.
    pub fn horizon_end(&self) -> f64 {
        match (self.starts.last(), self.cycles.last()) {
            (Some(start), Some(cycle)) => start + cycle.duration(),
            _ => 0.0,
        }
    }

    /// Sample the effect at `elapsed` seconds since the first background frame.
    pub fn sample(&self, elapsed: f64) -> EffectSample {
        let elapsed = if elapsed.is_nan() { 0.0 } else { elapsed.max(0.0) };

        let end = self.horizon_end();
        if elapsed >= end {
            return self.sample_beyond(end, elapsed);
        }

        // Last cycle whose start is <= elapsed.
        let i = self
            .starts
            .partition_point(|&start| start <= elapsed)
            .saturating_sub(1);
        self.cycles[i].sample(elapsed - self.starts[i])
    }

    /// Redraws cycles forward from the horizon on every call, so cost grows with the distance
    /// past it. Size the horizon to cover the run.
    fn sample_beyond(&self, mut offset: f64, elapsed: f64) -> EffectSample {
        let mut index = self.cycles.len() as u64;
        loop {
            let cycle = CycleState::draw(&self.config, self.seed, index);
            let len = cycle.duration();
            if elapsed < offset + len || len <= 0.0 {
                return cycle.sample(elapsed - offset);
            }
            offset += len;
            index += 1;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effect/clock.rs"]
mod tests;
