use crate::effect::config::EffectConfig;
use crate::effect::ease::Ease;
use crate::foundation::math::lerp;
use crate::foundation::rng::Rng64;

/// The active segment of a zoom cycle. Level payloads index into
/// [`EffectConfig::scale_levels`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    InitialDelay,
    TransitionUp(usize),
    Hold(usize),
    ShrinkBack,
    NormalHold,
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InitialDelay => f.write_str("initial_delay"),
            Self::TransitionUp(level) => write!(f, "transition_up[{level}]"),
            Self::Hold(level) => write!(f, "hold[{level}]"),
            Self::ShrinkBack => f.write_str("shrink_back"),
            Self::NormalHold => f.write_str("normal_hold"),
        }
    }
}

/// Result of querying the clock at one timestamp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectSample {
    pub phase: CyclePhase,
    pub scale: f64,
    /// Seconds since the start of the containing cycle.
    pub cycle_elapsed: f64,
    pub cycle_index: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PhaseSpan {
    phase: CyclePhase,
    start: f64,
    end: f64,
    from: f64,
    to: f64,
    ease: Ease,
}

impl PhaseSpan {
    fn scale_at(&self, local: f64) -> f64 {
        if self.from == self.to {
            return self.to;
        }
        let len = self.end - self.start;
        let progress = if len > 0.0 { local / len } else { 1.0 };
        let (lo, hi) = if self.from < self.to {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        };
        lerp(self.from, self.to, self.ease.apply(progress)).clamp(lo, hi)
    }
}

/// Realized timing of one cycle: hold durations are drawn once, then frozen into a cumulative
/// phase table.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleState {
    index: u64,
    spans: Vec<PhaseSpan>,
}

impl CycleState {
    /// Draw cycle `index` for `config`. Identical inputs produce identical states.
    ///
    /// `config` is expected to be validated; see [`EffectConfig::validate`].
    pub fn draw(config: &EffectConfig, seed: u64, index: u64) -> Self {
        let mut rng = Rng64::for_stream(seed, index);
        let mut spans = Vec::with_capacity(config.scale_levels.len() * 2 + 3);
        let mut cursor = 0.0;
        let mut push = |phase, len: f64, from, to, ease| {
            spans.push(PhaseSpan {
                phase,
                start: cursor,
                end: cursor + len,
                from,
                to,
                ease,
            });
            cursor += len;
        };

        if index == 0 || config.repeat_initial_delay {
            push(
                CyclePhase::InitialDelay,
                config.initial_delay,
                1.0,
                1.0,
                Ease::Linear,
            );
        }

        let mut prev = 1.0;
        for (level, &target) in config.scale_levels.iter().enumerate() {
            push(
                CyclePhase::TransitionUp(level),
                config.transition_time,
                prev,
                target,
                config.transition_ease,
            );
            let hold = rng.uniform(config.min_hold_time, config.max_hold_time);
            push(CyclePhase::Hold(level), hold, target, target, Ease::Linear);
            prev = target;
        }

        push(
            CyclePhase::ShrinkBack,
            config.shrink_time,
            prev,
            1.0,
            config.shrink_ease,
        );
        let normal = rng.uniform(config.min_hold_time, config.max_hold_time);
        push(CyclePhase::NormalHold, normal, 1.0, 1.0, Ease::Linear);

        Self { index, spans }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    /// Total length of the cycle in seconds.
    pub fn duration(&self) -> f64 {
        self.spans.last().map(|s| s.end).unwrap_or(0.0)
    }

    /// Drawn hold duration for `level`, if the level exists.
    pub fn hold_duration(&self, level: usize) -> Option<f64> {
        self.spans
            .iter()
            .find(|s| s.phase == CyclePhase::Hold(level))
            .map(|s| s.end - s.start)
    }

    pub fn normal_hold_duration(&self) -> f64 {
        self.spans
            .iter()
            .find(|s| s.phase == CyclePhase::NormalHold)
            .map(|s| s.end - s.start)
            .unwrap_or(0.0)
    }

    /// `(phase, start, end)` for every phase, in order.
    pub fn phases(&self) -> impl Iterator<Item = (CyclePhase, f64, f64)> + '_ {
        self.spans.iter().map(|s| (s.phase, s.start, s.end))
    }

    /// Sample the cycle at `elapsed` seconds since its start.
    ///
    /// Phase upper edges are exclusive. Negative input samples the start; input past the end is
    /// clamped to the end of the last phase.
    pub fn sample(&self, elapsed: f64) -> EffectSample {
        let elapsed = if elapsed.is_nan() { 0.0 } else { elapsed.max(0.0) };
        let Some(last) = self.spans.last() else {
            return EffectSample {
                phase: CyclePhase::NormalHold,
                scale: 1.0,
                cycle_elapsed: elapsed,
                cycle_index: self.index,
            };
        };

        let i = self.spans.partition_point(|s| s.end <= elapsed);
        let (span, local) = match self.spans.get(i) {
            Some(span) => (span, elapsed - span.start),
            None => (last, last.end - last.start),
        };
        EffectSample {
            phase: span.phase,
            scale: span.scale_at(local),
            cycle_elapsed: elapsed,
            cycle_index: self.index,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effect/cycle.rs"]
mod tests;
