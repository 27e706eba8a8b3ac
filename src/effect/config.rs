use crate::effect::ease::Ease;
use crate::foundation::error::{ComposeError, ComposeResult};

/// Immutable parameters of the zoom effect. Times are in seconds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectConfig {
    /// Zoom levels visited in order, strictly increasing, each `>= 1.0`.
    pub scale_levels: Vec<f64>,
    pub transition_time: f64,
    pub shrink_time: f64,
    pub min_hold_time: f64,
    pub max_hold_time: f64,
    pub initial_delay: f64,
    /// Re-run the initial delay at the start of every cycle instead of only the first.
    pub repeat_initial_delay: bool,
    pub transition_ease: Ease,
    pub shrink_ease: Ease,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            scale_levels: vec![1.5, 1.7, 1.8],
            transition_time: 2.0,
            shrink_time: 0.3,
            min_hold_time: 5.0,
            max_hold_time: 8.0,
            initial_delay: 3.0,
            repeat_initial_delay: false,
            transition_ease: Ease::SmootherStep,
            shrink_ease: Ease::OutQuart,
        }
    }
}

impl EffectConfig {
    pub fn validate(&self) -> ComposeResult<()> {
        if self.scale_levels.is_empty() {
            return Err(ComposeError::config("scale_levels must not be empty"));
        }
        for (i, &level) in self.scale_levels.iter().enumerate() {
            if !level.is_finite() || level < 1.0 {
                return Err(ComposeError::config(format!(
                    "scale_levels[{i}] must be finite and >= 1.0 (got {level})"
                )));
            }
        }
        if let Some(i) = self
            .scale_levels
            .windows(2)
            .position(|pair| pair[1] <= pair[0])
        {
            return Err(ComposeError::config(format!(
                "scale_levels must be strictly increasing (levels[{}] = {} is not above {})",
                i + 1,
                self.scale_levels[i + 1],
                self.scale_levels[i]
            )));
        }

        for (name, value) in [
            ("transition_time", self.transition_time),
            ("shrink_time", self.shrink_time),
            ("min_hold_time", self.min_hold_time),
            ("max_hold_time", self.max_hold_time),
            ("initial_delay", self.initial_delay),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ComposeError::config(format!(
                    "{name} must be finite and > 0 (got {value})"
                )));
            }
        }
        if self.max_hold_time < self.min_hold_time {
            return Err(ComposeError::config(format!(
                "max_hold_time ({}) must be >= min_hold_time ({})",
                self.max_hold_time, self.min_hold_time
            )));
        }
        Ok(())
    }

    /// Largest zoom level; the upper bound of every sampled scale.
    pub fn max_scale(&self) -> f64 {
        self.scale_levels.last().copied().unwrap_or(1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effect/config.rs"]
mod tests;
