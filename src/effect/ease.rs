/// Easing curves mapping normalized progress to normalized output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    /// Cubic ease-in/out.
    InOutCubic,
    /// `t³(6t² − 15t + 10)`: zero velocity and acceleration at both ends.
    SmootherStep,
    /// Quartic ease-out `1 − (1 − t)⁴`: fast start, smooth settle.
    OutQuart,
}

impl Ease {
    /// Apply this easing function to normalized progress `t`, clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::SmootherStep => t * t * t * (t * (6.0 * t - 15.0) + 10.0),
            Self::OutQuart => 1.0 - (1.0 - t).powi(4),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effect/ease.rs"]
mod tests;
