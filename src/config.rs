//! Top-level JSON configuration for a compose run.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::composite::Placement;
use crate::effect::EffectConfig;
use crate::foundation::error::{ComposeError, ComposeResult};
use crate::key::KeyParams;
use crate::pipeline::SessionOpts;
use crate::subtitle::SubtitleStyle;

/// Everything a run needs besides its media. Every field is optional in JSON.
///
/// ```json
/// {
///   "effect": { "scale_levels": [1.5, 1.7, 1.8], "min_hold_time": 5.0, "max_hold_time": 8.0 },
///   "key": { "key_color": "#0000ff", "tolerance": 0.3 },
///   "placement": { "kind": "bottom_right", "margin": 24 },
///   "session": { "parallel": true, "seed": 7 }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposeConfig {
    pub effect: EffectConfig,
    pub key: KeyParams,
    pub placement: Placement,
    pub session: SessionOpts,
    /// Style for burned-in subtitles; the default style applies when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<SubtitleStyle>,
}

impl ComposeConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> ComposeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ComposeError::config(format!("open config '{}': {e}", path.display()))
        })?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            ComposeError::config(format!("parse config JSON '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> ComposeResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| ComposeError::config(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ComposeResult<()> {
        self.effect.validate()?;
        self.key.validate()?;
        self.session.validate()?;
        if let Placement::Custom { x, y } = self.placement
            && !(x.is_finite() && y.is_finite())
        {
            return Err(ComposeError::config(format!(
                "custom placement must be finite (got {x}, {y})"
            )));
        }
        if let Some(style) = &self.subtitles {
            style
                .validate()
                .map_err(|e| ComposeError::config(format!("subtitles: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/mod.rs"]
mod tests;
