use crate::foundation::core::Canvas;
use crate::foundation::error::{ComposeError, ComposeResult};
use crate::frame::{Frame, FrameRGBA};
use crate::key::color::{KeyColor, chroma_point, sample_key_color};
use crate::key::feather::feather_mask;

/// Chroma key options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyParams {
    pub key_color: KeyColor,
    /// Hue/chroma distance at or below which a pixel is fully keyed out.
    pub tolerance: f32,
    /// Width of the linear ramp above `tolerance`; 0 gives a hard edge.
    pub softness: f32,
    /// Gaussian feather radius in pixels; 0 disables feathering.
    pub feather_radius: u32,
    /// When set, the key color is sampled from the first foreground frame at this edge margin
    /// instead of using `key_color`.
    pub auto_sample_margin: Option<u32>,
}

impl Default for KeyParams {
    fn default() -> Self {
        Self {
            key_color: KeyColor::BLUE,
            tolerance: 0.3,
            softness: 0.2,
            feather_radius: 1,
            auto_sample_margin: None,
        }
    }
}

impl KeyParams {
    pub fn validate(&self) -> ComposeResult<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ComposeError::config(format!(
                "key tolerance must be finite and >= 0 (got {})",
                self.tolerance
            )));
        }
        if !self.softness.is_finite() || self.softness < 0.0 {
            return Err(ComposeError::config(format!(
                "key softness must be finite and >= 0 (got {})",
                self.softness
            )));
        }
        if self.feather_radius > 64 {
            return Err(ComposeError::config(format!(
                "feather_radius must be <= 64 (got {})",
                self.feather_radius
            )));
        }
        Ok(())
    }

    /// Resolve `auto_sample_margin` against the first foreground frame.
    pub fn resolved_for(&self, first: &FrameRGBA) -> ComposeResult<Self> {
        match self.auto_sample_margin {
            Some(margin) => Ok(Self {
                key_color: sample_key_color(first, margin)?,
                auto_sample_margin: None,
                ..self.clone()
            }),
            None => Ok(self.clone()),
        }
    }
}

/// Per-pixel foreground coverage: 0 = background (keyed out), 255 = foreground.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChromaKeyMask {
    pub width: u32,
    pub height: u32,
    pub alpha: Vec<u8>,
}

impl ChromaKeyMask {
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            alpha: vec![value; Canvas { width, height }.pixel_count()],
        }
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Coverage at `(x, y)`; 0 outside the mask.
    pub fn alpha_at(&self, x: i64, y: i64) -> u8 {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return 0;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.alpha.get(idx).copied().unwrap_or(0)
    }

    /// `Some(v)` when every pixel has coverage `v`.
    pub fn uniform_value(&self) -> Option<u8> {
        let first = *self.alpha.first()?;
        self.alpha.iter().all(|&a| a == first).then_some(first)
    }
}

/// Reusable extractor. Holds only precomputed key geometry, so one instance is shared by all
/// workers of a run.
#[derive(Clone, Debug)]
pub struct ChromaKeyer {
    params: KeyParams,
    key_point: (f32, f32),
}

impl ChromaKeyer {
    pub fn new(params: KeyParams) -> ComposeResult<Self> {
        params.validate()?;
        let key_point = params.key_color.chroma_point();
        Ok(Self { params, key_point })
    }

    pub fn params(&self) -> &KeyParams {
        &self.params
    }

    pub fn extract(&self, frame: &Frame) -> ComposeResult<ChromaKeyMask> {
        self.extract_image(&frame.image, frame.seq.0)
    }

    /// Key `image`; `seq` only labels errors.
    pub fn extract_image(&self, image: &FrameRGBA, seq: u64) -> ComposeResult<ChromaKeyMask> {
        if !image.is_consistent() {
            return Err(ComposeError::dimension_mismatch(
                seq,
                format!(
                    "foreground buffer holds {} bytes, {}x{} needs {}",
                    image.data.len(),
                    image.width,
                    image.height,
                    image.canvas().pixel_count() * 4
                ),
            ));
        }

        let (ka, kb) = self.key_point;
        let tol = self.params.tolerance;
        let soft = self.params.softness;
        let alpha: Vec<u8> = image
            .data
            .chunks_exact(4)
            .map(|px| {
                let (a, b) = chroma_point(px[0], px[1], px[2]);
                let d = ((a - ka).powi(2) + (b - kb).powi(2)).sqrt();
                coverage(d, tol, soft)
            })
            .collect();

        let alpha = feather_mask(&alpha, image.width, image.height, self.params.feather_radius)?;
        Ok(ChromaKeyMask {
            width: image.width,
            height: image.height,
            alpha,
        })
    }
}

fn coverage(distance: f32, tolerance: f32, softness: f32) -> u8 {
    if distance <= tolerance {
        0
    } else if distance >= tolerance + softness {
        255
    } else {
        crate::foundation::math::unit_to_u8((distance - tolerance) / softness)
    }
}

/// Key `frame` against `key_color` with default softness and feathering.
pub fn extract(frame: &Frame, key_color: KeyColor, tolerance: f32) -> ComposeResult<ChromaKeyMask> {
    ChromaKeyer::new(KeyParams {
        key_color,
        tolerance,
        ..KeyParams::default()
    })?
    .extract(frame)
}

#[cfg(test)]
#[path = "../../tests/unit/key/extract.rs"]
mod tests;
