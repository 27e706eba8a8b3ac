use crate::frame::FrameRGBA;
use crate::foundation::error::{ComposeError, ComposeResult};

/// Brightness below which chroma is attenuated.
const MIN_VALUE: f32 = 0.2;

const SQRT3_2: f32 = 0.866_025_4;

/// Opaque RGB key color. Serialized as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl KeyColor {
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const GREEN: Self = Self::rgb(0, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `0xRRGGBB`, `#RRGGBB`, `RRGGBB`, or the names `blue` / `green`.
    pub fn parse(s: &str) -> ComposeResult<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "blue" => return Ok(Self::BLUE),
            "green" => return Ok(Self::GREEN),
            _ => {}
        }
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .or_else(|| s.strip_prefix('#'))
            .unwrap_or(s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ComposeError::config(format!(
                "invalid key color '{s}' (expected 0xRRGGBB, #RRGGBB, blue or green)"
            )));
        }
        let v = u32::from_str_radix(hex, 16)
            .map_err(|e| ComposeError::config(format!("invalid key color '{s}': {e}")))?;
        Ok(Self::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Projection onto the hue/chroma plane.
    pub(crate) fn chroma_point(self) -> (f32, f32) {
        chroma_point(self.r, self.g, self.b)
    }
}

impl Default for KeyColor {
    fn default() -> Self {
        Self::BLUE
    }
}

impl TryFrom<String> for KeyColor {
    type Error = ComposeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<KeyColor> for String {
    fn from(c: KeyColor) -> Self {
        c.to_hex()
    }
}

impl std::fmt::Display for KeyColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hexagonal hue/saturation coordinates of an RGB triple. The channels are divided by the
/// brightest one first, so a shaded screen lands on the same point as a lit one: the point's
/// distance from the origin is the saturation, its angle the hue.
///
/// Pixels darker than `MIN_VALUE` are normalized by `MIN_VALUE` instead, shrinking them toward
/// the achromatic origin so sensor noise in near-black areas is not keyed.
pub(crate) fn chroma_point(r: u8, g: u8, b: u8) -> (f32, f32) {
    let r = f32::from(r) / 255.0;
    let g = f32::from(g) / 255.0;
    let b = f32::from(b) / 255.0;
    let v = r.max(g).max(b).max(MIN_VALUE);
    let (r, g, b) = (r / v, g / v, b / v);
    (r - 0.5 * (g + b), SQRT3_2 * (g - b))
}

/// Estimate the screen color by averaging the midpoints of the four edges, each `margin` pixels
/// in from its border. The margin is reduced for frames too small to honor it.
pub fn sample_key_color(frame: &FrameRGBA, margin: u32) -> ComposeResult<KeyColor> {
    if frame.width == 0 || frame.height == 0 || !frame.is_consistent() {
        return Err(ComposeError::validation(format!(
            "cannot sample key color from a {}x{} frame with {} bytes",
            frame.width,
            frame.height,
            frame.data.len()
        )));
    }
    let mx = margin.min((frame.width - 1) / 2);
    let my = margin.min((frame.height - 1) / 2);
    let (cx, cy) = (frame.width / 2, frame.height / 2);
    let points = [
        (cx, my),
        (cx, frame.height - 1 - my),
        (mx, cy),
        (frame.width - 1 - mx, cy),
    ];

    let mut sum = [0u32; 3];
    for (x, y) in points {
        let px = frame
            .pixel(x, y)
            .ok_or_else(|| ComposeError::validation("key sample point out of bounds"))?;
        for c in 0..3 {
            sum[c] += u32::from(px[c]);
        }
    }
    let avg = |v: u32| ((v + 2) / 4) as u8;
    let color = KeyColor::rgb(avg(sum[0]), avg(sum[1]), avg(sum[2]));
    tracing::debug!(key_color = %color, margin, "sampled key color");
    Ok(color)
}

#[cfg(test)]
#[path = "../../tests/unit/key/color.rs"]
mod tests;
