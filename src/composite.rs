//! Scaled picture-in-picture compositing.
//!
//! The foreground and its key mask are scaled about the foreground center by inverse mapping
//! with bilinear sampling, then blended onto the background around an [`Anchor`]. Only the part
//! of the scaled foreground that overlaps the background is visited.

mod anchor;
mod blend;
mod warp;

pub use anchor::{Anchor, Placement};

use crate::foundation::error::{ComposeError, ComposeResult};
use crate::frame::{CompositeFrame, Frame, FrameRGBA};
use crate::key::ChromaKeyMask;

/// Composite `foreground`, keyed by `mask` and scaled by `scale`, onto `background`.
///
/// The background buffer is reused as the output, so the result always has the background's
/// dimensions, sequence number and timestamp.
pub fn composite(
    background: Frame,
    foreground: &FrameRGBA,
    mask: &ChromaKeyMask,
    scale: f64,
    anchor: Anchor,
) -> ComposeResult<CompositeFrame> {
    let seq = background.seq.0;
    if !background.image.is_consistent() {
        return Err(ComposeError::dimension_mismatch(
            seq,
            format!(
                "background buffer holds {} bytes for {}",
                background.image.data.len(),
                background.image.canvas()
            ),
        ));
    }
    if !foreground.is_consistent() {
        return Err(ComposeError::dimension_mismatch(
            seq,
            format!(
                "foreground buffer holds {} bytes for {}",
                foreground.data.len(),
                foreground.canvas()
            ),
        ));
    }
    if mask.canvas() != foreground.canvas() || mask.alpha.len() != mask.canvas().pixel_count() {
        return Err(ComposeError::dimension_mismatch(
            seq,
            format!(
                "mask is {} but foreground is {}",
                mask.canvas(),
                foreground.canvas()
            ),
        ));
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ComposeError::validation(format!(
            "composite scale must be finite and > 0 (got {scale})"
        )));
    }

    let Frame { seq, pts, mut image } = background;
    if mask.uniform_value() != Some(0) {
        let warp = warp::Warp::new(foreground.canvas(), scale, anchor);
        if let Some(region) = warp.covered_region(image.canvas()) {
            let stride = image.width as usize;
            for y in region.y0..region.y1 {
                for x in region.x0..region.x1 {
                    let Some(sample) = warp.sample(foreground, mask, x, y) else {
                        continue;
                    };
                    let idx = ((y as usize) * stride + (x as usize)) * 4;
                    blend::blend_pixel(&mut image.data[idx..idx + 4], sample.rgb, sample.alpha);
                }
            }
        }
    }

    Ok(CompositeFrame { seq, pts, image })
}

#[cfg(test)]
#[path = "../tests/unit/composite/mod.rs"]
mod tests;
