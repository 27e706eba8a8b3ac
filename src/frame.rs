use std::sync::Arc;

use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::{ComposeError, ComposeResult};

/// A tightly packed straight-alpha RGBA8 image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRGBA {
    pub fn new_solid(width: u32, height: u32, rgba: [u8; 4]) -> ComposeResult<Self> {
        let len = Canvas { width, height }.rgba_len()?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len / 4 {
            data.extend_from_slice(&rgba);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap an existing buffer, checking that its length is `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> ComposeResult<Self> {
        let expected = Canvas { width, height }.rgba_len()?;
        if data.len() != expected {
            return Err(ComposeError::validation(format!(
                "rgba buffer for {width}x{height} must be {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Whether `data` actually holds `width * height` pixels.
    pub fn is_consistent(&self) -> bool {
        self.canvas()
            .rgba_len()
            .is_ok_and(|len| len == self.data.len())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        if let Some(px) = self.data.get_mut(idx..idx + 4) {
            px.copy_from_slice(&rgba);
        }
    }
}

/// A decoded frame: pixels plus its position in the source.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub seq: FrameIndex,
    /// Presentation timestamp in seconds.
    pub pts: f64,
    pub image: FrameRGBA,
}

impl Frame {
    pub fn new(seq: u64, pts: f64, image: FrameRGBA) -> Self {
        Self {
            seq: FrameIndex(seq),
            pts,
            image,
        }
    }
}

/// Foreground frames may be paired with several background frames; they are shared read-only.
pub type SharedFrame = Arc<Frame>;

/// Composited output; carries the sequence number and timestamp of its background frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeFrame {
    pub seq: FrameIndex,
    pub pts: f64,
    pub image: FrameRGBA,
}

#[cfg(test)]
#[path = "../tests/unit/frame.rs"]
mod tests;
