use crate::foundation::core::{Canvas, Point};

/// Where the center of the scaled foreground lands, in background pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor(pub Point);

impl Anchor {
    pub fn at(x: f64, y: f64) -> Self {
        Self(Point::new(x, y))
    }

    /// The geometric center of `canvas`.
    pub fn centered(canvas: Canvas) -> Self {
        Self::at(f64::from(canvas.width) / 2.0, f64::from(canvas.height) / 2.0)
    }

    pub fn point(self) -> Point {
        self.0
    }
}

/// Placement presets, resolved per run against the background and foreground sizes.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Placement {
    /// Unscaled foreground centered on the background, snapped to whole pixels.
    Center,
    /// Unscaled foreground in the bottom-right corner, `margin` pixels from both edges.
    BottomRight { margin: u32 },
    /// Explicit anchor point.
    Custom { x: f64, y: f64 },
}

impl Default for Placement {
    fn default() -> Self {
        Self::Center
    }
}

impl Placement {
    pub fn resolve(self, background: Canvas, foreground: Canvas) -> Anchor {
        let (bw, bh) = (i64::from(background.width), i64::from(background.height));
        let (fw, fh) = (i64::from(foreground.width), i64::from(foreground.height));
        let half_w = f64::from(foreground.width) / 2.0;
        let half_h = f64::from(foreground.height) / 2.0;
        match self {
            Self::Center => {
                // Whole-pixel top-left keeps scale 1.0 free of resampling blur.
                let left = (bw - fw).div_euclid(2);
                let top = (bh - fh).div_euclid(2);
                Anchor::at(left as f64 + half_w, top as f64 + half_h)
            }
            Self::BottomRight { margin } => {
                let m = i64::from(margin);
                Anchor::at((bw - m - fw) as f64 + half_w, (bh - m - fh) as f64 + half_h)
            }
            Self::Custom { x, y } => Anchor::at(x, y),
        }
    }
}
