use crate::composite::anchor::Anchor;
use crate::foundation::core::Canvas;
use crate::frame::FrameRGBA;
use crate::key::ChromaKeyMask;

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Region {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

pub(crate) struct Sample {
    pub rgb: [u8; 3],
    pub alpha: u8,
}

/// Inverse mapping from background pixels to foreground coordinates for a uniform scale about
/// the foreground center.
pub(crate) struct Warp {
    src: Canvas,
    inv_scale: f64,
    /// Background-space extent of the scaled source including its one-pixel bilinear fringe.
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
    ax: f64,
    ay: f64,
}

impl Warp {
    pub(crate) fn new(src: Canvas, scale: f64, anchor: Anchor) -> Self {
        let p = anchor.point();
        let half_w = (f64::from(src.width) / 2.0 + 0.5) * scale;
        let half_h = (f64::from(src.height) / 2.0 + 0.5) * scale;
        Self {
            src,
            inv_scale: 1.0 / scale,
            min_x: p.x - half_w - 0.5,
            max_x: p.x + half_w - 0.5,
            min_y: p.y - half_h - 0.5,
            max_y: p.y + half_h - 0.5,
            ax: p.x,
            ay: p.y,
        }
    }

    /// Background pixels that can receive foreground coverage, clipped to `dst`.
    pub(crate) fn covered_region(&self, dst: Canvas) -> Option<Region> {
        let clip = |lo: f64, hi: f64, len: u32| -> Option<(u32, u32)> {
            let len_f = f64::from(len);
            let a = lo.floor().clamp(0.0, len_f);
            let b = (hi.ceil() + 1.0).clamp(0.0, len_f);
            (a < b).then_some((a as u32, b as u32))
        };
        let (x0, x1) = clip(self.min_x, self.max_x, dst.width)?;
        let (y0, y1) = clip(self.min_y, self.max_y, dst.height)?;
        Some(Region { x0, y0, x1, y1 })
    }

    /// Source coordinates (pixel-center convention) for background pixel `(x, y)`.
    pub(crate) fn source_coords(&self, x: u32, y: u32) -> (f64, f64) {
        let u = (f64::from(x) + 0.5 - self.ax) * self.inv_scale + f64::from(self.src.width) / 2.0
            - 0.5;
        let v = (f64::from(y) + 0.5 - self.ay) * self.inv_scale + f64::from(self.src.height) / 2.0
            - 0.5;
        (u, v)
    }

    /// Bilinear sample of foreground color weighted by key coverage. Taps outside the source
    /// contribute zero coverage, which softens the scaled border.
    pub(crate) fn sample(
        &self,
        fg: &FrameRGBA,
        mask: &ChromaKeyMask,
        x: u32,
        y: u32,
    ) -> Option<Sample> {
        let (u, v) = self.source_coords(x, y);
        if u <= -1.0 || v <= -1.0 || u >= f64::from(self.src.width) || v >= f64::from(self.src.height)
        {
            return None;
        }
        let x0 = u.floor();
        let y0 = v.floor();
        let fx = u - x0;
        let fy = v - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let taps = [
            (x0, y0, (1.0 - fx) * (1.0 - fy)),
            (x0 + 1, y0, fx * (1.0 - fy)),
            (x0, y0 + 1, (1.0 - fx) * fy),
            (x0 + 1, y0 + 1, fx * fy),
        ];

        let mut cov = 0.0f64;
        let mut rgb = [0.0f64; 3];
        for (tx, ty, w) in taps {
            if w <= 0.0 {
                continue;
            }
            let m = mask.alpha_at(tx, ty);
            if m == 0 {
                continue;
            }
            let Some(px) = fg.pixel(tx as u32, ty as u32) else {
                continue;
            };
            let c = f64::from(m) * f64::from(px[3]) / 255.0 * w;
            cov += c;
            for i in 0..3 {
                rgb[i] += c * f64::from(px[i]);
            }
        }

        let alpha = cov.round().clamp(0.0, 255.0) as u8;
        if alpha == 0 {
            return None;
        }
        let color = |acc: f64| (acc / cov).round().clamp(0.0, 255.0) as u8;
        Some(Sample {
            rgb: [color(rgb[0]), color(rgb[1]), color(rgb[2])],
            alpha,
        })
    }
}
