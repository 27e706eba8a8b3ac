use crate::foundation::math::mul_div255;

/// Blend straight-alpha `rgb` with coverage `alpha` over the RGBA8 pixel `dst`.
///
/// `alpha == 0` leaves `dst` untouched; `alpha == 255` writes `rgb` exactly.
pub(crate) fn blend_pixel(dst: &mut [u8], rgb: [u8; 3], alpha: u8) {
    if alpha == 0 {
        return;
    }
    let a = u16::from(alpha);
    let inv = 255 - a;
    for c in 0..3 {
        let bg = mul_div255(u16::from(dst[c]), inv);
        let fg = mul_div255(u16::from(rgb[c]), a);
        dst[c] = bg.saturating_add(fg);
    }
    dst[3] = alpha.saturating_add(mul_div255(u16::from(dst[3]), inv));
}
