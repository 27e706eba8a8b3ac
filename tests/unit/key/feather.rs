use super::*;

#[test]
fn radius_zero_is_identity() {
    let src = vec![0u8, 255, 17, 90];
    assert_eq!(feather_mask(&src, 2, 2, 0).unwrap(), src);
}

#[test]
fn uniform_masks_stay_uniform() {
    for v in [0u8, 128, 255] {
        let src = vec![v; 7 * 5];
        assert_eq!(feather_mask(&src, 7, 5, 3).unwrap(), src);
    }
}

#[test]
fn hard_edge_becomes_a_ramp() {
    let (w, h) = (9u32, 1u32);
    let src: Vec<u8> = (0..w).map(|x| if x < 4 { 0 } else { 255 }).collect();
    let out = feather_mask(&src, w, h, 2).unwrap();
    assert_eq!(out[0], 0);
    assert_eq!(out[8], 255);
    assert!(out[3] > 0 && out[3] < 128);
    assert!(out[4] > 128 && out[4] < 255);
    assert!(out.windows(2).all(|p| p[0] <= p[1]));
}

#[test]
fn kernel_sums_to_one_in_q16() {
    for r in 1..6 {
        let k = gaussian_kernel_q16(r, r as f64 * 0.5 + 0.5).unwrap();
        assert_eq!(k.len(), (2 * r + 1) as usize);
        assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
    }
}

#[test]
fn length_mismatch_is_rejected() {
    assert!(feather_mask(&[0u8; 5], 2, 2, 1).is_err());
}
