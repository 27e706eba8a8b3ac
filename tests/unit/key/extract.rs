use super::*;

fn frame(width: u32, height: u32, rgba: [u8; 4]) -> Frame {
    Frame::new(0, 0.0, FrameRGBA::new_solid(width, height, rgba).unwrap())
}

#[test]
fn all_key_frame_yields_empty_mask() {
    let mask = extract(&frame(16, 9, [0, 0, 255, 255]), KeyColor::BLUE, 0.3).unwrap();
    assert_eq!((mask.width, mask.height), (16, 9));
    assert_eq!(mask.uniform_value(), Some(0));
}

#[test]
fn shaded_screen_is_still_keyed() {
    // Brightness variance along the blue axis stays near the key in the chroma plane.
    let mask = extract(&frame(4, 4, [20, 30, 235, 255]), KeyColor::BLUE, 0.3).unwrap();
    assert_eq!(mask.uniform_value(), Some(0));
}

#[test]
fn dim_screen_is_still_keyed() {
    for rgba in [[0, 0, 128, 255], [0, 0, 100, 255], [8, 12, 90, 255]] {
        let mask = extract(&frame(4, 4, rgba), KeyColor::BLUE, 0.3).unwrap();
        assert_eq!(mask.uniform_value(), Some(0), "{rgba:?}");
    }
}

#[test]
fn dark_navy_subject_is_kept() {
    let mask = extract(&frame(4, 4, [20, 20, 40, 255]), KeyColor::BLUE, 0.3).unwrap();
    assert_eq!(mask.uniform_value(), Some(255));
}

#[test]
fn non_key_frames_yield_full_mask() {
    for rgba in [[255, 255, 255, 255], [0, 0, 0, 255], [220, 160, 120, 255], [255, 0, 0, 255]] {
        let mask = extract(&frame(5, 5, rgba), KeyColor::BLUE, 0.3).unwrap();
        assert_eq!(mask.uniform_value(), Some(255), "{rgba:?}");
    }
}

#[test]
fn green_key_keeps_blue_subjects() {
    let keyer = ChromaKeyer::new(KeyParams {
        key_color: KeyColor::GREEN,
        ..KeyParams::default()
    })
    .unwrap();
    let f = frame(3, 3, [0, 0, 255, 255]);
    assert_eq!(keyer.extract(&f).unwrap().uniform_value(), Some(255));
    let g = frame(3, 3, [10, 240, 10, 255]);
    assert_eq!(keyer.extract(&g).unwrap().uniform_value(), Some(0));
}

#[test]
fn softness_band_is_linear() {
    assert_eq!(coverage(0.1, 0.3, 0.2), 0);
    assert_eq!(coverage(0.3, 0.3, 0.2), 0);
    let mid = coverage(0.4, 0.3, 0.2);
    assert!((126..=129).contains(&mid), "{mid}");
    assert_eq!(coverage(0.6, 0.3, 0.2), 255);
    assert_eq!(coverage(0.31, 0.3, 0.0), 255);
}

#[test]
fn subject_edge_is_feathered() {
    let mut image = FrameRGBA::new_solid(12, 1, [0, 0, 255, 255]).unwrap();
    for x in 6..12 {
        image.set_pixel(x, 0, [255, 255, 255, 255]);
    }
    let keyer = ChromaKeyer::new(KeyParams {
        feather_radius: 2,
        ..KeyParams::default()
    })
    .unwrap();
    let mask = keyer.extract_image(&image, 0).unwrap();
    assert_eq!(mask.alpha[0], 0);
    assert_eq!(mask.alpha[11], 255);
    assert!(mask.alpha[5] > 0 && mask.alpha[5] < 255);
    assert!(mask.alpha[6] > 0 && mask.alpha[6] < 255);
}

#[test]
fn bad_buffer_is_dimension_mismatch() {
    let f = Frame {
        seq: crate::foundation::core::FrameIndex(7),
        pts: 0.0,
        image: FrameRGBA {
            width: 4,
            height: 4,
            data: vec![0; 12],
        },
    };
    let err = extract(&f, KeyColor::BLUE, 0.3).unwrap_err();
    assert!(matches!(err, ComposeError::DimensionMismatch { seq: 7, .. }));
}

#[test]
fn auto_sample_resolves_key_color() {
    let params = KeyParams {
        key_color: KeyColor::BLUE,
        auto_sample_margin: Some(2),
        ..KeyParams::default()
    };
    let first = FrameRGBA::new_solid(10, 10, [0, 200, 0, 255]).unwrap();
    let resolved = params.resolved_for(&first).unwrap();
    assert_eq!(resolved.key_color, KeyColor::rgb(0, 200, 0));
    assert_eq!(resolved.auto_sample_margin, None);
}

#[test]
fn invalid_params_are_rejected() {
    let bad = KeyParams {
        tolerance: -0.1,
        ..KeyParams::default()
    };
    assert!(matches!(ChromaKeyer::new(bad), Err(ComposeError::Config(_))));
}

#[test]
fn mask_reads_zero_outside() {
    let m = ChromaKeyMask::filled(2, 2, 255);
    assert_eq!(m.alpha_at(1, 1), 255);
    assert_eq!(m.alpha_at(-1, 0), 0);
    assert_eq!(m.alpha_at(0, 2), 0);
}
