use super::*;

const ALL: [Ease; 4] = [
    Ease::Linear,
    Ease::InOutCubic,
    Ease::SmootherStep,
    Ease::OutQuart,
];

#[test]
fn endpoints_are_stable() {
    for ease in ALL {
        assert_eq!(ease.apply(0.0), 0.0);
        assert_eq!(ease.apply(1.0), 1.0);
    }
}

#[test]
fn monotonic_spot_check() {
    for ease in ALL {
        let a = ease.apply(0.25);
        let b = ease.apply(0.5);
        let c = ease.apply(0.75);
        assert!(a < b);
        assert!(b < c);
    }
}

#[test]
fn smootherstep_is_slow_at_both_ends() {
    let e = Ease::SmootherStep;
    assert!(e.apply(0.05) < 0.01);
    assert!(e.apply(0.95) > 0.99);
    assert!((e.apply(0.5) - 0.5).abs() < 1e-12);
}

#[test]
fn out_quart_front_loads_motion() {
    let e = Ease::OutQuart;
    assert!(e.apply(0.25) > 0.6);
    assert!((e.apply(0.5) - 0.9375).abs() < 1e-12);
}

#[test]
fn out_of_range_input_is_clamped() {
    for ease in ALL {
        assert_eq!(ease.apply(-3.0), 0.0);
        assert_eq!(ease.apply(7.0), 1.0);
        assert_eq!(ease.apply(f64::NAN), 0.0);
    }
}

#[test]
fn serde_uses_snake_case() {
    let s = serde_json::to_string(&Ease::SmootherStep).unwrap();
    assert_eq!(s, "\"smoother_step\"");
    let e: Ease = serde_json::from_str("\"out_quart\"").unwrap();
    assert_eq!(e, Ease::OutQuart);
}
