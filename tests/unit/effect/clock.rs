use super::*;
use crate::effect::CyclePhase;

fn timeline(horizon: f64) -> EffectTimeline {
    EffectTimeline::new(EffectConfig::default(), 42, horizon).unwrap()
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = EffectConfig {
        scale_levels: vec![],
        ..EffectConfig::default()
    };
    assert!(EffectTimeline::new(cfg, 0, 10.0).is_err());
}

#[test]
fn predraws_cycles_past_horizon() {
    let tl = timeline(120.0);
    assert!(tl.horizon_end() > 120.0);
    assert!(tl.cycles().len() >= 2);
    for (i, c) in tl.cycles().iter().enumerate() {
        assert_eq!(c.index(), i as u64);
    }
}

#[test]
fn cycle_boundaries_belong_to_next_cycle() {
    let tl = timeline(120.0);
    let first_len = tl.cycles()[0].duration();
    let s = tl.sample(first_len);
    assert_eq!(s.cycle_index, 1);
    assert_eq!(s.phase, CyclePhase::TransitionUp(0));
    assert_eq!(s.scale, 1.0);
    assert_eq!(s.cycle_elapsed, 0.0);

    let before = tl.sample(first_len - 1e-6);
    assert_eq!(before.cycle_index, 0);
    assert_eq!(before.phase, CyclePhase::NormalHold);
}

#[test]
fn sampling_beyond_horizon_matches_a_larger_timeline() {
    let small = timeline(1.0);
    let large = timeline(500.0);
    for t in [10.0, 55.5, 130.25, 260.0, 480.0] {
        assert_eq!(small.sample(t), large.sample(t), "t={t}");
    }
}

#[test]
fn negative_elapsed_is_start() {
    let tl = timeline(10.0);
    let s = tl.sample(-1.0);
    assert_eq!(s.cycle_index, 0);
    assert_eq!(s.phase, CyclePhase::InitialDelay);
}

#[test]
fn zero_horizon_still_samples() {
    let tl = timeline(0.0);
    assert_eq!(tl.cycles().len(), 1);
    assert_eq!(tl.sample(0.0).phase, CyclePhase::InitialDelay);
}
