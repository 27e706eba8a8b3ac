use super::*;

fn scenario() -> EffectConfig {
    EffectConfig {
        scale_levels: vec![1.5, 1.7, 1.8],
        transition_time: 2.0,
        shrink_time: 0.3,
        min_hold_time: 5.0,
        max_hold_time: 8.0,
        initial_delay: 3.0,
        ..EffectConfig::default()
    }
}

#[test]
fn first_cycle_phase_order() {
    let cycle = CycleState::draw(&scenario(), 1, 0);
    let phases: Vec<CyclePhase> = cycle.phases().map(|(p, _, _)| p).collect();
    assert_eq!(
        phases,
        vec![
            CyclePhase::InitialDelay,
            CyclePhase::TransitionUp(0),
            CyclePhase::Hold(0),
            CyclePhase::TransitionUp(1),
            CyclePhase::Hold(1),
            CyclePhase::TransitionUp(2),
            CyclePhase::Hold(2),
            CyclePhase::ShrinkBack,
            CyclePhase::NormalHold,
        ]
    );
}

#[test]
fn later_cycles_skip_initial_delay_unless_repeated() {
    let cfg = scenario();
    let c1 = CycleState::draw(&cfg, 1, 1);
    assert_eq!(c1.phases().next().map(|p| p.0), Some(CyclePhase::TransitionUp(0)));

    let cfg = EffectConfig {
        repeat_initial_delay: true,
        ..cfg
    };
    let c1 = CycleState::draw(&cfg, 1, 1);
    assert_eq!(c1.phases().next().map(|p| p.0), Some(CyclePhase::InitialDelay));
}

#[test]
fn phase_table_has_no_gaps_or_overlaps() {
    let cycle = CycleState::draw(&scenario(), 99, 0);
    let mut prev_end = 0.0;
    for (_, start, end) in cycle.phases() {
        assert_eq!(start, prev_end);
        assert!(end > start);
        prev_end = end;
    }
    assert_eq!(prev_end, cycle.duration());
}

#[test]
fn holds_are_drawn_within_range() {
    let cfg = scenario();
    for index in 0..20 {
        let cycle = CycleState::draw(&cfg, 5, index);
        for level in 0..3 {
            let h = cycle.hold_duration(level).unwrap();
            assert!((5.0..=8.0).contains(&h), "hold {h}");
        }
        assert!((5.0..=8.0).contains(&cycle.normal_hold_duration()));
    }
    assert_eq!(CycleState::draw(&cfg, 5, 0).hold_duration(3), None);
}

#[test]
fn draw_is_deterministic_per_seed_and_index() {
    let cfg = scenario();
    assert_eq!(CycleState::draw(&cfg, 7, 3), CycleState::draw(&cfg, 7, 3));
    assert_ne!(CycleState::draw(&cfg, 7, 3), CycleState::draw(&cfg, 8, 3));
}

#[test]
fn scenario_timestamps() {
    let cycle = CycleState::draw(&scenario(), 42, 0);

    let s = cycle.sample(0.0);
    assert_eq!(s.phase, CyclePhase::InitialDelay);
    assert_eq!(s.scale, 1.0);

    let s = cycle.sample(3.0);
    assert_eq!(s.phase, CyclePhase::TransitionUp(0));
    assert!((s.scale - 1.0).abs() < 1e-9);

    let s = cycle.sample(5.0);
    assert_eq!(s.phase, CyclePhase::Hold(0));
    assert!((s.scale - 1.5).abs() < 1e-9);

    // Midpoint of the first transition under smootherstep is the arithmetic midpoint.
    let s = cycle.sample(4.0);
    assert!((s.scale - 1.25).abs() < 1e-9);
}

#[test]
fn transitions_land_exactly_on_levels() {
    let cfg = scenario();
    let cycle = CycleState::draw(&cfg, 3, 0);
    for (phase, _, end) in cycle.phases().collect::<Vec<_>>() {
        let just_before = cycle.sample(end - 1e-9);
        assert_eq!(just_before.phase, phase);
        match phase {
            CyclePhase::TransitionUp(level) => {
                assert!((just_before.scale - cfg.scale_levels[level]).abs() < 1e-6);
            }
            CyclePhase::ShrinkBack => assert!((just_before.scale - 1.0).abs() < 1e-6),
            _ => {}
        }
    }
}

#[test]
fn shrink_back_starts_at_top_level() {
    let cycle = CycleState::draw(&scenario(), 3, 0);
    let (_, start, _) = cycle
        .phases()
        .find(|(p, _, _)| *p == CyclePhase::ShrinkBack)
        .unwrap();
    let s = cycle.sample(start);
    assert_eq!(s.phase, CyclePhase::ShrinkBack);
    assert_eq!(s.scale, 1.8);
}

#[test]
fn out_of_range_elapsed_is_clamped() {
    let cycle = CycleState::draw(&scenario(), 3, 0);
    assert_eq!(cycle.sample(-4.0).phase, CyclePhase::InitialDelay);
    let end = cycle.sample(cycle.duration() + 100.0);
    assert_eq!(end.phase, CyclePhase::NormalHold);
    assert_eq!(end.scale, 1.0);
}

#[test]
fn scale_stays_in_bounds_and_sampling_is_idempotent() {
    let cycle = CycleState::draw(&scenario(), 11, 0);
    let mut t = 0.0;
    while t < cycle.duration() {
        let a = cycle.sample(t);
        assert!(a.scale >= 1.0 && a.scale <= 1.8, "t={t} scale={}", a.scale);
        assert_eq!(a, cycle.sample(t));
        t += 0.01;
    }
}

#[test]
fn phase_display_labels() {
    assert_eq!(CyclePhase::InitialDelay.to_string(), "initial_delay");
    assert_eq!(CyclePhase::TransitionUp(0).to_string(), "transition_up[0]");
    assert_eq!(CyclePhase::Hold(2).to_string(), "hold[2]");
    assert_eq!(CyclePhase::ShrinkBack.to_string(), "shrink_back");
    assert_eq!(CyclePhase::NormalHold.to_string(), "normal_hold");
}
