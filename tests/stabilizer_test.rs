//! Hysteresis and stabilizer behavior tests

use face_capture_pipeline::{
    config::StabilizerConfig,
    stabilizer::{hysteresis::HysteresisGate, RawSignals, Stabilizer},
};
use proptest::prelude::*;

const ALL_GOOD: RawSignals = RawSignals {
    face: true,
    alignment: true,
    lighting: true,
};

fn longest_run(readings: &[bool], value: bool) -> usize {
    readings
        .split(|r| *r != value)
        .map(<[bool]>::len)
        .max()
        .unwrap_or(0)
}

#[test]
fn test_turns_on_after_exactly_on_threshold() {
    let mut stabilizer = Stabilizer::default();
    for tick in 1..=4 {
        let signals = stabilizer.update(ALL_GOOD);
        assert!(!signals.face, "face on too early at tick {tick}");
    }
    assert!(stabilizer.update(ALL_GOOD).all_ready());
}

#[test]
fn test_turns_off_after_exactly_off_threshold() {
    let mut stabilizer = Stabilizer::default();
    for _ in 0..5 {
        stabilizer.update(ALL_GOOD);
    }

    let dim = RawSignals {
        lighting: false,
        ..ALL_GOOD
    };
    assert!(stabilizer.update(dim).lighting);
    assert!(stabilizer.update(dim).lighting);
    let signals = stabilizer.update(dim);
    assert!(!signals.lighting);
    assert!(signals.face && signals.alignment);
}

#[test]
fn test_single_glitch_does_not_flicker() {
    let mut stabilizer = Stabilizer::default();
    for _ in 0..5 {
        stabilizer.update(ALL_GOOD);
    }
    // Alternating readings never reach either threshold
    for i in 0..40 {
        let raw = RawSignals {
            alignment: i % 2 == 0,
            ..ALL_GOOD
        };
        assert!(stabilizer.update(raw).alignment);
    }
}

#[test]
fn test_face_loss_forces_dependents_off() {
    let mut stabilizer = Stabilizer::default();
    for _ in 0..5 {
        stabilizer.update(ALL_GOOD);
    }

    // A lost face still reports stale alignment and lighting as true
    let ghost = RawSignals {
        face: false,
        ..ALL_GOOD
    };
    stabilizer.update(ghost);
    stabilizer.update(ghost);
    let signals = stabilizer.update(ghost);
    assert!(!signals.face);
    assert!(!signals.alignment);
    assert!(!signals.lighting);

    // Stays forced off while the face is gone
    for _ in 0..10 {
        assert_eq!(stabilizer.update(ghost), Default::default());
    }

    // Recovery needs a full ON streak again
    for _ in 0..4 {
        assert!(!stabilizer.update(ALL_GOOD).alignment);
    }
    assert!(stabilizer.update(ALL_GOOD).all_ready());
}

#[test]
fn test_custom_thresholds() {
    let config = StabilizerConfig {
        on_threshold: 2,
        off_threshold: 1,
        ..StabilizerConfig::default()
    };
    let mut stabilizer = Stabilizer::new(&config);
    assert!(!stabilizer.update(ALL_GOOD).face);
    assert!(stabilizer.update(ALL_GOOD).face);
    assert!(!stabilizer.update(RawSignals::default()).face);
}

proptest! {
    #[test]
    fn prop_never_turns_on_without_full_streak(readings in prop::collection::vec(any::<bool>(), 0..200)) {
        let mut gate = HysteresisGate::new(5, 3);
        let on = readings.iter().any(|r| gate.apply(*r));
        if longest_run(&readings, true) < 5 {
            prop_assert!(!on);
        }
    }

    #[test]
    fn prop_never_turns_off_without_full_streak(readings in prop::collection::vec(any::<bool>(), 0..200)) {
        let mut gate = HysteresisGate::new(5, 3);
        for _ in 0..5 {
            gate.apply(true);
        }
        let all_on = readings.iter().all(|r| gate.apply(*r));
        if longest_run(&readings, false) < 3 {
            prop_assert!(all_on);
        }
    }

    #[test]
    fn prop_state_matches_last_full_streak(readings in prop::collection::vec(any::<bool>(), 1..200)) {
        let mut gate = HysteresisGate::new(5, 3);
        let mut expected = false;
        let mut run = 0usize;
        let mut previous = None;
        for reading in &readings {
            run = if previous == Some(*reading) { run + 1 } else { 1 };
            previous = Some(*reading);
            if *reading && run >= 5 {
                expected = true;
            }
            if !*reading && run >= 3 {
                expected = false;
            }
            prop_assert_eq!(gate.apply(*reading), expected);
        }
    }

    #[test]
    fn prop_dependents_off_when_face_lost(
        readings in prop::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 0..200)
    ) {
        let mut stabilizer = Stabilizer::default();
        for (face, alignment, lighting) in readings {
            let signals = stabilizer.update(RawSignals { face, alignment, lighting });
            if stabilizer.face_gate().is_lost() {
                prop_assert!(!signals.alignment && !signals.lighting);
            }
        }
    }
}
