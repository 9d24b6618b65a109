//! Sum invariant and intake ordering without concurrent writers

use std::sync::Arc;

use dozen_core::{CycleOutcome, Normalization, Stabilizer, StateVector, within_tolerance};
use dozen_types::Settings;

use crate::common::{RecordingCoherence, ScriptedJitter, TARGET, positive_values, shared_state};

#[test]
fn invariant_holds_after_every_cycle() {
    for seed in 0..20 {
        let state = shared_state(positive_values(12, seed));
        let mut stabilizer = Stabilizer::new(Arc::clone(&state), &Settings::default());

        for step in 0..25 {
            let t = 1_700_000_000.0 + f64::from(seed) + f64::from(step) * 0.041;
            let outcome = stabilizer.cycle(t);
            assert!(
                matches!(outcome, CycleOutcome::Completed { .. }),
                "seed {seed} step {step}: {outcome:?}"
            );
            let sum = state.sum();
            assert!(
                (sum - TARGET).abs() < 1e-6 * TARGET,
                "seed {seed} step {step}: sum {sum}"
            );
        }
    }
}

#[test]
fn single_cycle_is_enough() {
    let state = shared_state(vec![0.001; 12]);
    let mut stabilizer = Stabilizer::new(Arc::clone(&state), &Settings::default());
    stabilizer.cycle(3.0);
    assert!(within_tolerance(state.sum(), TARGET));
}

#[test]
fn all_zero_vector_is_left_alone() {
    let state = shared_state(vec![0.0; 12]);
    let mut stabilizer = Stabilizer::new(Arc::clone(&state), &Settings::default());

    for step in 0..3 {
        let outcome = stabilizer.cycle(f64::from(step));
        assert!(matches!(outcome, CycleOutcome::Degenerate { sum, .. } if sum == 0.0));
    }
    assert_eq!(state.snapshot(), vec![0.0; 12]);
    assert_eq!(stabilizer.stats().degenerate, 3);
    assert_eq!(stabilizer.stats().completed, 0);
}

#[test]
fn subnormal_vector_is_skipped_not_blown_up() {
    let state = shared_state(vec![1e-310; 12]);
    let mut stabilizer = Stabilizer::new(Arc::clone(&state), &Settings::default());

    let outcome = stabilizer.cycle(1.0);
    assert!(
        matches!(outcome, CycleOutcome::Degenerate { sum, .. } if sum.is_finite()),
        "{outcome:?}"
    );
    assert_eq!(state.snapshot(), vec![1e-310; 12]);
    assert!(state.snapshot().iter().all(|v| v.is_finite()));
    assert_eq!(stabilizer.stats().degenerate, 1);
}

#[test]
fn degenerate_vector_recovers_once_energy_returns() {
    let state = shared_state(vec![12.0; 12]);
    let mut stabilizer = Stabilizer::new(Arc::clone(&state), &Settings::default());

    state.fill(0.0);
    assert!(matches!(stabilizer.cycle(1.0), CycleOutcome::Degenerate { .. }));

    state.perturb_slot(4, 2.0).unwrap();
    assert!(matches!(stabilizer.cycle(2.0), CycleOutcome::Completed { .. }));
    let values = state.snapshot();
    assert!(within_tolerance(values[4], TARGET));
    assert!(within_tolerance(state.sum(), TARGET));
}

#[test]
fn snapshot_and_normalize_returns_settled_values() {
    let state = StateVector::from_values(positive_values(12, 7), TARGET);
    match state.snapshot_and_normalize(TARGET) {
        Normalization::Normalized(values) => {
            assert_eq!(values, state.snapshot());
            assert!(within_tolerance(values.iter().sum(), TARGET));
        }
        Normalization::Degenerate { sum } => panic!("unexpected degenerate sum {sum}"),
    }
}

/// The coherence provider sees the energy of the cycle it is called in,
/// read before that cycle normalizes, never the previous cycle's value.
#[test]
fn coherence_intake_reads_current_cycle_energy() {
    let recorder = RecordingCoherence::default();
    let state = shared_state(vec![4.0; 12]);
    let mut stabilizer =
        Stabilizer::new(Arc::clone(&state), &Settings::default()).with_coherence(recorder.clone());

    // 48 / 200
    stabilizer.cycle(1.0);
    // Settled at 144; a driver-style nudge adds 16 before the next cycle.
    state.perturb_slot(0, 16.0).unwrap();
    stabilizer.cycle(2.0);
    // Settled at 144 again, unchanged.
    stabilizer.cycle(3.0);

    let beliefs = recorder.beliefs();
    assert_eq!(beliefs.len(), 3);
    assert!((beliefs[0] - 0.24).abs() < 1e-9, "{beliefs:?}");
    assert!((beliefs[1] - 0.80).abs() < 1e-9, "{beliefs:?}");
    assert!((beliefs[2] - 0.72).abs() < 1e-9, "{beliefs:?}");
}

#[test]
fn jitter_backoff_skips_intake_and_normalization() {
    let recorder = RecordingCoherence::default();
    let state = shared_state(vec![1.0; 12]);
    let mut stabilizer = Stabilizer::new(Arc::clone(&state), &Settings::default())
        .with_coherence(recorder.clone())
        .with_jitter(ScriptedJitter::new([true, true, false]));

    assert!(matches!(stabilizer.cycle(1.0), CycleOutcome::Backoff { .. }));
    assert!(matches!(stabilizer.cycle(1.1), CycleOutcome::Backoff { .. }));
    assert_eq!(state.snapshot(), vec![1.0; 12]);
    assert!(recorder.beliefs().is_empty());

    assert!(matches!(stabilizer.cycle(1.2), CycleOutcome::Completed { .. }));
    assert_eq!(recorder.beliefs().len(), 1);
    assert_eq!(stabilizer.stats().backoffs, 2);
}
