//! Invariant under concurrent drivers

use std::{sync::Arc, time::Duration};

use dozen_core::{CycleOutcome, DriverPool, Stabilizer, StateVector, unix_seconds};
use dozen_types::{Dozenal, DriverSettings, Settings};

use crate::common::{TARGET, fast_settings};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invariant_holds_with_drivers_active() {
    let settings = fast_settings();
    let state = Arc::new(StateVector::random(12, TARGET, 10.0..14.0));
    let pool = DriverPool::spawn(&state, settings.drivers);
    let mut stabilizer = Stabilizer::new(Arc::clone(&state), &settings);

    for _ in 0..40 {
        match stabilizer.cycle(unix_seconds()) {
            CycleOutcome::Completed { status, .. } => {
                // Encoded from the sum read under the lock right after
                // re-normalization: round(144.0 * 100).
                assert_eq!(status.energy, Dozenal::new(14_400));
                assert!(status.anchor.as_array().iter().all(|v| v.is_finite()));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(state.snapshot().iter().all(|v| v.is_finite()));
        tokio::time::sleep(Duration::from_millis(3)).await;
    }

    let report = pool.shutdown(Duration::from_secs(2)).await;
    assert_eq!(report.stopped, 12);
    assert!(report.is_clean());
    assert!(report.ticks > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn driver_drift_between_cycles_is_bounded() {
    let drivers = DriverSettings::new(1000.0, 0.01).unwrap();
    let state = Arc::new(StateVector::from_values(vec![12.0; 12], TARGET));
    let pool = DriverPool::spawn(&state, drivers);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let report = pool.shutdown(Duration::from_secs(2)).await;

    // Every tick moves the sum by at most the amplitude.
    let drift = (state.sum() - TARGET).abs();
    assert!(drift <= report.ticks as f64 * 0.01 + 1e-9);
    assert!(state.snapshot().iter().all(|v| v.is_finite()));

    let mut stabilizer = Stabilizer::new(Arc::clone(&state), &Settings::default());
    assert!(matches!(
        stabilizer.cycle(unix_seconds()),
        CycleOutcome::Completed { .. }
    ));
    assert!((state.sum() - TARGET).abs() < 1e-6 * TARGET);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn many_pools_on_one_vector_never_tear_slots() {
    let state = Arc::new(StateVector::from_values(vec![12.0; 12], TARGET));
    let settings = DriverSettings::new(2000.0, 0.5).unwrap();
    let pools: Vec<_> = (0..3)
        .map(|_| DriverPool::spawn(&state, settings))
        .collect();

    let stop_at = tokio::time::Instant::now() + Duration::from_millis(60);
    while tokio::time::Instant::now() < stop_at {
        state.snapshot_and_normalize(TARGET);
        tokio::task::yield_now().await;
    }

    for pool in pools {
        assert!(pool.shutdown(Duration::from_secs(2)).await.is_clean());
    }
    assert!(state.snapshot().iter().all(|v| v.is_finite()));
}
