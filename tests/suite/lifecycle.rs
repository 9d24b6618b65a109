//! Run loop startup and shutdown

use std::{sync::Arc, time::Duration};

use dozen_core::{NullSink, Stabilizer, StatusLine};
use dozen_types::Dozenal;

use crate::common::{ScriptedJitter, TARGET, fast_settings, positive_values, shared_state};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_emits_lines_and_stops_every_driver() {
    let settings = fast_settings();
    let state = shared_state(positive_values(12, 3));
    let mut stabilizer = Stabilizer::new(Arc::clone(&state), &settings);
    let mut lines: Vec<StatusLine> = Vec::new();

    let report = stabilizer
        .run(&mut lines, tokio::time::sleep(Duration::from_millis(80)))
        .await;

    assert_eq!(report.drivers.stopped, 12);
    assert!(report.drivers.is_clean());
    assert!(report.stats.completed > 0);
    assert_eq!(lines.len() as u64, report.stats.completed);
    assert_eq!(report.last, lines.last().copied());
    for line in &lines {
        assert_eq!(line.energy, Dozenal::new(14_400));
        assert!(line.to_string().starts_with("12D: [8400] | PROJ: "));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn drivers_are_quiet_after_run_returns() {
    let settings = fast_settings();
    let state = shared_state(vec![12.0; 12]);
    let mut stabilizer = Stabilizer::new(Arc::clone(&state), &settings);

    stabilizer
        .run(&mut NullSink, tokio::time::sleep(Duration::from_millis(30)))
        .await;

    let settled = state.snapshot();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(state.snapshot(), settled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn constant_jitter_emits_nothing() {
    let settings = fast_settings();
    let state = shared_state(vec![12.0; 12]);
    let mut stabilizer = Stabilizer::new(Arc::clone(&state), &settings)
        .with_jitter(ScriptedJitter::new(std::iter::repeat_n(true, 10_000)));
    let mut lines: Vec<StatusLine> = Vec::new();

    let report = stabilizer
        .run(&mut lines, tokio::time::sleep(Duration::from_millis(40)))
        .await;

    assert!(lines.is_empty());
    assert_eq!(report.stats.completed, 0);
    assert!(report.stats.backoffs > 0);
    assert!(report.last.is_none());
    assert!(report.drivers.is_clean());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn immediate_shutdown_still_runs_one_cycle() {
    let settings = fast_settings();
    let state = shared_state(positive_values(12, 11));
    let mut stabilizer = Stabilizer::new(Arc::clone(&state), &settings);

    let report = stabilizer.run(&mut NullSink, std::future::ready(())).await;

    assert_eq!(report.stats.completed, 1);
    assert_eq!(report.drivers.stopped, 12);
    assert!(report.last.is_some());
    assert!(state.snapshot().iter().all(|v| v.is_finite()));
    assert!((state.snapshot().iter().sum::<f64>() - TARGET).abs() < 1.0);
}
