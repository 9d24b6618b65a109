//! Per-slot perturbation workers.
//!
//! Each [`DimensionDriver`] runs on the tokio blocking pool (a real OS thread),
//! adds a small oscillation to its own slot, then sleeps for one period. All
//! drivers in a [`DriverPool`] share one [`StopSignal`] and check it between
//! ticks; shutdown waits for every driver with a single bounded deadline.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use tokio::{task::JoinHandle, time::Instant};

use dozen_types::DriverSettings;

use crate::{clock, state::StateVector};

/// Cooperative cancellation flag shared by a pool of drivers.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Perturbation applied by driver `index` at wall-clock time `t`.
#[must_use]
pub fn wave(t: f64, index: usize, amplitude: f64) -> f64 {
    (t + index as f64).sin() * amplitude
}

pub struct DimensionDriver {
    index: usize,
    join: Option<JoinHandle<u64>>,
}

impl DimensionDriver {
    /// Start a driver for `index`. Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(
        index: usize,
        state: Arc<StateVector>,
        settings: DriverSettings,
        stop: StopSignal,
    ) -> Self {
        let join = tokio::task::spawn_blocking(move || drive(index, &state, settings, &stop));
        Self {
            index,
            join: Some(join),
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

fn drive(index: usize, state: &StateVector, settings: DriverSettings, stop: &StopSignal) -> u64 {
    let mut ticks = 0;
    while !stop.is_stopped() {
        let delta = wave(clock::unix_seconds(), index, settings.amplitude());
        if let Err(e) = state.perturb_slot(index, delta) {
            tracing::warn!(index, %e, "Driver cannot write its slot, stopping");
            break;
        }
        ticks += 1;
        thread::sleep(settings.period());
    }
    tracing::debug!(index, ticks, "Driver stopped");
    ticks
}

/// Outcome of [`DriverPool::shutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub stopped: usize,
    pub timed_out: usize,
    pub panicked: usize,
    /// Total perturbations applied by drivers that stopped cleanly.
    pub ticks: u64,
}

impl ShutdownReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.timed_out == 0 && self.panicked == 0
    }
}

/// One driver per slot, sharing a stop signal.
pub struct DriverPool {
    stop: StopSignal,
    drivers: Vec<DimensionDriver>,
}

impl DriverPool {
    /// Spawn a driver for every slot of `state`.
    #[must_use]
    pub fn spawn(state: &Arc<StateVector>, settings: DriverSettings) -> Self {
        let stop = StopSignal::new();
        let drivers = (0..state.dimensions())
            .map(|index| DimensionDriver::spawn(index, Arc::clone(state), settings, stop.clone()))
            .collect();
        Self { stop, drivers }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Signal every driver to stop and wait up to `timeout` for all of them.
    pub async fn shutdown(mut self, timeout: Duration) -> ShutdownReport {
        self.stop.stop();
        let deadline = Instant::now() + timeout;
        let mut report = ShutdownReport::default();

        for driver in &mut self.drivers {
            let Some(join) = driver.join.take() else {
                continue;
            };
            match tokio::time::timeout_at(deadline, join).await {
                Ok(Ok(ticks)) => {
                    report.stopped += 1;
                    report.ticks += ticks;
                }
                Ok(Err(e)) => {
                    tracing::warn!(index = driver.index, %e, "Driver task failed");
                    report.panicked += 1;
                }
                Err(_) => {
                    tracing::warn!(index = driver.index, "Driver did not stop before deadline");
                    report.timed_out += 1;
                }
            }
        }
        report
    }
}

impl Drop for DriverPool {
    fn drop(&mut self) {
        // Best-effort stop if the owner exits early; do not block in Drop.
        self.stop.stop();
    }
}
