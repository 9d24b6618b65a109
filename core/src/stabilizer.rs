//! The control loop.
//!
//! # Cycle
//!
//! ```text
//! jitter? ──yes──> Backoff (sleep jitter_backoff)
//!    │no
//!    v
//! energy = sum(vector)             this cycle's energy, read first
//! reading = coherence.tick(belief(energy), dread)
//!    │
//!    v   ── vector lock held from here ──
//! normalize ──degenerate──> Degenerate (sleep jitter_backoff)
//! spin by 1 + sin(t * phi) * spin_amplitude
//! normalize
//! anchor = project(vector, t)
//!    │   ── lock released ──
//!    v
//! Completed(status line), sleep duty.cadence_at(t)
//! ```
//!
//! The coherence provider is never called while the vector lock is held, so a
//! slow provider cannot stall the drivers.

use std::{future::Future, sync::Arc, time::Duration};

use dozen_types::{Dozenal, DriverSettings, Settings, StabilizerSettings};

use crate::{
    clock,
    driver::{DriverPool, ShutdownReport},
    duty::DutyCycle,
    projection::{Anchor, project},
    provider::{
        CoherenceProvider, CoherenceReading, FallbackCoherence, JitterProvider, Quiescent,
    },
    state::{Normalization, StateVector},
    status::{StatusLine, StatusSink},
};

pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// Energy and provider reading captured at the start of a cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intake {
    /// Vector sum read before this cycle's normalization.
    pub energy: f64,
    /// `energy / belief_scale`, clamped to `[0, 1]`.
    pub belief: f64,
    /// Sanitized provider reading.
    pub reading: CoherenceReading,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The jitter provider reported a disturbance; nothing was touched.
    Backoff { retry_in: Duration },
    /// The vector could not be normalized; it was left untouched.
    Degenerate { sum: f64, retry_in: Duration },
    Completed {
        status: StatusLine,
        intake: Intake,
        /// Sleep before the next cycle, from the duty cycle.
        next: Duration,
    },
}

impl CycleOutcome {
    #[must_use]
    pub fn wait(&self) -> Duration {
        match self {
            Self::Backoff { retry_in } | Self::Degenerate { retry_in, .. } => *retry_in,
            Self::Completed { next, .. } => *next,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub completed: u64,
    pub backoffs: u64,
    pub degenerate: u64,
}

/// Summary returned by [`Stabilizer::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub stats: CycleStats,
    pub drivers: ShutdownReport,
    pub last: Option<StatusLine>,
}

pub struct Stabilizer {
    state: Arc<StateVector>,
    driver_settings: DriverSettings,
    settings: StabilizerSettings,
    duty: DutyCycle,
    coherence: Box<dyn CoherenceProvider>,
    jitter: Box<dyn JitterProvider>,
    stats: CycleStats,
    last: Option<StatusLine>,
}

impl Stabilizer {
    /// Build a stabilizer with the null providers.
    #[must_use]
    pub fn new(state: Arc<StateVector>, settings: &Settings) -> Self {
        Self {
            state,
            driver_settings: settings.drivers,
            duty: DutyCycle::new(settings.stabilizer.protocol()),
            settings: settings.stabilizer.clone(),
            coherence: Box::new(FallbackCoherence::default()),
            jitter: Box::new(Quiescent),
            stats: CycleStats::default(),
            last: None,
        }
    }

    pub fn with_coherence(mut self, provider: impl CoherenceProvider + 'static) -> Self {
        self.coherence = Box::new(provider);
        self
    }

    pub fn with_jitter(mut self, provider: impl JitterProvider + 'static) -> Self {
        self.jitter = Box::new(provider);
        self
    }

    #[must_use]
    pub fn state(&self) -> &Arc<StateVector> {
        &self.state
    }

    #[must_use]
    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    #[must_use]
    pub fn last_status(&self) -> Option<&StatusLine> {
        self.last.as_ref()
    }

    #[must_use]
    pub fn last_anchor(&self) -> Option<Anchor> {
        self.last.map(|status| status.anchor)
    }

    fn belief(&self, energy: f64) -> f64 {
        if energy.is_nan() {
            return 0.0;
        }
        (energy / self.settings.belief_scale()).clamp(0.0, 1.0)
    }

    /// Run one cycle at wall-clock time `t` (seconds since the epoch).
    pub fn cycle(&mut self, t: f64) -> CycleOutcome {
        let backoff = self.settings.jitter_backoff();

        if self.jitter.check_jitter() {
            self.stats.backoffs += 1;
            tracing::debug!(retry_in = ?backoff, "Jitter reported, backing off");
            return CycleOutcome::Backoff { retry_in: backoff };
        }

        let energy = self.state.sum();
        let belief = self.belief(energy);
        let reading = self
            .coherence
            .tick(belief, self.settings.dread_level())
            .sanitized(CoherenceReading::FALLBACK);
        let intake = Intake {
            energy,
            belief,
            reading,
        };

        let target = self.state.target_sum();
        let spin = 1.0 + (t * GOLDEN_RATIO).sin() * self.settings.spin_amplitude();
        let (anchor, settled) = {
            let mut slots = self.state.lock();
            if let Normalization::Degenerate { sum } = slots.normalize(target) {
                drop(slots);
                return self.degenerate(sum);
            }
            slots.scale(spin);
            if let Normalization::Degenerate { sum } = slots.normalize(target) {
                drop(slots);
                return self.degenerate(sum);
            }
            (project(slots.values(), t), slots.sum())
        };

        let energy_code = match Dozenal::try_from((settled * 100.0).round()) {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!(%e, settled, "Cannot encode settled energy");
                return self.degenerate(settled);
            }
        };

        let cadence = self.duty.cadence_at(t);
        let status = StatusLine {
            energy: energy_code,
            anchor,
            derived: reading.derived,
            band: self.settings.thresholds().classify(reading.derived),
            phase: cadence.phase,
        };
        self.stats.completed += 1;
        self.last = Some(status);

        CycleOutcome::Completed {
            status,
            intake,
            next: cadence.interval,
        }
    }

    fn degenerate(&mut self, sum: f64) -> CycleOutcome {
        self.stats.degenerate += 1;
        tracing::warn!(sum, "Degenerate state vector, skipping cycle");
        CycleOutcome::Degenerate {
            sum,
            retry_in: self.settings.jitter_backoff(),
        }
    }

    /// Spawn the drivers and cycle until `shutdown` resolves.
    ///
    /// Shutdown is only observed between cycles. Once it fires every driver
    /// is told to stop and awaited for at most the configured shutdown
    /// timeout.
    pub async fn run<S, F>(&mut self, sink: &mut S, shutdown: F) -> RunReport
    where
        S: StatusSink + ?Sized,
        F: Future<Output = ()>,
    {
        let pool = DriverPool::spawn(&self.state, self.driver_settings);
        tracing::info!(
            drivers = pool.len(),
            protocol = %self.duty.protocol(),
            target = self.state.target_sum(),
            "Stabilizer started"
        );

        tokio::pin!(shutdown);
        loop {
            let outcome = self.cycle(clock::unix_seconds());
            if let CycleOutcome::Completed { status, .. } = &outcome {
                sink.emit(status);
            }

            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = tokio::time::sleep(outcome.wait()) => {}
            }
        }

        let drivers = pool.shutdown(self.settings.shutdown_timeout()).await;
        tracing::info!(
            completed = self.stats.completed,
            backoffs = self.stats.backoffs,
            degenerate = self.stats.degenerate,
            drivers_stopped = drivers.stopped,
            drivers_timed_out = drivers.timed_out,
            "Stabilizer stopped"
        );

        RunReport {
            stats: self.stats,
            drivers,
            last: self.last,
        }
    }
}
