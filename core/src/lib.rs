//! Core domain logic for Dozen.
//!
//! A shared twelve-slot state vector is perturbed by one driver per slot and
//! re-normalized by a single control loop so that it sums to the configured
//! target after every cycle.
//!
//! ```text
//! DriverPool ──perturb_slot──> StateVector <──lock/normalize── Stabilizer ──> StatusSink
//!                                                   ^
//!                                  CoherenceProvider, JitterProvider
//! ```

mod clock;
pub mod driver;
pub mod duty;
pub mod projection;
pub mod provider;
pub mod stabilizer;
pub mod state;
pub mod status;

pub use clock::unix_seconds;
pub use driver::{DimensionDriver, DriverPool, ShutdownReport, StopSignal, wave};
pub use duty::{Cadence, DutyCycle, DutyPhase};
pub use projection::{Anchor, project, select_axes};
pub use provider::{
    CoherenceProvider, CoherenceReading, FallbackCoherence, JitterProvider, Quiescent,
};
pub use stabilizer::{CycleOutcome, CycleStats, GOLDEN_RATIO, Intake, RunReport, Stabilizer};
pub use state::{
    INVARIANT_TOLERANCE, Normalization, SlotGuard, StateError, StateVector, within_tolerance,
};
pub use status::{NullSink, StatusLine, StatusSink};
