//! Duty cycles: wall-clock time to next control-loop interval.
//!
//! Pure functions of time so the schedule is testable without sleeping.

use std::{fmt, time::Duration};

use dozen_types::Protocol;

pub const PULSE_PERIOD_SECS: f64 = 4.0;
pub const PULSE_BURST_SECS: f64 = 1.0;
pub const PULSE_BURST_HZ: f64 = 40.0;
pub const PULSE_WAIT_HZ: f64 = 3.0;

pub const HARMONIC_HZ: f64 = 144.0;

pub const PRESENCE_PERIOD_SECS: f64 = 2.0;
pub const PRESENCE_START_HZ: f64 = 26.0;
pub const PRESENCE_END_HZ: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DutyPhase {
    Burst,
    Wait,
    Harmonic,
    Decel,
}

impl DutyPhase {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Burst => "BURST",
            Self::Wait => "WAIT",
            Self::Harmonic => "HARMONIC",
            Self::Decel => "DECEL",
        }
    }
}

impl fmt::Display for DutyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Phase and sleep interval for one control-loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub phase: DutyPhase,
    pub interval: Duration,
}

impl Cadence {
    fn at_hz(phase: DutyPhase, hz: f64) -> Self {
        Self {
            phase,
            interval: Duration::from_secs_f64(1.0 / hz),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DutyCycle {
    protocol: Protocol,
}

impl DutyCycle {
    #[must_use]
    pub fn new(protocol: Protocol) -> Self {
        Self { protocol }
    }

    #[must_use]
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Cadence at wall-clock time `t` (seconds since the epoch).
    #[must_use]
    pub fn cadence_at(&self, t: f64) -> Cadence {
        match self.protocol {
            Protocol::ThomasPulse => {
                if t.rem_euclid(PULSE_PERIOD_SECS) < PULSE_BURST_SECS {
                    Cadence::at_hz(DutyPhase::Burst, PULSE_BURST_HZ)
                } else {
                    Cadence::at_hz(DutyPhase::Wait, PULSE_WAIT_HZ)
                }
            }
            Protocol::Harmonic => Cadence::at_hz(DutyPhase::Harmonic, HARMONIC_HZ),
            Protocol::Presence => {
                let progress = t.rem_euclid(PRESENCE_PERIOD_SECS) / PRESENCE_PERIOD_SECS;
                let hz = PRESENCE_START_HZ - (PRESENCE_START_HZ - PRESENCE_END_HZ) * progress;
                Cadence::at_hz(DutyPhase::Decel, hz)
            }
        }
    }
}
