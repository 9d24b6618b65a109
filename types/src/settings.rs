//! Resolved configuration types shared across crates.
//!
//! These types represent fully-validated, resolved configuration state.
//! Raw TOML deserialization structs (with `Option` fields) stay private in
//! `dozen-config`. The config loader resolves them into these types at the
//! parse boundary.
//!
//! Existence of a value is the proof of its validity.

use std::fmt;
use std::ops::Range;
use std::time::Duration;

use thiserror::Error;

use crate::band::{Thresholds, ThresholdsError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("dimensions must be at least 1")]
    NoDimensions,
    #[error("target sum must be finite and positive, got {0}")]
    InvalidTargetSum(f64),
    #[error("initial range {min}..{max} must be finite, non-empty and non-negative")]
    InvalidInitialRange { min: f64, max: f64 },
    #[error("driver rate must be finite and positive, got {0} Hz")]
    InvalidDriverRate(f64),
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidAmplitude { name: &'static str, value: f64 },
    #[error("belief scale must be finite and positive, got {0}")]
    InvalidBeliefScale(f64),
    #[error(transparent)]
    Thresholds(#[from] ThresholdsError),
}

/// Shape and bounds of the shared state vector.
///
/// Invariant: `dimensions >= 1`, `target_sum` finite and positive, and
/// `initial_range` finite, non-empty and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSettings {
    dimensions: usize,
    target_sum: f64,
    initial_range: Range<f64>,
}

impl StateSettings {
    pub const DEFAULT_DIMENSIONS: usize = 12;
    pub const DEFAULT_TARGET_SUM: f64 = 144.0;
    pub const DEFAULT_INITIAL_RANGE: Range<f64> = 10.0..14.0;

    pub fn new(
        dimensions: usize,
        target_sum: f64,
        initial_range: Range<f64>,
    ) -> Result<Self, SettingsError> {
        if dimensions == 0 {
            return Err(SettingsError::NoDimensions);
        }
        if !target_sum.is_finite() || target_sum <= 0.0 {
            return Err(SettingsError::InvalidTargetSum(target_sum));
        }
        let Range { start, end } = initial_range;
        if !start.is_finite() || !end.is_finite() || start < 0.0 || start >= end {
            return Err(SettingsError::InvalidInitialRange {
                min: start,
                max: end,
            });
        }
        Ok(Self {
            dimensions,
            target_sum,
            initial_range,
        })
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[must_use]
    pub fn target_sum(&self) -> f64 {
        self.target_sum
    }

    #[must_use]
    pub fn initial_range(&self) -> Range<f64> {
        self.initial_range.clone()
    }
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            dimensions: Self::DEFAULT_DIMENSIONS,
            target_sum: Self::DEFAULT_TARGET_SUM,
            initial_range: Self::DEFAULT_INITIAL_RANGE,
        }
    }
}

/// Per-slot driver cadence and perturbation size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverSettings {
    period: Duration,
    amplitude: f64,
}

impl DriverSettings {
    pub const DEFAULT_RATE_HZ: f64 = 100.0;
    pub const DEFAULT_AMPLITUDE: f64 = 0.01;

    pub fn new(rate_hz: f64, amplitude: f64) -> Result<Self, SettingsError> {
        if !rate_hz.is_finite() || rate_hz <= 0.0 {
            return Err(SettingsError::InvalidDriverRate(rate_hz));
        }
        check_amplitude("driver amplitude", amplitude)?;
        Ok(Self {
            period: Duration::from_secs_f64(1.0 / rate_hz),
            amplitude,
        })
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[must_use]
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(10),
            amplitude: Self::DEFAULT_AMPLITUDE,
        }
    }
}

/// Named duty-cycle shape for the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    /// 1 s burst at 40 Hz, then 3 s wait at 3 Hz, repeating every 4 s.
    #[default]
    ThomasPulse,
    /// Constant 144 Hz.
    Harmonic,
    /// Linear deceleration from 26 Hz to 8 Hz, restarting every 2 s.
    Presence,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [Self::ThomasPulse, Self::Harmonic, Self::Presence];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ThomasPulse => "thomas-pulse",
            Self::Harmonic => "harmonic",
            Self::Presence => "presence",
        }
    }

    /// Parse a config label. Case, surrounding whitespace and `_` vs `-`
    /// are ignored.
    #[must_use]
    pub fn from_label(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|p| p.label() == normalized)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Control loop tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilizerSettings {
    spin_amplitude: f64,
    jitter_backoff: Duration,
    belief_scale: f64,
    dread_level: f64,
    shutdown_timeout: Duration,
    protocol: Protocol,
    thresholds: Thresholds,
}

impl StabilizerSettings {
    pub const DEFAULT_SPIN_AMPLITUDE: f64 = 0.001;
    pub const DEFAULT_JITTER_BACKOFF: Duration = Duration::from_millis(25);
    pub const DEFAULT_BELIEF_SCALE: f64 = 200.0;
    pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

    #[must_use]
    pub fn builder() -> StabilizerSettingsBuilder {
        StabilizerSettingsBuilder::default()
    }

    #[must_use]
    pub fn spin_amplitude(&self) -> f64 {
        self.spin_amplitude
    }

    #[must_use]
    pub fn jitter_backoff(&self) -> Duration {
        self.jitter_backoff
    }

    #[must_use]
    pub fn belief_scale(&self) -> f64 {
        self.belief_scale
    }

    #[must_use]
    pub fn dread_level(&self) -> f64 {
        self.dread_level
    }

    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    #[must_use]
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }
}

impl Default for StabilizerSettings {
    fn default() -> Self {
        Self {
            spin_amplitude: Self::DEFAULT_SPIN_AMPLITUDE,
            jitter_backoff: Self::DEFAULT_JITTER_BACKOFF,
            belief_scale: Self::DEFAULT_BELIEF_SCALE,
            dread_level: 0.0,
            shutdown_timeout: Self::DEFAULT_SHUTDOWN_TIMEOUT,
            protocol: Protocol::default(),
            thresholds: Thresholds::default(),
        }
    }
}

/// Builder for [`StabilizerSettings`]; validation happens in `build`.
#[derive(Debug, Clone, Default)]
pub struct StabilizerSettingsBuilder {
    inner: StabilizerSettings,
}

impl StabilizerSettingsBuilder {
    pub fn spin_amplitude(mut self, value: f64) -> Self {
        self.inner.spin_amplitude = value;
        self
    }

    pub fn jitter_backoff(mut self, value: Duration) -> Self {
        self.inner.jitter_backoff = value;
        self
    }

    pub fn belief_scale(mut self, value: f64) -> Self {
        self.inner.belief_scale = value;
        self
    }

    pub fn dread_level(mut self, value: f64) -> Self {
        self.inner.dread_level = value;
        self
    }

    pub fn shutdown_timeout(mut self, value: Duration) -> Self {
        self.inner.shutdown_timeout = value;
        self
    }

    pub fn protocol(mut self, value: Protocol) -> Self {
        self.inner.protocol = value;
        self
    }

    pub fn thresholds(mut self, value: Thresholds) -> Self {
        self.inner.thresholds = value;
        self
    }

    pub fn build(self) -> Result<StabilizerSettings, SettingsError> {
        let s = &self.inner;
        check_amplitude("spin amplitude", s.spin_amplitude)?;
        // A spin factor of 1 - amplitude must stay positive.
        if s.spin_amplitude >= 1.0 {
            return Err(SettingsError::InvalidAmplitude {
                name: "spin amplitude",
                value: s.spin_amplitude,
            });
        }
        if !s.belief_scale.is_finite() || s.belief_scale <= 0.0 {
            return Err(SettingsError::InvalidBeliefScale(s.belief_scale));
        }
        check_amplitude("dread level", s.dread_level)?;
        Ok(self.inner)
    }
}

/// Complete resolved settings for one process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub state: StateSettings,
    pub drivers: DriverSettings,
    pub stabilizer: StabilizerSettings,
}

fn check_amplitude(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SettingsError::InvalidAmplitude { name, value });
    }
    Ok(())
}
