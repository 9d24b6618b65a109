//! Coarse classification of the stabilizer's derived scalar.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ThresholdsError {
    #[error("thresholds must be finite (elevated={elevated}, saturated={saturated})")]
    NonFinite { elevated: f64, saturated: f64 },
    #[error("elevated threshold ({elevated}) must be below saturated threshold ({saturated})")]
    Inverted { elevated: f64, saturated: f64 },
}

/// Band boundaries for [`SignalBand`].
///
/// Invariant: both values are finite and `elevated < saturated`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    elevated: f64,
    saturated: f64,
}

impl Thresholds {
    pub const DEFAULT_ELEVATED: f64 = 1.0e15;
    pub const DEFAULT_SATURATED: f64 = 2.84e23;

    pub fn new(elevated: f64, saturated: f64) -> Result<Self, ThresholdsError> {
        if !elevated.is_finite() || !saturated.is_finite() {
            return Err(ThresholdsError::NonFinite {
                elevated,
                saturated,
            });
        }
        if elevated >= saturated {
            return Err(ThresholdsError::Inverted {
                elevated,
                saturated,
            });
        }
        Ok(Self {
            elevated,
            saturated,
        })
    }

    #[must_use]
    pub fn elevated(&self) -> f64 {
        self.elevated
    }

    #[must_use]
    pub fn saturated(&self) -> f64 {
        self.saturated
    }

    #[must_use]
    pub fn classify(&self, value: f64) -> SignalBand {
        if value >= self.saturated {
            SignalBand::Saturated
        } else if value >= self.elevated {
            SignalBand::Elevated
        } else {
            // NaN lands here too.
            SignalBand::Baseline
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            elevated: Self::DEFAULT_ELEVATED,
            saturated: Self::DEFAULT_SATURATED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalBand {
    Baseline,
    Elevated,
    Saturated,
}

impl SignalBand {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Baseline => "BASELINE",
            Self::Elevated => "ELEVATED",
            Self::Saturated => "SATURATED",
        }
    }
}

impl fmt::Display for SignalBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
