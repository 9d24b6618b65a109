//! External signal providers consumed by the stabilizer.
//!
//! Both providers are optional capabilities. The stabilizer is always built
//! with some implementation; when no real provider is available it gets the
//! null implementation ([`FallbackCoherence`], [`Quiescent`]) at
//! construction time. Closures implement both traits for ad-hoc wiring.

/// Value reported by a [`CoherenceProvider`] for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoherenceReading {
    /// Expected in `[0, 1]`; clamped by [`CoherenceReading::sanitized`].
    pub coherence: f64,
    /// Provider-defined scalar shown on the status line and classified into a band.
    pub derived: f64,
}

impl CoherenceReading {
    pub const FALLBACK: Self = Self {
        coherence: 0.5,
        derived: 3.0e8,
    };

    /// Bring a provider's reading back into range.
    ///
    /// Coherence is clamped to `[0, 1]` (NaN becomes the fallback coherence);
    /// a non-finite derived scalar is replaced by the fallback's. Each repair
    /// logs a warning and is never surfaced as an error.
    #[must_use]
    pub fn sanitized(self, fallback: Self) -> Self {
        let coherence = if self.coherence.is_nan() {
            tracing::warn!("Coherence provider returned NaN, using fallback");
            fallback.coherence
        } else if (0.0..=1.0).contains(&self.coherence) {
            self.coherence
        } else {
            tracing::warn!(
                coherence = self.coherence,
                "Coherence out of range, clamping to [0, 1]"
            );
            self.coherence.clamp(0.0, 1.0)
        };

        let derived = if self.derived.is_finite() {
            self.derived
        } else {
            tracing::warn!(derived = self.derived, "Derived scalar not finite, using fallback");
            fallback.derived
        };

        Self { coherence, derived }
    }
}

pub trait CoherenceProvider: Send {
    /// Feed this cycle's normalized energy (`belief`, in `[0, 1]`) and the
    /// configured `dread` level; receive a coherence reading.
    fn tick(&mut self, belief: f64, dread: f64) -> CoherenceReading;
}

pub trait JitterProvider: Send {
    /// True when a transient disturbance means the cycle should back off.
    fn check_jitter(&mut self) -> bool;
}

/// Null coherence provider: always reports the same reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackCoherence {
    reading: CoherenceReading,
}

impl FallbackCoherence {
    #[must_use]
    pub fn new(reading: CoherenceReading) -> Self {
        Self { reading }
    }
}

impl Default for FallbackCoherence {
    fn default() -> Self {
        Self::new(CoherenceReading::FALLBACK)
    }
}

impl CoherenceProvider for FallbackCoherence {
    fn tick(&mut self, _belief: f64, _dread: f64) -> CoherenceReading {
        self.reading
    }
}

/// Null jitter provider: never reports a disturbance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quiescent;

impl JitterProvider for Quiescent {
    fn check_jitter(&mut self) -> bool {
        false
    }
}

impl<F> CoherenceProvider for F
where
    F: FnMut(f64, f64) -> CoherenceReading + Send,
{
    fn tick(&mut self, belief: f64, dread: f64) -> CoherenceReading {
        self(belief, dread)
    }
}

impl<F> JitterProvider for F
where
    F: FnMut() -> bool + Send,
{
    fn check_jitter(&mut self) -> bool {
        self()
    }
}
