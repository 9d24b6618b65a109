//! The shared state vector.
//!
//! # Consistency
//!
//! One mutex guards the whole vector. Drivers hold it for a single addition;
//! the stabilizer holds it for its entire read-modify-write section via
//! [`StateVector::lock`]. Every observation is therefore linearizable: a
//! cycle never sees a half-applied perturbation and a perturbation is never
//! lost to a concurrent normalization.
//!
//! Lock poisoning is recovered rather than propagated. Slots are plain `f64`
//! values written whole under the lock, so a panicking holder cannot leave a
//! torn value behind.

use std::{
    ops::Range,
    sync::{Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;

/// Relative tolerance for the post-cycle sum invariant.
pub const INVARIANT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum StateError {
    #[error("slot {index} out of range for {len} dimensions")]
    SlotOutOfRange { index: usize, len: usize },
    #[error("perturbation must be finite, got {0}")]
    NonFiniteDelta(f64),
}

/// Result of a normalization pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalization {
    /// Every slot was scaled; holds the post-normalization values.
    Normalized(Vec<f64>),
    /// The sum was zero or not finite; the vector was left untouched.
    Degenerate { sum: f64 },
}

impl Normalization {
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::Degenerate { .. })
    }
}

#[derive(Debug)]
pub struct StateVector {
    slots: Mutex<Vec<f64>>,
    target_sum: f64,
}

impl StateVector {
    /// Allocate `dimensions` slots with independent uniform draws from `range`.
    #[must_use]
    pub fn random(dimensions: usize, target_sum: f64, range: Range<f64>) -> Self {
        let width = range.end - range.start;
        let values = (0..dimensions)
            .map(|_| range.start + rand::random::<f64>() * width)
            .collect();
        Self::from_values(values, target_sum)
    }

    #[must_use]
    pub fn from_values(values: Vec<f64>, target_sum: f64) -> Self {
        Self {
            slots: Mutex::new(values),
            target_sum,
        }
    }

    #[must_use]
    pub fn target_sum(&self) -> f64 {
        self.target_sum
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.lock().len()
    }

    /// Add `delta` to one slot.
    pub fn perturb_slot(&self, index: usize, delta: f64) -> Result<(), StateError> {
        if !delta.is_finite() {
            return Err(StateError::NonFiniteDelta(delta));
        }
        let mut slots = self.lock();
        let len = slots.len();
        let slot = slots
            .get_mut(index)
            .ok_or(StateError::SlotOutOfRange { index, len })?;
        *slot += delta;
        Ok(())
    }

    /// Scale the whole vector so it sums to `target`, atomically.
    pub fn snapshot_and_normalize(&self, target: f64) -> Normalization {
        let mut guard = self.lock();
        guard.normalize(target)
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<f64> {
        self.lock().values().to_vec()
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.lock().sum()
    }

    /// Overwrite every slot with `value`.
    pub fn fill(&self, value: f64) {
        let mut guard = self.lock();
        guard.slots.fill(value);
    }

    /// Exclusive whole-vector access until the guard drops.
    pub fn lock(&self) -> SlotGuard<'_> {
        SlotGuard {
            slots: self.slots.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Whole-vector read-modify-write access held across a stabilizer cycle.
pub struct SlotGuard<'a> {
    slots: MutexGuard<'a, Vec<f64>>,
}

impl SlotGuard<'_> {
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.slots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.slots.get(index).copied()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut f64> {
        self.slots.get_mut(index)
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.slots.iter().sum()
    }

    pub fn scale(&mut self, factor: f64) {
        for slot in self.slots.iter_mut() {
            *slot *= factor;
        }
    }

    /// Scale every slot so the vector sums to `target`.
    ///
    /// Degenerate when the sum is zero or not finite, or when the scale
    /// factor itself is zero or not finite (a subnormal sum overflows
    /// `target / sum`). A degenerate vector is never modified.
    pub fn normalize(&mut self, target: f64) -> Normalization {
        let sum = self.sum();
        if sum == 0.0 || !sum.is_finite() {
            return Normalization::Degenerate { sum };
        }
        let factor = target / sum;
        if factor == 0.0 || !factor.is_finite() {
            return Normalization::Degenerate { sum };
        }
        self.scale(factor);
        Normalization::Normalized(self.slots.clone())
    }
}

/// True when `sum` is within the relative invariant tolerance of `target`.
#[must_use]
pub fn within_tolerance(sum: f64, target: f64) -> bool {
    (sum - target).abs() <= INVARIANT_TOLERANCE * target.abs().max(1.0)
}
