//! Projection of the full vector down to a three-axis anchor point.

use std::fmt;

/// Rates at which each axis sweeps across the slots, in slots per second.
pub const AXIS_RATES: [f64; 3] = [100.0, 200.0, 300.0];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Anchor {
    #[must_use]
    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}, {:.2}, {:.2}", self.x, self.y, self.z)
    }
}

/// Slot indices selected at wall-clock time `t`. Axes may collide.
///
/// Returns all zeros when `dimensions` is zero.
#[must_use]
pub fn select_axes(t: f64, dimensions: usize) -> [usize; 3] {
    if dimensions == 0 {
        return [0; 3];
    }
    let d = dimensions as f64;
    AXIS_RATES.map(|rate| (t * rate).rem_euclid(d).floor() as usize % dimensions)
}

/// Read the anchor from `values` at time `t`.
#[must_use]
pub fn project(values: &[f64], t: f64) -> Anchor {
    let [x, y, z] = select_axes(t, values.len()).map(|i| values.get(i).copied().unwrap_or(0.0));
    Anchor { x, y, z }
}
