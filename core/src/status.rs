//! Per-cycle status line and the sink it is written to.

use std::fmt;

use dozen_types::{Dozenal, SignalBand};

use crate::{duty::DutyPhase, projection::Anchor};

/// Snapshot of one completed stabilizer cycle, formatted for a single
/// updating terminal line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusLine {
    /// `round(energy * 100)` after re-normalization.
    pub energy: Dozenal,
    pub anchor: Anchor,
    pub derived: f64,
    pub band: SignalBand,
    pub phase: DutyPhase,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "12D: [{}] | PROJ: {} | C: {:.1e} [{}] | {}",
            self.energy, self.anchor, self.derived, self.band, self.phase
        )
    }
}

pub trait StatusSink {
    fn emit(&mut self, line: &StatusLine);
}

/// Collects every line; handy for tests and replays.
impl StatusSink for Vec<StatusLine> {
    fn emit(&mut self, line: &StatusLine) {
        self.push(*line);
    }
}

/// Discards every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn emit(&mut self, _line: &StatusLine) {}
}
