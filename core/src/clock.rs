use chrono::Utc;

/// Wall-clock time as fractional seconds since the Unix epoch.
#[must_use]
pub fn unix_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
