//! Base-12 numeral codec.
//!
//! Digit values 0 through 11 use the glyphs `0-9`, `X` (ten) and `E` (eleven).
//! Negative values carry a leading `-`. Zero is the only value that encodes
//! with a leading `0`.
//!
//! ```text
//! encode(144)  == "100"
//! encode(-15)  == "-13"
//! decode(" -xe ") == decode("-XE") == -131
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const RADIX: u64 = 12;

/// Glyph for each digit value, indexed by value.
pub const GLYPHS: [char; 12] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'X', 'E'];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RadixError {
    #[error("dozenal input is empty")]
    Empty,
    #[error("dozenal input has a sign but no digits")]
    SignOnly,
    #[error("invalid dozenal glyph {glyph:?} at position {position}")]
    InvalidGlyph { glyph: char, position: usize },
    #[error("dozenal value does not fit in a 64-bit signed integer")]
    Overflow,
    #[error("cannot encode {value} as dozenal: not a finite integer")]
    NotAnInteger { value: f64 },
}

impl RadixError {
    /// True for the malformed-input family (empty, sign-only, bad glyph).
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::Empty | Self::SignOnly | Self::InvalidGlyph { .. }
        )
    }
}

#[must_use]
fn glyph_value(ch: char) -> Option<u64> {
    match ch.to_ascii_uppercase() {
        d @ '0'..='9' => Some(u64::from(d) - u64::from('0')),
        'X' => Some(10),
        'E' => Some(11),
        _ => None,
    }
}

fn encode_magnitude(mut n: u64, out: &mut String) {
    if n == 0 {
        out.push('0');
        return;
    }
    // u64::MAX needs 18 dozenal digits.
    let mut digits = [0u8; 18];
    let mut len = 0;
    while n > 0 {
        digits[len] = (n % RADIX) as u8;
        n /= RADIX;
        len += 1;
    }
    for &d in digits[..len].iter().rev() {
        out.push(GLYPHS[d as usize]);
    }
}

/// Encode an integer as a dozenal string.
#[must_use]
pub fn encode(n: i64) -> String {
    let mut out = String::new();
    if n < 0 {
        out.push('-');
    }
    encode_magnitude(n.unsigned_abs(), &mut out);
    out
}

/// Encode a float that must hold an exact integer value.
///
/// Rejects NaN, infinities, fractional values and anything outside `i64`.
pub fn encode_f64(value: f64) -> Result<String, RadixError> {
    Dozenal::try_from(value).map(|d| d.to_string())
}

/// Decode a dozenal string.
///
/// Surrounding whitespace is ignored and glyphs match case-insensitively.
/// `position` in [`RadixError::InvalidGlyph`] is the character index within
/// the trimmed input.
pub fn decode(s: &str) -> Result<i64, RadixError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(RadixError::Empty);
    }

    let (negative, body, offset) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest, 1),
        None => (false, trimmed, 0),
    };
    if body.is_empty() {
        return Err(RadixError::SignOnly);
    }

    let mut magnitude: u64 = 0;
    for (i, ch) in body.chars().enumerate() {
        let digit = glyph_value(ch).ok_or(RadixError::InvalidGlyph {
            glyph: ch,
            position: i + offset,
        })?;
        magnitude = magnitude
            .checked_mul(RADIX)
            .and_then(|m| m.checked_add(digit))
            .ok_or(RadixError::Overflow)?;
    }

    if negative {
        0i64.checked_sub_unsigned(magnitude).ok_or(RadixError::Overflow)
    } else {
        i64::try_from(magnitude).map_err(|_| RadixError::Overflow)
    }
}

/// An integer that displays and serializes as dozenal.
///
/// Deserialization accepts only strings; a JSON/TOML number is a type error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Dozenal(i64);

impl Dozenal {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for Dozenal {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<f64> for Dozenal {
    type Error = RadixError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        // 2^63 is exactly representable; i64::MAX is not.
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(RadixError::NotAnInteger { value });
        }
        if !(-LIMIT..LIMIT).contains(&value) {
            return Err(RadixError::Overflow);
        }
        Ok(Self(value as i64))
    }
}

impl fmt::Display for Dozenal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self.0))
    }
}

impl FromStr for Dozenal {
    type Err = RadixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s).map(Self)
    }
}

impl Serialize for Dozenal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Dozenal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
