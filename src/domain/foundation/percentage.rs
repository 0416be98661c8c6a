//! Percentage value object (0-100 scale).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A whole-number value between 0 and 100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(u8);

impl Percentage {
    /// Zero percent.
    pub const ZERO: Self = Self(0);

    /// One hundred percent.
    pub const HUNDRED: Self = Self(100);

    /// Creates a new Percentage, clamping to valid range.
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    /// Creates a Percentage, returning error if out of range.
    pub fn try_new(value: u8) -> Result<Self, ValidationError> {
        if value > 100 {
            return Err(ValidationError::out_of_range(
                "percentage",
                0.0,
                100.0,
                f64::from(value),
            ));
        }
        Ok(Self(value))
    }

    /// Converts a fraction to a percentage.
    ///
    /// The fraction is clipped to [0, 1] and rounded to the nearest whole
    /// percent. NaN maps to zero.
    pub fn from_unit(fraction: f64) -> Self {
        Self::from_score(fraction * 100.0)
    }

    /// Converts a signed fraction in [-1, 1] to a percentage via `(v + 1) / 2`.
    pub fn from_signed_unit(value: f64) -> Self {
        let clipped = if value.is_nan() { -1.0 } else { value.clamp(-1.0, 1.0) };
        Self::from_unit((clipped + 1.0) / 2.0)
    }

    /// Converts a score already on the 0-100 scale, clipping and rounding.
    pub fn from_score(score: f64) -> Self {
        if score.is_nan() {
            return Self::ZERO;
        }
        Self(score.clamp(0.0, 100.0).round() as u8)
    }

    /// Returns the value as u8.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Returns the value as a fraction (0.0 to 1.0).
    pub fn as_fraction(&self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
