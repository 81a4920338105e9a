//! Product rating score.

use serde::{Deserialize, Serialize};

/// Error returned for a score outside `1.0..=5.0`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
#[error("rating must be a number between {min} and {max}", min = RatingScore::MIN, max = RatingScore::MAX)]
pub struct RatingError;

/// A rating between 1 and 5 inclusive. Fractional scores are allowed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct RatingScore(f64);

impl RatingScore {
    pub const MIN: f64 = 1.0;
    pub const MAX: f64 = 5.0;

    /// # Errors
    ///
    /// Returns [`RatingError`] for NaN, infinities, and values out of range.
    pub fn new(value: f64) -> Result<Self, RatingError> {
        if value.is_finite() && (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RatingError)
        }
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for RatingScore {
    type Error = RatingError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingScore> for f64 {
    fn from(score: RatingScore) -> Self {
        score.0
    }
}
