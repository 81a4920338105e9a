//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price must be greater than zero")]
    NotPositive,
    #[error("price cannot have more than {max} decimal places", max = Price::SCALE)]
    TooPrecise,
    #[error("price is too large")]
    TooLarge,
}

/// A strictly positive price with at most two decimal places.
///
/// Stored as `numeric(12,2)`. Serialized as a string so no precision is lost
/// on the way through JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Number of decimal places kept.
    pub const SCALE: u32 = 2;

    /// Validate a decimal amount.
    ///
    /// Trailing zeros beyond two places are accepted (`1.500` becomes `1.50`).
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] for zero, negative, over-precise, or
    /// out-of-range amounts.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        let normalized = amount.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(PriceError::TooPrecise);
        }
        if normalized > max_amount() {
            return Err(PriceError::TooLarge);
        }
        let mut fixed = normalized;
        fixed.rescale(Self::SCALE);
        Ok(Self(fixed))
    }

    /// Build a price from an integer number of cents.
    ///
    /// # Errors
    ///
    /// Same as [`Price::new`].
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, Self::SCALE))
    }

    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }
}

/// Largest value a `numeric(12,2)` column holds.
fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, Price::SCALE)
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_accepts_positive_two_places() {
        let price = Price::new(dec("1500.5")).unwrap();
        assert_eq!(price.to_string(), "1500.50");
        assert_eq!(price.amount().scale(), 2);
    }

    #[test]
    fn test_trailing_zeros_are_not_precision() {
        assert_eq!(Price::new(dec("2.500")).unwrap().to_string(), "2.50");
    }

    #[test]
    fn test_rejects_zero_and_negative() {
        assert_eq!(Price::new(Decimal::ZERO), Err(PriceError::NotPositive));
        assert_eq!(Price::new(dec("-3")), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_rejects_sub_cent() {
        assert_eq!(Price::new(dec("0.001")), Err(PriceError::TooPrecise));
    }

    #[test]
    fn test_rejects_too_large() {
        assert!(Price::new(dec("9999999999.99")).is_ok());
        assert_eq!(
            Price::new(dec("10000000000")),
            Err(PriceError::TooLarge)
        );
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(1999).unwrap().to_string(), "19.99");
    }

    #[test]
    fn test_json_uses_string_amounts() {
        let price: Price = serde_json::from_str("\"12.30\"").unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"12.30\"");
        assert!(serde_json::from_str::<Price>("\"0\"").is_err());
    }
}
