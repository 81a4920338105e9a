//! One-time password reset codes.

use core::fmt;

use rand::Rng;

/// Number of digits in a reset code.
pub const RESET_CODE_LENGTH: usize = 6;

/// Error returned for input that is not exactly six ASCII digits.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("reset code must be exactly {len} digits", len = RESET_CODE_LENGTH)]
pub struct ResetCodeError;

/// A six digit reset code, kept as text so leading zeros survive.
///
/// `Debug` does not print the digits.
#[derive(Clone, PartialEq, Eq)]
pub struct ResetCode(String);

impl ResetCode {
    /// Parse a code supplied by a user.
    ///
    /// # Errors
    ///
    /// Returns [`ResetCodeError`] unless the trimmed input is six ASCII digits.
    pub fn parse(s: &str) -> Result<Self, ResetCodeError> {
        let trimmed = s.trim();
        if trimmed.len() == RESET_CODE_LENGTH && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(ResetCodeError)
        }
    }

    /// Generate a uniformly random code from the thread-local RNG.
    #[must_use]
    pub fn generate() -> Self {
        let n: u32 = rand::rng().random_range(0..1_000_000);
        Self(format!("{n:06}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ResetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResetCode(******)")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_six_digits() {
        for _ in 0..200 {
            let code = ResetCode::generate();
            assert!(ResetCode::parse(code.as_str()).is_ok(), "{}", code.as_str());
        }
    }

    #[test]
    fn test_parse_keeps_leading_zeros() {
        assert_eq!(ResetCode::parse(" 004211 ").unwrap().as_str(), "004211");
    }

    #[test]
    fn test_parse_rejects() {
        for bad in ["12345", "1234567", "12a456", "", "12 456"] {
            assert_eq!(ResetCode::parse(bad), Err(ResetCodeError), "{bad:?}");
        }
    }

    #[test]
    fn test_debug_hides_code() {
        let code = ResetCode::parse("123456").unwrap();
        assert!(!format!("{code:?}").contains("123456"));
    }
}
