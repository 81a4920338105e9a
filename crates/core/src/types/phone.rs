//! Local phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a phone number is not in `XXXX-XXXX` form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("phone number must use the format XXXX-XXXX")]
pub struct PhoneError;

/// An eight digit local phone number written as `XXXX-XXXX`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Parse a phone number, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] unless the input is four ASCII digits, a dash,
    /// and four more ASCII digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        let (head, tail) = trimmed.split_once('-').ok_or(PhoneError)?;

        let is_block = |part: &str| part.len() == 4 && part.bytes().all(|b| b.is_ascii_digit());
        if !is_block(head) || !is_block(tail) {
            return Err(PhoneError);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_dashed_eight_digits() {
        assert!(Phone::parse("8888-1234").is_ok());
        assert!(Phone::parse(" 2222-0000 ").is_ok());
    }

    #[test]
    fn test_rejects_other_shapes() {
        for bad in ["88881234", "888-81234", "8888-123", "abcd-efgh", "8888-12345", "", "-"] {
            assert_eq!(Phone::parse(bad), Err(PhoneError), "{bad:?}");
        }
    }

    #[test]
    fn test_rejects_non_ascii_digits() {
        // Arabic-indic digits are numeric but not ASCII
        assert!(Phone::parse("٨٨٨٨-١٢٣٤").is_err());
    }
}
