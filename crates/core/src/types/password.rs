//! Password strength policy.

use thiserror::Error;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that count as "special" for the policy.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Ways a password can fail the policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must be at least {min} characters", min = MIN_PASSWORD_LENGTH)]
    TooShort,
    #[error("password must contain at least one upper-case letter")]
    MissingUppercase,
    #[error("password must contain at least one number")]
    MissingDigit,
    #[error("password must contain at least one special character")]
    MissingSpecial,
    #[error("passwords do not match")]
    Mismatch,
}

/// Check a password against the policy.
///
/// # Errors
///
/// Returns the first rule the password violates.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(PasswordError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::MissingDigit);
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        return Err(PasswordError::MissingSpecial);
    }
    Ok(())
}

/// Check a password and its confirmation together.
///
/// # Errors
///
/// Returns [`PasswordError::Mismatch`] if the two differ, otherwise any
/// policy violation.
pub fn validate_password_pair(password: &str, confirmation: &str) -> Result<(), PasswordError> {
    validate_password(password)?;
    if password != confirmation {
        return Err(PasswordError::Mismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        assert_eq!(validate_password("Mercado2024!"), Ok(()));
    }

    #[test]
    fn test_each_rule() {
        assert_eq!(validate_password("Ab1!"), Err(PasswordError::TooShort));
        assert_eq!(
            validate_password("mercado2024!"),
            Err(PasswordError::MissingUppercase)
        );
        assert_eq!(
            validate_password("Mercadito!"),
            Err(PasswordError::MissingDigit)
        );
        assert_eq!(
            validate_password("Mercado2024"),
            Err(PasswordError::MissingSpecial)
        );
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // Seven characters, more than eight bytes
        assert_eq!(validate_password("Ñañ1!éé"), Err(PasswordError::TooShort));
    }

    #[test]
    fn test_pair_mismatch() {
        assert_eq!(
            validate_password_pair("Mercado2024!", "Mercado2024?"),
            Err(PasswordError::Mismatch)
        );
        assert_eq!(validate_password_pair("Mercado2024!", "Mercado2024!"), Ok(()));
    }
}
