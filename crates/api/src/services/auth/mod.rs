//! Authentication service.
//!
//! Password registration and login, plus the reset-code flow. Reset codes
//! are never stored in clear: the database only holds an HMAC-SHA256 of
//! the email and code keyed by the configured pepper.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use sqlx::PgPool;

use reubica_core::{Email, ResetCode, validate_password, validate_password_pair};

use crate::db::{RepositoryError, ResetTokenRepository, UserRepository};
use crate::models::{NewUser, User};

type HmacSha256 = Hmac<Sha256>;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    reset_tokens: ResetTokenRepository<'a>,
    pepper: &'a SecretString,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, pepper: &'a SecretString) -> Self {
        Self {
            users: UserRepository::new(pool),
            reset_tokens: ResetTokenRepository::new(pool),
            pepper,
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password fails the policy or
    /// does not match its confirmation.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        new_user: &NewUser,
        password: &str,
        confirmation: &str,
    ) -> Result<User, AuthError> {
        validate_password_pair(password, confirmation)?;
        let password_hash = hash_password(password)?;

        self.users
            .create(new_user, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// Unknown emails and wrong passwords fail the same way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(&Email::normalized(email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Issue a reset code for `email` if an account exists.
    ///
    /// Returns the clear code so the caller can hand it to a delivery
    /// channel, or `None` when no account matches.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn issue_reset_code(&self, email: &Email) -> Result<Option<ResetCode>, AuthError> {
        if self.users.get_by_email(email).await?.is_none() {
            return Ok(None);
        }

        let code = ResetCode::generate();
        let code_hash = hash_reset_code(self.pepper, email.as_str(), &code);
        self.reset_tokens.issue(email.as_str(), &code_hash).await?;

        Ok(Some(code))
    }

    /// Replace the password of `email` using a previously issued code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedResetCode` if the code is not six digits.
    /// Returns `AuthError::WeakPassword` if the new password fails the policy.
    /// Returns `AuthError::InvalidResetCode` if no live code matches.
    pub async fn reset_password(
        &self,
        email: &Email,
        code: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<(), AuthError> {
        let code = ResetCode::parse(code)?;
        validate_password_pair(password, confirmation)?;

        let code_hash = hash_reset_code(self.pepper, email.as_str(), &code);
        let password_hash = hash_password(password)?;

        self.reset_tokens
            .consume_and_set_password(email.as_str(), &code_hash, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::InvalidResetCode,
                other => AuthError::Repository(other),
            })
    }
}

/// Hash a password using Argon2id after checking it against the policy.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password fails the policy.
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_new_password(password: &str) -> Result<String, AuthError> {
    validate_password(password)?;
    hash_password(password)
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Keyed hash of a reset code, bound to the email it was issued for.
fn hash_reset_code(pepper: &SecretString, email: &str, code: &ResetCode) -> String {
    let mut mac = HmacSha256::new_from_slice(pepper.expose_secret().as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(email.as_bytes());
    mac.update(b":");
    mac.update(code.as_str().as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pepper() -> SecretString {
        SecretString::from("kP9$wQ2!zR7@mT4#vX8&nB3*yH6^cL1%")
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("Secreto#2024").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Secreto#2024", &hash).is_ok());
        assert!(matches!(
            verify_password("secreto#2024", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hash_new_password_applies_policy() {
        assert!(matches!(
            hash_new_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(hash_new_password("Secreto#2024").is_ok());
    }

    #[test]
    fn test_reset_code_hash_is_deterministic_hex() {
        let code = ResetCode::parse("012345").unwrap();
        let a = hash_reset_code(&pepper(), "ana@example.com", &code);
        let b = hash_reset_code(&pepper(), "ana@example.com", &code);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_reset_code_hash_depends_on_email_and_key() {
        let code = ResetCode::parse("012345").unwrap();
        let base = hash_reset_code(&pepper(), "ana@example.com", &code);
        assert_ne!(base, hash_reset_code(&pepper(), "bob@example.com", &code));
        let other_key = SecretString::from("Zx8!Qm3@Lp6#Vn1$Rt5%Wy7^Hb2&Kd4*");
        assert_ne!(base, hash_reset_code(&other_key, "ana@example.com", &code));
    }
}
