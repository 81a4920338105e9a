//! Authentication error types.

use thiserror::Error;

use reubica_core::{EmailError, PasswordError, ResetCodeError};

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid email or password")]
    InvalidCredentials,

    /// User already exists.
    #[error("email already exists")]
    UserAlreadyExists,

    /// Password fails the policy or its confirmation.
    #[error("{0}")]
    WeakPassword(#[from] PasswordError),

    /// Malformed reset code.
    #[error("{0}")]
    MalformedResetCode(#[from] ResetCodeError),

    /// No live reset code matches.
    #[error("invalid or expired reset code")]
    InvalidResetCode,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
