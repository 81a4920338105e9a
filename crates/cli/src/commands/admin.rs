//! Admin account management.
//!
//! Admins cannot self-register through the API, so they are created here.
//!
//! # Environment Variables
//!
//! - `REUBICA_DATABASE_URL` - `PostgreSQL` connection string
//! - `REUBICA_ADMIN_PASSWORD` - Password for the new account (kept out of
//!   shell history and process listings)

use reubica_api::db::{RepositoryError, UserRepository};
use reubica_api::models::NewUser;
use reubica_api::routes::validate::{MAX_NAME_LEN, required_text};
use reubica_api::services::auth::{AuthError, hash_new_password};
use reubica_core::{Email, EmailError, Phone, PhoneError, UserRole};
use thiserror::Error;

use super::{ConnectError, connect};

const PASSWORD_VAR: &str = "REUBICA_ADMIN_PASSWORD";

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid phone: {0}")]
    InvalidPhone(#[from] PhoneError),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid password: {0}")]
    Password(#[from] AuthError),

    #[error("A user already exists with email: {0}")]
    UserExists(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

/// Create a new admin account.
///
/// # Returns
///
/// The new account's id.
pub async fn create_user(
    email: &str,
    first_name: &str,
    last_name: &str,
    phone: &str,
) -> Result<String, AdminError> {
    dotenvy::dotenv().ok();

    let new_user = validate(email, first_name, last_name, phone)?;

    let password =
        std::env::var(PASSWORD_VAR).map_err(|_| AdminError::MissingEnvVar(PASSWORD_VAR))?;
    let password_hash = hash_new_password(&password)?;

    let pool = connect().await?;

    tracing::info!("Creating admin user: {}", new_user.email);
    let user = UserRepository::new(&pool)
        .create(&new_user, &password_hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(new_user.email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(user_id = %user.id, "Admin user created successfully!");
    Ok(user.id.to_string())
}

fn validate(
    email: &str,
    first_name: &str,
    last_name: &str,
    phone: &str,
) -> Result<NewUser, AdminError> {
    let name = |field: &str, value: &str| {
        required_text(field, value, MAX_NAME_LEN).map_err(|e| AdminError::InvalidName(e.to_string()))
    };

    Ok(NewUser {
        first_name: name("first_name", first_name)?,
        last_name: name("last_name", last_name)?,
        email: Email::parse(email)?,
        phone: Phone::parse(phone)?,
        role: UserRole::Admin,
        icon_url: None,
    })
}
