//! User account route handlers.
//!
//! Registration, login and password reset are public. Everything else needs
//! a session; `/me` is self-service and `/{id}` goes through the access
//! policy.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use reubica_core::access::{self, UpdatableUserFields};
use reubica_core::{Email, Phone, UserId, UserRole};

use super::validate::{self, MAX_NAME_LEN, nullable};
use crate::db::{RepositoryError, UserRepository};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::{Json, Path};
use crate::middleware::{RequireAdmin, RequireUser, clear_current_user, set_current_user};
use crate::models::{CurrentUser, NewUser, User, UserChanges};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Returned by the reset-code endpoint whether or not the account exists.
const RESET_CODE_SENT: &str =
    "if an account exists for that email, a reset code has been issued";

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    pub role: Option<UserRole>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetCodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub password: String,
    pub confirm_password: String,
}

/// Profile changes. Which fields a caller may send depends on their role.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    #[serde(default, deserialize_with = "nullable")]
    pub icon_url: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// =============================================================================
// Public Routes
// =============================================================================

/// Register a new account and log it in.
///
/// POST /api/users/register
#[instrument(skip(state, session, req))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let role = req.role.unwrap_or_default();
    if !UserRole::SELF_REGISTRABLE.contains(&role) {
        return Err(AppError::BadRequest(
            "role must be cliente or emprendedor".to_string(),
        ));
    }

    let new_user = NewUser {
        first_name: validate::required_text("first_name", &req.first_name, MAX_NAME_LEN)?,
        last_name: validate::required_text("last_name", &req.last_name, MAX_NAME_LEN)?,
        email: Email::parse(&req.email)?,
        phone: Phone::parse(&req.phone)?,
        role,
        icon_url: validate::optional_url("icon_url", req.icon_url.as_deref())?,
    };

    let user = AuthService::new(state.pool(), &state.config().reset_code_pepper)
        .register(&new_user, &req.password, &req.confirm_password)
        .await?;

    log_in(&session, &user).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "user registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password.
///
/// POST /api/users/login
#[instrument(skip(state, session, req))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool(), &state.config().reset_code_pepper)
        .login(&req.email, &req.password)
        .await
        .inspect_err(|_| tracing::info!("login failed"))?;

    log_in(&session, &user).await?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(user))
}

/// End the session.
///
/// POST /api/users/logout
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// Issue a password reset code.
///
/// POST /api/users/password/reset-code
///
/// Always answers the same way so the endpoint cannot be used to probe for
/// accounts. There is no delivery channel; the code is only logged at
/// debug level.
#[instrument(skip(state, req))]
pub async fn request_reset_code(
    State(state): State<AppState>,
    Json(req): Json<ResetCodeRequest>,
) -> Result<Json<MessageResponse>> {
    let email = Email::parse(&req.email)?;

    let issued = AuthService::new(state.pool(), &state.config().reset_code_pepper)
        .issue_reset_code(&email)
        .await?;

    if let Some(code) = issued {
        tracing::debug!(email = %email, code = code.as_str(), "password reset code issued");
    }

    Ok(Json(MessageResponse {
        message: RESET_CODE_SENT,
    }))
}

/// Set a new password using a reset code.
///
/// POST /api/users/password/reset
#[instrument(skip(state, req))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let email = Email::parse(&req.email)?;

    AuthService::new(state.pool(), &state.config().reset_code_pepper)
        .reset_password(&email, &req.code, &req.password, &req.confirm_password)
        .await?;

    tracing::info!("password reset with code");

    Ok(Json(MessageResponse {
        message: "password updated",
    }))
}

// =============================================================================
// Admin Routes
// =============================================================================

/// List every account.
///
/// GET /api/users
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    Ok(Json(UserRepository::new(state.pool()).list_all().await?))
}

// =============================================================================
// Self-Service Routes
// =============================================================================

/// The caller's own profile.
///
/// GET /api/users/me
pub async fn me(RequireUser(user): RequireUser) -> Json<User> {
    Json(user)
}

/// Update the caller's own phone or icon.
///
/// PUT /api/users/me
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    access::require_role(&user.actor(), &UserRole::SELF_REGISTRABLE)?;

    let changes = build_changes(user.role, req)?;
    let updated = UserRepository::new(state.pool())
        .update(user.id, &changes)
        .await?;

    Ok(Json(updated))
}

/// Delete the caller's own account and end the session.
///
/// DELETE /api/users/me
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn delete_me(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
) -> Result<StatusCode> {
    access::require_role(&user.actor(), &UserRole::SELF_REGISTRABLE)?;

    UserRepository::new(state.pool()).delete(user.id).await?;
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    tracing::info!("account deleted by owner");

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// By-ID Routes
// =============================================================================

/// Get one account.
///
/// GET /api/users/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    access::view_user(&user.actor(), id)?;

    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))
}

/// Update an account.
///
/// PUT /api/users/{id}
#[instrument(skip(state, user, req), fields(actor_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<UserId>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    access::update_user(&user.actor(), id)?;

    let changes = build_changes(user.role, req)?;
    let updated = UserRepository::new(state.pool())
        .update(id, &changes)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("user not found".to_string()),
            other => other.into(),
        })?;

    tracing::info!(target_id = %id, "user updated");
    Ok(Json(updated))
}

/// Delete an account.
///
/// DELETE /api/users/{id}
#[instrument(skip(state, session, user), fields(actor_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    access::delete_user(&user.actor(), id)?;

    if !UserRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound("user not found".to_string()));
    }

    if id == user.id {
        clear_current_user(&session)
            .await
            .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
        clear_sentry_user();
    }

    tracing::info!(target_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

async fn log_in(session: &Session, user: &User) -> Result<()> {
    set_current_user(
        session,
        &CurrentUser {
            id: user.id,
            role: user.role,
        },
    )
    .await
    .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Validate a profile update against what `role` may change.
fn build_changes(role: UserRole, req: UpdateUserRequest) -> Result<UserChanges> {
    let allowed = UpdatableUserFields::for_role(role);
    let refuse = |field: &str| {
        Err(AppError::Forbidden(format!(
            "your role cannot change the field {field}"
        )))
    };

    if !allowed.names && (req.first_name.is_some() || req.last_name.is_some()) {
        return refuse("first_name/last_name");
    }
    if !allowed.email && req.email.is_some() {
        return refuse("email");
    }
    if !allowed.role && req.role.is_some() {
        return refuse("role");
    }
    if !allowed.phone && req.phone.is_some() {
        return refuse("phone");
    }
    if !allowed.icon && req.icon_url.is_some() {
        return refuse("icon_url");
    }

    let changes = UserChanges {
        first_name: req
            .first_name
            .as_deref()
            .map(|v| validate::required_text("first_name", v, MAX_NAME_LEN))
            .transpose()?,
        last_name: req
            .last_name
            .as_deref()
            .map(|v| validate::required_text("last_name", v, MAX_NAME_LEN))
            .transpose()?,
        email: req.email.as_deref().map(Email::parse).transpose()?,
        phone: req.phone.as_deref().map(Phone::parse).transpose()?,
        role: req.role,
        icon_url: validate::patch_url(
            "icon_url",
            req.icon_url.as_ref().map(Option::as_deref),
        )?,
    };

    if changes.is_empty() {
        return Err(AppError::BadRequest("no fields to update".to_string()));
    }
    Ok(changes)
}
