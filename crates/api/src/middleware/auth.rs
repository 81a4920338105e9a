//! Authentication extractors.
//!
//! The session only stores who logged in. Both extractors reload the account
//! on every request so role changes and deletions apply immediately.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use reubica_core::UserRole;

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentUser, User, session_keys};
use crate::state::AppState;

/// Extractor that requires a logged-in user.
///
/// Rejects with 401 when there is no session or the account no longer
/// exists.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(RequireUser(user): RequireUser) -> Json<User> {
///     Json(user)
/// }
/// ```
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let current = logged_in_as(session.get(session_keys::CURRENT_USER).await)?;

        let Some(user) = UserRepository::new(state.pool()).get_by_id(current.id).await? else {
            tracing::debug!(user_id = %current.id, "session refers to a deleted account");
            if let Err(e) = session.flush().await {
                tracing::warn!(error = %e, "failed to drop session of a deleted account");
            }
            return Err(not_logged_in());
        };

        set_sentry_user(&user.id, None);
        Ok(Self(user))
    }
}

/// Extractor that requires a logged-in admin.
///
/// Rejects with 401 when not logged in and 403 for other roles.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        reubica_core::access::require_role(&user.actor(), &[UserRole::Admin])?;
        Ok(Self(user))
    }
}

fn not_logged_in() -> AppError {
    AppError::Unauthorized("authentication required".to_string())
}

/// A missing entry means nobody is logged in; a store failure is ours.
fn logged_in_as(
    stored: Result<Option<CurrentUser>, tower_sessions::session::Error>,
) -> Result<CurrentUser, AppError> {
    stored
        .map_err(|e| AppError::Internal(format!("session store error: {e}")))?
        .ok_or_else(not_logged_in)
}

/// Store the logged-in user in the session.
///
/// The session ID is cycled first so a pre-login ID cannot be fixed.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Drop the whole session (logout, account deletion).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted from the store.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_session_is_unauthorized() {
        assert!(matches!(logged_in_as(Ok(None)), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_session_store_failure_is_internal() {
        let err: tower_sessions::session::Error =
            serde_json::from_str::<CurrentUser>("not json").unwrap_err().into();
        assert!(matches!(logged_in_as(Err(err)), Err(AppError::Internal(_))));
    }
}
