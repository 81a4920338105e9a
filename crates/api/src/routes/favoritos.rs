//! Favorite route handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use reubica_core::{ComercioId, FavoriteKind, FavoriteTarget, ProductId};

use crate::db::{FavoriteRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{Json, Query};
use crate::middleware::RequireUser;
use crate::models::FavoriteEntry;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub kind: FavoriteKind,
    pub product_id: Option<ProductId>,
    pub comercio_id: Option<ComercioId>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub favorited: bool,
}

#[derive(Debug, Deserialize)]
pub struct KindQuery {
    pub kind: Option<FavoriteKind>,
}

/// Add or remove a favorite.
///
/// POST /api/favoritos/toggle
///
/// 201 when the favorite was added, 200 when it was removed.
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<ToggleRequest>,
) -> Result<impl IntoResponse> {
    let target = FavoriteTarget::from_parts(req.kind, req.product_id, req.comercio_id)?;

    let favorited = FavoriteRepository::new(state.pool())
        .toggle(user.id, target)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("{} not found", target.kind())),
            other => other.into(),
        })?;

    let status = if favorited {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ToggleResponse { favorited })))
}

/// List the caller's favorites.
///
/// GET /api/favoritos?kind=producto|comercio
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<FavoriteEntry>>> {
    Ok(Json(
        FavoriteRepository::new(state.pool())
            .list_for_user(user.id, query.kind)
            .await?,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_request_kinds() {
        let req: ToggleRequest = serde_json::from_str(
            r#"{"kind":"comercio","comercio_id":"6f1c3c8e-7d2a-4d55-9a51-2f2f0b7d9a10"}"#,
        )
        .unwrap();
        assert_eq!(req.kind, FavoriteKind::Comercio);
        assert!(req.product_id.is_none());

        assert!(serde_json::from_str::<ToggleRequest>(r#"{"kind":"tienda"}"#).is_err());
    }

    #[test]
    fn test_both_ids_is_bad_request() {
        let req: ToggleRequest = serde_json::from_str(
            r#"{"kind":"producto",
                "product_id":"6f1c3c8e-7d2a-4d55-9a51-2f2f0b7d9a10",
                "comercio_id":"0b6d1f9e-3c4a-4e1b-8f2d-9a7c5e3b1d20"}"#,
        )
        .unwrap();
        let err: AppError = FavoriteTarget::from_parts(req.kind, req.product_id, req.comercio_id)
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
