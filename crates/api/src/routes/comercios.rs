//! Comercio (storefront) route handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use reubica_core::access;
use reubica_core::{CategorySelection, ComercioId, Phone, PrincipalCategory, UserRole};

use super::validate::{
    self, MAX_ADDRESS_LEN, MAX_DESCRIPTION_LEN, MAX_NAME_LEN, nullable,
};
use crate::db::{ComercioRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{Json, Path, Query};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::{Comercio, ComercioChanges, NewComercio, User};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateComercioRequest {
    pub name: String,
    pub description: Option<String>,
    pub principal_categories: Vec<String>,
    pub secondary_categories: Vec<String>,
    pub logo_url: Option<String>,
    pub opening_hours: Option<Value>,
    pub address: String,
    pub phone: Option<String>,
    pub social_links: Option<Value>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Partial update. Clearable fields accept `null`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateComercioRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub principal_categories: Option<Vec<String>>,
    pub secondary_categories: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub logo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub opening_hours: Option<Option<Value>>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub social_links: Option<Option<Value>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub nombre: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub categoria: Option<String>,
}

// =============================================================================
// Listing and Search
// =============================================================================

/// List all comercios.
///
/// GET /api/comercios
pub async fn list(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
) -> Result<Json<Vec<Comercio>>> {
    Ok(Json(ComercioRepository::new(state.pool()).list_all().await?))
}

/// Search comercios by name.
///
/// GET /api/comercios/search?nombre=
pub async fn search(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<Comercio>>> {
    let term = validate::search_term("nombre", query.nombre.as_deref())?;
    Ok(Json(
        ComercioRepository::new(state.pool())
            .search_by_name(&term)
            .await?,
    ))
}

/// Comercios listing a principal category. Public.
///
/// GET /api/comercios/categoria?categoria=
pub async fn by_category(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<Comercio>>> {
    let raw = query
        .categoria
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("categoria is required".to_string()))?;
    let category = PrincipalCategory::parse(raw)?;

    Ok(Json(
        ComercioRepository::new(state.pool())
            .list_by_principal(category)
            .await?,
    ))
}

// =============================================================================
// Registration
// =============================================================================

/// Register a comercio owned by the caller.
///
/// POST /api/comercios
///
/// A `cliente` becomes an `emprendedor` in the same transaction.
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<CreateComercioRequest>,
) -> Result<impl IntoResponse> {
    let actor = user.actor();
    access::require_role(
        &actor,
        &[UserRole::Admin, UserRole::Cliente, UserRole::Emprendedor],
    )?;

    let new = NewComercio {
        owner_id: user.id,
        name: validate::required_text("name", &req.name, MAX_NAME_LEN)?,
        description: validate::optional_text(
            "description",
            req.description.as_deref(),
            MAX_DESCRIPTION_LEN,
        )?,
        categories: CategorySelection::validate(
            &req.principal_categories,
            &req.secondary_categories,
        )?,
        logo_url: validate::optional_url("logo_url", req.logo_url.as_deref())?,
        opening_hours: json_object("opening_hours", req.opening_hours)?,
        address: validate::required_text("address", &req.address, MAX_ADDRESS_LEN)?,
        phone: optional_phone(req.phone.as_deref())?,
        social_links: json_object("social_links", req.social_links)?,
        latitude: validate::latitude(req.latitude)?,
        longitude: validate::longitude(req.longitude)?,
    };

    let comercio = ComercioRepository::new(state.pool())
        .create_for_owner(&actor, &new)
        .await?;

    add_breadcrumb("comercios", "Registered comercio", None);
    tracing::info!(comercio_id = %comercio.id, "comercio registered");

    Ok((StatusCode::CREATED, Json(comercio)))
}

// =============================================================================
// Self-Service Routes
// =============================================================================

/// The caller's own comercio.
///
/// GET /api/comercios/mine
pub async fn mine(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Comercio>> {
    access::require_role(&user.actor(), &[UserRole::Emprendedor])?;
    Ok(Json(own_comercio(&state, &user).await?))
}

/// Update the caller's own comercio.
///
/// PUT /api/comercios/mine
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn update_mine(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<UpdateComercioRequest>,
) -> Result<Json<Comercio>> {
    access::require_role(&user.actor(), &[UserRole::Emprendedor])?;
    let current = own_comercio(&state, &user).await?;
    apply_update(&state, &current, req).await.map(Json)
}

/// Delete the caller's own comercio and its products.
///
/// DELETE /api/comercios/mine
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_mine(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<StatusCode> {
    access::require_role(&user.actor(), &[UserRole::Emprendedor])?;
    let current = own_comercio(&state, &user).await?;

    ComercioRepository::new(state.pool()).delete(current.id).await?;
    tracing::info!(comercio_id = %current.id, "comercio deleted by owner");

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Admin Routes
// =============================================================================

/// Get one comercio.
///
/// GET /api/comercios/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ComercioId>,
) -> Result<Json<Comercio>> {
    find(&state, id).await.map(Json)
}

/// Update any comercio.
///
/// PUT /api/comercios/{id}
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ComercioId>,
    Json(req): Json<UpdateComercioRequest>,
) -> Result<Json<Comercio>> {
    let current = find(&state, id).await?;
    access::manage_comercio(&admin.actor(), current.owner_id)?;
    apply_update(&state, &current, req).await.map(Json)
}

/// Delete any comercio.
///
/// DELETE /api/comercios/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ComercioId>,
) -> Result<StatusCode> {
    if !ComercioRepository::new(state.pool()).delete(id).await? {
        return Err(not_found());
    }
    tracing::info!(comercio_id = %id, "comercio deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

fn not_found() -> AppError {
    AppError::NotFound("comercio not found".to_string())
}

async fn find(state: &AppState, id: ComercioId) -> Result<Comercio> {
    ComercioRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(not_found)
}

async fn own_comercio(state: &AppState, user: &User) -> Result<Comercio> {
    ComercioRepository::new(state.pool())
        .get_by_owner(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("you do not have a registered comercio".to_string()))
}

async fn apply_update(
    state: &AppState,
    current: &Comercio,
    req: UpdateComercioRequest,
) -> Result<Comercio> {
    let changes = build_changes(current, req)?;
    if changes_are_empty(&changes) {
        return Err(AppError::BadRequest("no fields to update".to_string()));
    }

    ComercioRepository::new(state.pool())
        .update(current.id, &changes)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => not_found(),
            other => other.into(),
        })
}

/// Validate a patch against the stored comercio.
///
/// Category changes are validated as a whole: a patch that sends only one
/// of the two lists is checked against the stored value of the other.
fn build_changes(current: &Comercio, req: UpdateComercioRequest) -> Result<ComercioChanges> {
    let categories = match (req.principal_categories, req.secondary_categories) {
        (None, None) => None,
        (principals, secondaries) => {
            let principals = principals.unwrap_or_else(|| {
                current
                    .principal_categories
                    .iter()
                    .map(|p| p.slug().to_owned())
                    .collect()
            });
            let secondaries =
                secondaries.unwrap_or_else(|| current.secondary_categories.clone());
            Some(CategorySelection::validate(&principals, &secondaries)?)
        }
    };

    Ok(ComercioChanges {
        name: req
            .name
            .as_deref()
            .map(|v| validate::required_text("name", v, MAX_NAME_LEN))
            .transpose()?,
        description: validate::patch_text(
            "description",
            req.description.as_ref().map(Option::as_deref),
            MAX_DESCRIPTION_LEN,
        )?,
        categories,
        logo_url: validate::patch_url("logo_url", req.logo_url.as_ref().map(Option::as_deref))?,
        opening_hours: req
            .opening_hours
            .map(|v| json_object("opening_hours", v))
            .transpose()?,
        address: req
            .address
            .as_deref()
            .map(|v| validate::required_text("address", v, MAX_ADDRESS_LEN))
            .transpose()?,
        phone: req
            .phone
            .as_ref()
            .map(|v| optional_phone(v.as_deref()))
            .transpose()?,
        social_links: req
            .social_links
            .map(|v| json_object("social_links", v))
            .transpose()?,
        latitude: req.latitude.map(validate::latitude).transpose()?,
        longitude: req.longitude.map(validate::longitude).transpose()?,
    })
}

const fn changes_are_empty(changes: &ComercioChanges) -> bool {
    changes.name.is_none()
        && changes.description.is_none()
        && changes.categories.is_none()
        && changes.logo_url.is_none()
        && changes.opening_hours.is_none()
        && changes.address.is_none()
        && changes.phone.is_none()
        && changes.social_links.is_none()
        && changes.latitude.is_none()
        && changes.longitude.is_none()
}

fn optional_phone(value: Option<&str>) -> Result<Option<Phone>> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Ok(Some(Phone::parse(raw)?)),
        None => Ok(None),
    }
}

/// Opening hours and social links are free-form JSON objects.
fn json_object(field: &str, value: Option<Value>) -> Result<Option<Value>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(obj @ Value::Object(_)) => Ok(Some(obj)),
        Some(_) => Err(AppError::BadRequest(format!("{field} must be a JSON object"))),
    }
}
