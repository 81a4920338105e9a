//! Product and rating route handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use reubica_core::access;
use reubica_core::{ComercioId, Price, ProductId, RatingScore, UserRole};

use super::comercios::NameQuery;
use super::validate::{self, MAX_DESCRIPTION_LEN, MAX_NAME_LEN, nullable};
use crate::db::{ComercioRepository, ProductRepository, RatingRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::{NewProduct, NewRating, Product, ProductChanges, ProductRatings, Rating};
use crate::state::AppState;

/// Roles that may create and manage products.
const SELLERS: [UserRole; 2] = [UserRole::Emprendedor, UserRole::Admin];

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    /// Required for admins; ignored for emprendedores, whose own comercio
    /// is used.
    pub comercio_id: Option<ComercioId>,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRatingRequest {
    pub score: f64,
    pub comment: Option<String>,
}

// =============================================================================
// Listing and Search
// =============================================================================

/// List all products.
///
/// GET /api/productos
pub async fn list(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductRepository::new(state.pool()).list_all().await?))
}

/// Search products by name.
///
/// GET /api/productos/search?nombre=
pub async fn search(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<Product>>> {
    let term = validate::search_term("nombre", query.nombre.as_deref())?;
    Ok(Json(
        ProductRepository::new(state.pool())
            .search_by_name(&term)
            .await?,
    ))
}

/// Products of one comercio.
///
/// GET /api/productos/comercio/{id}
pub async fn by_comercio(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Path(comercio_id): Path<ComercioId>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        ProductRepository::new(state.pool())
            .list_by_comercio(comercio_id)
            .await?,
    ))
}

/// Ratings of every product in a comercio, grouped by product.
///
/// GET /api/productos/comercio/{id}/ratings
pub async fn comercio_ratings(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Path(comercio_id): Path<ComercioId>,
) -> Result<Json<Vec<ProductRatings>>> {
    let products = ProductRepository::new(state.pool())
        .list_by_comercio(comercio_id)
        .await?;
    if products.is_empty() {
        return Err(AppError::NotFound(
            "this comercio has no products".to_string(),
        ));
    }

    let ratings = RatingRepository::new(state.pool())
        .list_by_comercio(comercio_id)
        .await?;

    Ok(Json(group_ratings(products, ratings)))
}

/// Get one product.
///
/// GET /api/productos/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

// =============================================================================
// Management
// =============================================================================

/// Create a product.
///
/// POST /api/productos
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse> {
    let actor = user.actor();
    access::require_role(&actor, &SELLERS)?;

    let comercios = ComercioRepository::new(state.pool());
    let comercio = if actor.is_admin() {
        let id = req.comercio_id.ok_or_else(|| {
            AppError::BadRequest("comercio_id is required for administrators".to_string())
        })?;
        comercios
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("comercio not found".to_string()))?
    } else {
        comercios.get_by_owner(user.id).await?.ok_or_else(|| {
            AppError::BadRequest("you must register a comercio before adding products".to_string())
        })?
    };
    access::manage_comercio(&actor, comercio.owner_id)?;

    let new = NewProduct {
        comercio_id: comercio.id,
        name: validate::required_text("name", &req.name, MAX_NAME_LEN)?,
        description: validate::required_text(
            "description",
            &req.description,
            MAX_DESCRIPTION_LEN,
        )?,
        price: Price::new(req.price)?,
        image_url: validate::optional_url("image_url", req.image_url.as_deref())?,
    };

    let product = ProductRepository::new(state.pool()).create(&new).await?;
    tracing::info!(product_id = %product.id, comercio_id = %comercio.id, "product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product.
///
/// PUT /api/productos/{id}
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<ProductId>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    let actor = user.actor();
    access::require_role(&actor, &SELLERS)?;

    let products = ProductRepository::new(state.pool());
    let (_, owner) = products.get_with_owner(id).await?.ok_or_else(not_found)?;
    access::manage_product(&actor, owner)?;

    let changes = build_changes(req)?;
    let updated = products.update(id, &changes).await.map_err(|e| match e {
        RepositoryError::NotFound => not_found(),
        other => other.into(),
    })?;

    Ok(Json(updated))
}

/// Delete a product.
///
/// DELETE /api/productos/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    let actor = user.actor();
    access::require_role(&actor, &SELLERS)?;

    let products = ProductRepository::new(state.pool());
    let (_, owner) = products.get_with_owner(id).await?.ok_or_else(not_found)?;
    access::manage_product(&actor, owner)?;

    if !products.delete(id).await? {
        return Err(not_found());
    }
    tracing::info!(product_id = %id, "product deleted");

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Ratings
// =============================================================================

/// Rate a product.
///
/// POST /api/productos/{id}/ratings
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn rate(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
    Json(req): Json<CreateRatingRequest>,
) -> Result<impl IntoResponse> {
    if ProductRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .is_none()
    {
        return Err(not_found());
    }

    let new = NewRating {
        user_id: user.id,
        product_id,
        score: RatingScore::new(req.score)?,
        comment: validate::optional_text("comment", req.comment.as_deref(), MAX_DESCRIPTION_LEN)?,
    };

    let rating = RatingRepository::new(state.pool())
        .create(&new)
        .await
        .map_err(|e| match e {
            // The product was deleted between the check and the insert.
            RepositoryError::Database(sqlx::Error::Database(ref db))
                if db.is_foreign_key_violation() =>
            {
                not_found()
            }
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(rating)))
}

/// Remove the caller's rating of a product.
///
/// DELETE /api/productos/{id}/ratings
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn unrate(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    let removed = RatingRepository::new(state.pool())
        .delete_for_user(user.id, product_id)
        .await?;
    if !removed {
        return Err(AppError::NotFound(
            "you have not rated this product".to_string(),
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

fn not_found() -> AppError {
    AppError::NotFound("product not found".to_string())
}

fn build_changes(req: UpdateProductRequest) -> Result<ProductChanges> {
    let changes = ProductChanges {
        name: req
            .name
            .as_deref()
            .map(|v| validate::required_text("name", v, MAX_NAME_LEN))
            .transpose()?,
        description: req
            .description
            .as_deref()
            .map(|v| validate::required_text("description", v, MAX_DESCRIPTION_LEN))
            .transpose()?,
        price: req.price.map(Price::new).transpose()?,
        image_url: validate::patch_url("image_url", req.image_url.as_ref().map(Option::as_deref))?,
    };

    if changes.is_empty() {
        return Err(AppError::BadRequest("no fields to update".to_string()));
    }
    Ok(changes)
}

/// Group ratings under their products, keeping product order. Products
/// without ratings get an empty list.
fn group_ratings(products: Vec<Product>, ratings: Vec<Rating>) -> Vec<ProductRatings> {
    let mut grouped: Vec<ProductRatings> = products
        .into_iter()
        .map(|p| ProductRatings {
            product_id: p.id,
            name: p.name,
            ratings: Vec::new(),
        })
        .collect();

    for rating in ratings {
        if let Some(entry) = grouped.iter_mut().find(|g| g.product_id == rating.product_id) {
            entry.ratings.push(rating);
        }
    }
    grouped
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use reubica_core::{RatingId, UserId};

    use super::*;

    fn product(name: &str) -> Product {
        Product {
            id: ProductId::generate(),
            comercio_id: ComercioId::generate(),
            name: name.to_owned(),
            description: "rico".to_owned(),
            price: Price::from_cents(1500).unwrap(),
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn rating(product_id: ProductId, score: f64) -> Rating {
        Rating {
            id: RatingId::generate(),
            user_id: UserId::generate(),
            product_id,
            score: RatingScore::new(score).unwrap(),
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_ratings_keeps_products_without_ratings() {
        let cafe = product("Café");
        let pan = product("Pan");
        let ratings = vec![rating(pan.id, 4.0), rating(pan.id, 5.0)];

        let grouped = group_ratings(vec![cafe.clone(), pan.clone()], ratings);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].product_id, cafe.id);
        assert!(grouped[0].ratings.is_empty());
        assert_eq!(grouped[1].name, "Pan");
        assert_eq!(grouped[1].ratings.len(), 2);
    }

    #[test]
    fn test_update_rejects_non_positive_price() {
        let req: UpdateProductRequest = serde_json::from_str(r#"{"price":"0"}"#).unwrap();
        assert!(matches!(build_changes(req), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_update_accepts_numeric_price() {
        let req: UpdateProductRequest = serde_json::from_str(r#"{"price":12.5}"#).unwrap();
        let changes = build_changes(req).unwrap();
        assert_eq!(changes.price.unwrap().to_string(), "12.50");
    }

    #[test]
    fn test_empty_update_is_rejected() {
        let req: UpdateProductRequest = serde_json::from_str("{}").unwrap();
        assert!(matches!(build_changes(req), Err(AppError::BadRequest(_))));
    }
}
