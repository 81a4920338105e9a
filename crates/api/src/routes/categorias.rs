//! Category taxonomy listing.
//!
//! Public so clients can build the comercio registration form.

use reubica_core::{CategoryListing, PrincipalCategory, categories_for, taxonomy};

use crate::error::Result;
use crate::extract::{Json, Path};

/// GET /api/categorias
pub async fn list() -> Json<Vec<CategoryListing>> {
    Json(taxonomy())
}

/// Secondary categories of one principal category.
///
/// GET /api/categorias/{principal}
pub async fn show(Path(principal): Path<String>) -> Result<Json<CategoryListing>> {
    let principal = PrincipalCategory::parse(&principal)?;
    Ok(Json(categories_for(principal)))
}
