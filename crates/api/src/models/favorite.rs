//! Favorite domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use reubica_core::{FavoriteId, FavoriteKind};

use super::{Comercio, Product};

/// A favorite together with the product or comercio it points at.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteEntry {
    pub id: FavoriteId,
    pub kind: FavoriteKind,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comercio: Option<Comercio>,
}
