//! Rating domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use reubica_core::{ProductId, RatingId, RatingScore, UserId};

#[derive(Debug, Clone, Serialize)]
pub struct Rating {
    pub id: RatingId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub score: RatingScore,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRating {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub score: RatingScore,
    pub comment: Option<String>,
}

/// Ratings of one product, as listed per comercio.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRatings {
    pub product_id: ProductId,
    pub name: String,
    pub ratings: Vec<Rating>,
}
