//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use reubica_core::{ComercioId, Price, ProductId};

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub comercio_id: ComercioId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub comercio_id: ComercioId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub image_url: Option<Option<String>>,
}

impl ProductChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image_url.is_none()
    }
}
