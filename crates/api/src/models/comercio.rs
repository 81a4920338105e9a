//! Comercio (storefront) domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use reubica_core::{CategorySelection, ComercioId, Phone, PrincipalCategory, UserId};

/// A storefront owned by one user.
#[derive(Debug, Clone, Serialize)]
pub struct Comercio {
    pub id: ComercioId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub principal_categories: Vec<PrincipalCategory>,
    pub secondary_categories: Vec<String>,
    pub logo_url: Option<String>,
    pub opening_hours: Option<Value>,
    pub address: String,
    pub phone: Option<Phone>,
    pub social_links: Option<Value>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for registering a comercio.
#[derive(Debug, Clone)]
pub struct NewComercio {
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub categories: CategorySelection,
    pub logo_url: Option<String>,
    pub opening_hours: Option<Value>,
    pub address: String,
    pub phone: Option<Phone>,
    pub social_links: Option<Value>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Validated partial update. Optional columns use `Option<Option<_>>` so a
/// client can clear them with `null`.
#[derive(Debug, Clone, Default)]
pub struct ComercioChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub categories: Option<CategorySelection>,
    pub logo_url: Option<Option<String>>,
    pub opening_hours: Option<Option<Value>>,
    pub address: Option<String>,
    pub phone: Option<Option<Phone>>,
    pub social_links: Option<Option<Value>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
