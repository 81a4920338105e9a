//! Comercio repository for database operations.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use reubica_core::access::{self, Actor};
use reubica_core::{ComercioId, Phone, PrincipalCategory, UserId, UserRole};

use super::{RepositoryError, conflict_on_unique, contains_pattern};
use crate::models::{Comercio, ComercioChanges, NewComercio};

const DUPLICATE_NAME: &str = "a comercio with this name already exists";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` comercio queries.
#[derive(Debug, sqlx::FromRow)]
struct ComercioRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    description: Option<String>,
    principal_categories: Vec<String>,
    secondary_categories: Vec<String>,
    logo_url: Option<String>,
    opening_hours: Option<Value>,
    address: String,
    phone: Option<String>,
    social_links: Option<Value>,
    latitude: f64,
    longitude: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ComercioRow> for Comercio {
    type Error = RepositoryError;

    fn try_from(row: ComercioRow) -> Result<Self, Self::Error> {
        let principal_categories = row
            .principal_categories
            .iter()
            .map(|slug| PrincipalCategory::parse(slug))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid category in database: {e}"))
            })?;
        let phone = row
            .phone
            .as_deref()
            .map(Phone::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
            })?;

        Ok(Self {
            id: ComercioId::new(row.id),
            owner_id: UserId::new(row.owner_id),
            name: row.name,
            description: row.description,
            principal_categories,
            secondary_categories: row.secondary_categories,
            logo_url: row.logo_url,
            opening_hours: row.opening_hours,
            address: row.address,
            phone,
            social_links: row.social_links,
            latitude: row.latitude,
            longitude: row.longitude,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for comercio database operations.
pub struct ComercioRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ComercioRepository<'a> {
    /// Create a new comercio repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all comercios by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<Comercio>, RepositoryError> {
        let rows = sqlx::query_as::<_, ComercioRow>(
            r"
            SELECT id, owner_id, name, description, principal_categories,
                   secondary_categories, logo_url, opening_hours, address, phone,
                   social_links, latitude, longitude, created_at, updated_at
            FROM reubica.comercio
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a comercio by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: ComercioId) -> Result<Option<Comercio>, RepositoryError> {
        let row = sqlx::query_as::<_, ComercioRow>(
            r"
            SELECT id, owner_id, name, description, principal_categories,
                   secondary_categories, logo_url, opening_hours, address, phone,
                   social_links, latitude, longitude, created_at, updated_at
            FROM reubica.comercio
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get the comercio owned by a user.
    ///
    /// Non-admins own at most one. For admins this returns the oldest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_owner(&self, owner: UserId) -> Result<Option<Comercio>, RepositoryError> {
        let row = sqlx::query_as::<_, ComercioRow>(
            r"
            SELECT id, owner_id, name, description, principal_categories,
                   secondary_categories, logo_url, opening_hours, address, phone,
                   social_links, latitude, longitude, created_at, updated_at
            FROM reubica.comercio
            WHERE owner_id = $1
            ORDER BY created_at
            LIMIT 1
            ",
        )
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Case-insensitive substring search on the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn search_by_name(&self, term: &str) -> Result<Vec<Comercio>, RepositoryError> {
        let rows = sqlx::query_as::<_, ComercioRow>(
            r"
            SELECT id, owner_id, name, description, principal_categories,
                   secondary_categories, logo_url, opening_hours, address, phone,
                   social_links, latitude, longitude, created_at, updated_at
            FROM reubica.comercio
            WHERE name ILIKE $1
            ORDER BY name
            ",
        )
        .bind(contains_pattern(term))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Comercios that list `category` among their principal categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_by_principal(
        &self,
        category: PrincipalCategory,
    ) -> Result<Vec<Comercio>, RepositoryError> {
        let rows = sqlx::query_as::<_, ComercioRow>(
            r"
            SELECT id, owner_id, name, description, principal_categories,
                   secondary_categories, logo_url, opening_hours, address, phone,
                   social_links, latitude, longitude, created_at, updated_at
            FROM reubica.comercio
            WHERE principal_categories @> ARRAY[$1]::text[]
            ORDER BY name
            ",
        )
        .bind(category.slug())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Comercios a user has favorited.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_favorited_by(&self, user_id: UserId) -> Result<Vec<Comercio>, RepositoryError> {
        let rows = sqlx::query_as::<_, ComercioRow>(
            r"
            SELECT c.id, c.owner_id, c.name, c.description, c.principal_categories,
                   c.secondary_categories, c.logo_url, c.opening_hours, c.address, c.phone,
                   c.social_links, c.latitude, c.longitude, c.created_at, c.updated_at
            FROM reubica.comercio c
            JOIN reubica.favorite f ON f.comercio_id = c.id
            WHERE f.user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Register a comercio on behalf of `actor`.
    ///
    /// Runs in one transaction: the owner's account row is locked so two
    /// concurrent registrations cannot both pass the one-comercio check, and
    /// a `cliente` owner is promoted to `emprendedor`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner account is gone.
    /// Returns `RepositoryError::Conflict` for a duplicate name or a second
    /// comercio for a non-admin.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_for_owner(
        &self,
        actor: &Actor,
        new: &NewComercio,
    ) -> Result<Comercio, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM reubica.user_account WHERE id = $1 FOR UPDATE")
            .bind(new.owner_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let owned: i64 =
            sqlx::query_scalar("SELECT count(*) FROM reubica.comercio WHERE owner_id = $1")
                .bind(new.owner_id)
                .fetch_one(&mut *tx)
                .await?;

        access::register_comercio(actor, owned)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        let row = sqlx::query_as::<_, ComercioRow>(
            r"
            INSERT INTO reubica.comercio
                (id, owner_id, name, description, principal_categories,
                 secondary_categories, logo_url, opening_hours, address, phone,
                 social_links, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, owner_id, name, description, principal_categories,
                      secondary_categories, logo_url, opening_hours, address, phone,
                      social_links, latitude, longitude, created_at, updated_at
            ",
        )
        .bind(ComercioId::generate())
        .bind(new.owner_id)
        .bind(&new.name)
        .bind(new.description.as_deref())
        .bind(new.categories.principal_slugs())
        .bind(new.categories.secondaries())
        .bind(new.logo_url.as_deref())
        .bind(new.opening_hours.as_ref())
        .bind(&new.address)
        .bind(new.phone.as_ref().map(Phone::as_str))
        .bind(new.social_links.as_ref())
        .bind(new.latitude)
        .bind(new.longitude)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique(DUPLICATE_NAME))?;

        if actor.role == UserRole::Cliente {
            sqlx::query(
                r"
                UPDATE reubica.user_account
                SET role = 'emprendedor'
                WHERE id = $1 AND role = 'cliente'
                ",
            )
            .bind(new.owner_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        row.try_into()
    }

    /// Apply a partial update and return the updated comercio.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comercio doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ComercioId,
        changes: &ComercioChanges,
    ) -> Result<Comercio, RepositoryError> {
        let (principals, secondaries) = changes
            .categories
            .as_ref()
            .map(|c| (c.principal_slugs(), c.secondaries().to_vec()))
            .unzip();

        let row = sqlx::query_as::<_, ComercioRow>(
            r"
            UPDATE reubica.comercio SET
                name                 = COALESCE($2, name),
                description          = CASE WHEN $3 THEN $4 ELSE description END,
                principal_categories = COALESCE($5, principal_categories),
                secondary_categories = COALESCE($6, secondary_categories),
                logo_url             = CASE WHEN $7 THEN $8 ELSE logo_url END,
                opening_hours        = CASE WHEN $9 THEN $10 ELSE opening_hours END,
                address              = COALESCE($11, address),
                phone                = CASE WHEN $12 THEN $13 ELSE phone END,
                social_links         = CASE WHEN $14 THEN $15 ELSE social_links END,
                latitude             = COALESCE($16, latitude),
                longitude            = COALESCE($17, longitude)
            WHERE id = $1
            RETURNING id, owner_id, name, description, principal_categories,
                      secondary_categories, logo_url, opening_hours, address, phone,
                      social_links, latitude, longitude, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.description.is_some())
        .bind(changes.description.clone().flatten())
        .bind(principals)
        .bind(secondaries)
        .bind(changes.logo_url.is_some())
        .bind(changes.logo_url.clone().flatten())
        .bind(changes.opening_hours.is_some())
        .bind(changes.opening_hours.clone().flatten())
        .bind(changes.address.as_deref())
        .bind(changes.phone.is_some())
        .bind(changes.phone.clone().flatten().map(String::from))
        .bind(changes.social_links.is_some())
        .bind(changes.social_links.clone().flatten())
        .bind(changes.latitude)
        .bind(changes.longitude)
        .fetch_optional(self.pool)
        .await
        .map_err(conflict_on_unique(DUPLICATE_NAME))?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a comercio; its products, their ratings and any favorites
    /// pointing at them cascade.
    ///
    /// # Returns
    ///
    /// Returns `true` if the comercio was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ComercioId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM reubica.comercio WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
