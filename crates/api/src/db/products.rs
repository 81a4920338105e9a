//! Product repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use reubica_core::{ComercioId, Price, ProductId, UserId};

use super::{RepositoryError, conflict_on_unique, contains_pattern};
use crate::models::{NewProduct, Product, ProductChanges};

const DUPLICATE_NAME: &str = "this comercio already has a product with that name";

/// Internal row type for `PostgreSQL` product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    comercio_id: Uuid,
    name: String,
    description: String,
    price: Decimal,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            comercio_id: ComercioId::new(row.comercio_id),
            name: row.name,
            description: row.description,
            price,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Product row joined with the owner of its comercio.
#[derive(Debug, sqlx::FromRow)]
struct OwnedProductRow {
    #[sqlx(flatten)]
    product: ProductRow,
    owner_id: Uuid,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, comercio_id, name, description, price, image_url,
                   created_at, updated_at
            FROM reubica.product
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, comercio_id, name, description, price, image_url,
                   created_at, updated_at
            FROM reubica.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a product together with the user who owns its comercio.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_with_owner(
        &self,
        id: ProductId,
    ) -> Result<Option<(Product, UserId)>, RepositoryError> {
        let row = sqlx::query_as::<_, OwnedProductRow>(
            r"
            SELECT p.id, p.comercio_id, p.name, p.description, p.price, p.image_url,
                   p.created_at, p.updated_at, c.owner_id
            FROM reubica.product p
            JOIN reubica.comercio c ON c.id = p.comercio_id
            WHERE p.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let owner = UserId::new(row.owner_id);
        Ok(Some((row.product.try_into()?, owner)))
    }

    /// Products of one comercio, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_by_comercio(
        &self,
        comercio_id: ComercioId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, comercio_id, name, description, price, image_url,
                   created_at, updated_at
            FROM reubica.product
            WHERE comercio_id = $1
            ORDER BY name
            ",
        )
        .bind(comercio_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Case-insensitive substring search on the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn search_by_name(&self, term: &str) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, comercio_id, name, description, price, image_url,
                   created_at, updated_at
            FROM reubica.product
            WHERE name ILIKE $1
            ORDER BY name
            ",
        )
        .bind(contains_pattern(term))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Products a user has favorited.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_favorited_by(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT p.id, p.comercio_id, p.name, p.description, p.price, p.image_url,
                   p.created_at, p.updated_at
            FROM reubica.product p
            JOIN reubica.favorite f ON f.product_id = p.id
            WHERE f.user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the comercio already has a
    /// product with this name.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO reubica.product (id, comercio_id, name, description, price, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, comercio_id, name, description, price, image_url,
                      created_at, updated_at
            ",
        )
        .bind(ProductId::generate())
        .bind(new.comercio_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price.amount())
        .bind(new.image_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(conflict_on_unique(DUPLICATE_NAME))?;

        row.try_into()
    }

    /// Apply a partial update and return the updated product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken in the comercio.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE reubica.product SET
                name        = COALESCE($2, name),
                description = COALESCE($3, description),
                price       = COALESCE($4, price),
                image_url   = CASE WHEN $5 THEN $6 ELSE image_url END
            WHERE id = $1
            RETURNING id, comercio_id, name, description, price, image_url,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.price.map(Price::amount))
        .bind(changes.image_url.is_some())
        .bind(changes.image_url.clone().flatten())
        .fetch_optional(self.pool)
        .await
        .map_err(conflict_on_unique(DUPLICATE_NAME))?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a product.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM reubica.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
