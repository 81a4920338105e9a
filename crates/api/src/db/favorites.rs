//! Favorite repository for database operations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use reubica_core::{
    ComercioId, FavoriteId, FavoriteKind, FavoriteTarget, ProductId, UserId,
};

use super::{ComercioRepository, ProductRepository, RepositoryError};
use crate::models::FavoriteEntry;

/// Internal row type for `PostgreSQL` favorite queries.
#[derive(Debug, sqlx::FromRow)]
struct FavoriteRow {
    id: Uuid,
    target_kind: String,
    product_id: Option<Uuid>,
    comercio_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

/// A favorite row with a validated target.
struct StoredFavorite {
    id: FavoriteId,
    target: FavoriteTarget,
    created_at: DateTime<Utc>,
}

impl TryFrom<FavoriteRow> for StoredFavorite {
    type Error = RepositoryError;

    fn try_from(row: FavoriteRow) -> Result<Self, Self::Error> {
        let kind = row
            .target_kind
            .parse::<FavoriteKind>()
            .map_err(RepositoryError::DataCorruption)?;
        let target = FavoriteTarget::from_parts(
            kind,
            row.product_id.map(ProductId::new),
            row.comercio_id.map(ComercioId::new),
        )
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid favorite target: {e}")))?;

        Ok(Self {
            id: FavoriteId::new(row.id),
            target,
            created_at: row.created_at,
        })
    }
}

/// Repository for favorite database operations.
pub struct FavoriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add the favorite if absent, remove it if present.
    ///
    /// # Returns
    ///
    /// Returns `true` if the target is now a favorite, `false` if it was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the target disappeared meanwhile.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn toggle(
        &self,
        user_id: UserId,
        target: FavoriteTarget,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            r"
            DELETE FROM reubica.favorite
            WHERE user_id = $1
              AND product_id IS NOT DISTINCT FROM $2
              AND comercio_id IS NOT DISTINCT FROM $3
            ",
        )
        .bind(user_id)
        .bind(target.product_id())
        .bind(target.comercio_id())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            sqlx::query(
                r"
                INSERT INTO reubica.favorite (id, user_id, target_kind, product_id, comercio_id)
                VALUES ($1, $2, $3::text::reubica.favorite_kind, $4, $5)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(FavoriteId::generate())
            .bind(user_id)
            .bind(target.kind().to_string())
            .bind(target.product_id())
            .bind(target.comercio_id())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::NotFound;
                }
                RepositoryError::Database(e)
            })?;
        }

        tx.commit().await?;

        Ok(removed == 0)
    }

    /// A user's favorites, newest first, each with its product or comercio.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        kind: Option<FavoriteKind>,
    ) -> Result<Vec<FavoriteEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, FavoriteRow>(
            r"
            SELECT id, target_kind::text AS target_kind, product_id, comercio_id, created_at
            FROM reubica.favorite
            WHERE user_id = $1
              AND ($2::text IS NULL OR target_kind = $2::text::reubica.favorite_kind)
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .bind(kind.map(|k| k.to_string()))
        .fetch_all(self.pool)
        .await?;

        let favorites = rows
            .into_iter()
            .map(StoredFavorite::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut products: HashMap<ProductId, _> =
            if kind.is_none_or(|k| k == FavoriteKind::Producto) {
                ProductRepository::new(self.pool)
                    .list_favorited_by(user_id)
                    .await?
                    .into_iter()
                    .map(|p| (p.id, p))
                    .collect()
            } else {
                HashMap::new()
            };
        let mut comercios: HashMap<ComercioId, _> =
            if kind.is_none_or(|k| k == FavoriteKind::Comercio) {
                ComercioRepository::new(self.pool)
                    .list_favorited_by(user_id)
                    .await?
                    .into_iter()
                    .map(|c| (c.id, c))
                    .collect()
            } else {
                HashMap::new()
            };

        Ok(favorites
            .into_iter()
            .map(|fav| FavoriteEntry {
                id: fav.id,
                kind: fav.target.kind(),
                created_at: fav.created_at,
                product: fav.target.product_id().and_then(|id| products.remove(&id)),
                comercio: fav.target.comercio_id().and_then(|id| comercios.remove(&id)),
            })
            .collect())
    }
}
