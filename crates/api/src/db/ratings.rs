//! Rating repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use reubica_core::{ComercioId, ProductId, RatingId, RatingScore, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{NewRating, Rating};

/// Internal row type for `PostgreSQL` rating queries.
#[derive(Debug, sqlx::FromRow)]
struct RatingRow {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    score: f64,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = RepositoryError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        let score = RatingScore::new(row.score).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid score in database: {e}"))
        })?;

        Ok(Self {
            id: RatingId::new(row.id),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            score,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

/// Repository for rating database operations.
pub struct RatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already rated the product.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewRating) -> Result<Rating, RepositoryError> {
        let row = sqlx::query_as::<_, RatingRow>(
            r"
            INSERT INTO reubica.rating (id, user_id, product_id, score, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, product_id, score, comment, created_at
            ",
        )
        .bind(RatingId::generate())
        .bind(new.user_id)
        .bind(new.product_id)
        .bind(new.score.value())
        .bind(new.comment.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(conflict_on_unique("you have already rated this product"))?;

        row.try_into()
    }

    /// Remove a user's rating of a product.
    ///
    /// # Returns
    ///
    /// Returns `true` if a rating was deleted, `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_for_user(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM reubica.rating WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Every rating of every product in a comercio, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_by_comercio(
        &self,
        comercio_id: ComercioId,
    ) -> Result<Vec<Rating>, RepositoryError> {
        let rows = sqlx::query_as::<_, RatingRow>(
            r"
            SELECT r.id, r.user_id, r.product_id, r.score, r.comment, r.created_at
            FROM reubica.rating r
            JOIN reubica.product p ON p.id = r.product_id
            WHERE p.comercio_id = $1
            ORDER BY r.created_at DESC
            ",
        )
        .bind(comercio_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
