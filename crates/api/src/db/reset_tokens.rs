//! Password reset code storage.
//!
//! Only the keyed hash of a code is stored. Issuing a code for an email
//! invalidates every earlier unused code for it, and a code is burnt after
//! [`MAX_FAILED_ATTEMPTS`] wrong guesses.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use reubica_core::ResetTokenId;

use super::RepositoryError;

/// How long an issued code stays valid.
pub const RESET_CODE_TTL_MINUTES: i64 = 10;

/// Wrong guesses tolerated before the live code of an email is invalidated.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

#[derive(Debug, sqlx::FromRow)]
struct LiveCodeRow {
    id: ResetTokenId,
    matches: bool,
}

/// Repository for password reset codes.
pub struct ResetTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ResetTokenRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new code hash for `email`, retiring any previous unused code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn issue(&self, email: &str, code_hash: &str) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE reubica.password_reset_token SET used = TRUE WHERE email = $1 AND NOT used",
        )
        .bind(email)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO reubica.password_reset_token (id, email, code_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(ResetTokenId::generate())
        .bind(email)
        .bind(code_hash)
        .bind(Utc::now() + Duration::minutes(RESET_CODE_TTL_MINUTES))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Spend a code and replace the account password in one transaction.
    ///
    /// The code must be unused, unexpired and issued for `email`. It is
    /// marked used only if the password change succeeds. A wrong guess is
    /// counted against the live code of `email` and the code is invalidated
    /// once [`MAX_FAILED_ATTEMPTS`] is reached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no matching live code exists
    /// or the account is gone.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn consume_and_set_password(
        &self,
        email: &str,
        code_hash: &str,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let live = sqlx::query_as::<_, LiveCodeRow>(
            r"
            SELECT id, code_hash = $2 AS matches
            FROM reubica.password_reset_token
            WHERE email = $1
              AND NOT used
              AND expires_at > now()
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            ",
        )
        .bind(email)
        .bind(code_hash)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !live.matches {
            sqlx::query(
                r"
                UPDATE reubica.password_reset_token
                SET failed_attempts = failed_attempts + 1,
                    used = failed_attempts + 1 >= $2
                WHERE id = $1
                ",
            )
            .bind(live.id)
            .bind(MAX_FAILED_ATTEMPTS)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("UPDATE reubica.password_reset_token SET used = TRUE WHERE id = $1")
            .bind(live.id)
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query(
            "UPDATE reubica.user_account SET password_hash = $2 WHERE email = $1",
        )
        .bind(email)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete codes that expired more than a day ago, and spent codes issued
    /// more than a day ago.
    ///
    /// # Returns
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn purge_stale(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM reubica.password_reset_token
            WHERE expires_at < now() - INTERVAL '1 day'
               OR (used AND created_at < now() - INTERVAL '1 day')
            ",
        )
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
