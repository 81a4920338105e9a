//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use reubica_core::access;
use reubica_core::{Email, Phone, UserId, UserRole};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{NewUser, User, UserChanges};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    role: String,
    icon_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let phone = Phone::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;
        let role = row
            .role
            .parse::<UserRole>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: UserId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            phone,
            role,
            icon_url: row.icon_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Row type for login lookups, carrying the password hash.
#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, first_name, last_name, email, phone, role::text AS role,
                   icon_url, created_at, updated_at
            FROM reubica.user_account
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, first_name, last_name, email, phone, role::text AS role,
                   icon_url, created_at, updated_at
            FROM reubica.user_account
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, first_name, last_name, email, phone, role::text AS role,
                   icon_url, created_at, updated_at
            FROM reubica.user_account
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user and their password hash by normalized email.
    ///
    /// Takes a raw string so malformed input simply finds nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        normalized_email: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT id, first_name, last_name, email, phone, role::text AS role,
                   icon_url, created_at, updated_at, password_hash
            FROM reubica.user_account
            WHERE email = $1
            ",
        )
        .bind(normalized_email)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user = User::try_from(row.user)?;
        Ok(Some((user, row.password_hash)))
    }

    /// Create a user with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        new_user: &NewUser,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO reubica.user_account
                (id, first_name, last_name, email, password_hash, phone, role, icon_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7::reubica.user_role, $8)
            RETURNING id, first_name, last_name, email, phone, role::text AS role,
                      icon_url, created_at, updated_at
            ",
        )
        .bind(UserId::generate())
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.email)
        .bind(password_hash)
        .bind(new_user.phone.as_str())
        .bind(new_user.role.as_str())
        .bind(new_user.icon_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(conflict_on_unique("email already exists"))?;

        row.try_into()
    }

    /// Apply a partial update and return the updated user.
    ///
    /// A role change runs in one transaction: the account row is locked and
    /// its comercios counted so the new role cannot end up owning more than
    /// it may.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new email is taken or the
    /// new role conflicts with the comercios the user owns.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(role) = changes.role {
            sqlx::query("SELECT id FROM reubica.user_account WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

            let owned: i64 =
                sqlx::query_scalar("SELECT count(*) FROM reubica.comercio WHERE owner_id = $1")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;

            access::change_role(role, owned)
                .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
        }

        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE reubica.user_account SET
                first_name = COALESCE($2, first_name),
                last_name  = COALESCE($3, last_name),
                email      = COALESCE($4, email),
                phone      = COALESCE($5, phone),
                role       = COALESCE($6::text::reubica.user_role, role),
                icon_url   = CASE WHEN $7 THEN $8 ELSE icon_url END
            WHERE id = $1
            RETURNING id, first_name, last_name, email, phone, role::text AS role,
                      icon_url, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .bind(changes.email.as_ref().map(Email::as_str))
        .bind(changes.phone.as_ref().map(Phone::as_str))
        .bind(changes.role.map(UserRole::as_str))
        .bind(changes.icon_url.is_some())
        .bind(changes.icon_url.clone().flatten())
        .fetch_optional(&mut *tx)
        .await
        .map_err(conflict_on_unique("email already exists"))?;

        let user: User = row.ok_or(RepositoryError::NotFound)?.try_into()?;
        tx.commit().await?;
        Ok(user)
    }

    /// Delete a user. Owned comercios, products, ratings and favorites
    /// cascade.
    ///
    /// # Returns
    ///
    /// Returns `true` if the user was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM reubica.user_account WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
