//! Password reset code maintenance.

use reubica_api::db::{RepositoryError, ResetTokenRepository};
use thiserror::Error;

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum TokensError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Delete reset codes that expired more than a day ago.
pub async fn purge() -> Result<(), TokensError> {
    let pool = connect().await?;
    let removed = ResetTokenRepository::new(&pool).purge_stale().await?;
    tracing::info!(removed, "Expired reset codes purged");
    Ok(())
}
