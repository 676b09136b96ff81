//! Ledger error types.

use lazyhire_core::{ApplicationId, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid record: {0}")]
    Invalid(#[from] ValidationError),

    /// A row of a bulk insert was rejected; the whole batch was rolled back.
    #[error("row {index} rejected, batch rolled back: {reason}")]
    RowRejected { index: usize, reason: String },

    #[error("application {0} not found")]
    NotFound(ApplicationId),

    #[error("corrupt row {id}: {reason}")]
    Corrupt { id: ApplicationId, reason: String },
}
