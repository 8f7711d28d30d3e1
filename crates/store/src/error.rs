use dex_core::error::CoreError;
use dex_events::AuditError;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The audit sink rejected a record the operation depends on.
    #[error(transparent)]
    Audit(#[from] AuditError),
}
