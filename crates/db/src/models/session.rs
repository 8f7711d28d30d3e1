//! Login session model.

use sqlx::FromRow;
use dex_core::types::{Timestamp, UserId};

/// A row from the `sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token_hash: String,
    pub user_id: UserId,
    pub created_at: Timestamp,
}
