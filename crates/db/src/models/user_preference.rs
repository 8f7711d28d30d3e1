use serde::Serialize;
use sqlx::FromRow;
use dex_core::types::{EntryId, Timestamp, UserId};

/// A row from the `user_preferences` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserPreference {
    pub user_id: UserId,
    /// The user's designated personal entry.
    pub personal_entry: Option<EntryId>,
    pub updated_at: Timestamp,
}
