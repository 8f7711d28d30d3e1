//! Repository for the `user_preferences` table.

use sqlx::PgPool;
use dex_core::types::UserId;

use crate::models::user_preference::UserPreference;

const COLUMNS: &str = "user_id, personal_entry, updated_at";

pub struct UserPreferenceRepo;

impl UserPreferenceRepo {
    pub async fn find(pool: &PgPool, user_id: UserId) -> Result<Option<UserPreference>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_preferences WHERE user_id = $1");
        sqlx::query_as::<_, UserPreference>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Create or replace the user's personal entry pointer.
    pub async fn set_personal_entry(
        pool: &PgPool,
        user_id: UserId,
        entry_id: Option<&str>,
    ) -> Result<UserPreference, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_preferences (user_id, personal_entry)
             VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET
                personal_entry = EXCLUDED.personal_entry,
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserPreference>(&query)
            .bind(user_id)
            .bind(entry_id)
            .fetch_one(pool)
            .await
    }
}
