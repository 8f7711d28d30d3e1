//! Repository for the `sessions` table.

use sqlx::PgPool;
use dex_core::types::UserId;

use crate::models::session::Session;

const COLUMNS: &str = "token_hash, user_id, created_at";

/// Login sessions keyed by the SHA-256 digest of their token.
pub struct SessionRepo;

impl SessionRepo {
    pub async fn create(
        pool: &PgPool,
        token_hash: &str,
        user_id: UserId,
    ) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (token_hash, user_id) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(token_hash)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_token_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE token_hash = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }
}
