//! Repository for the `config` key/value table.

use sqlx::PgPool;

use crate::models::config::ConfigValue;

const COLUMNS: &str = "name, value, updated_at";

pub struct ConfigRepo;

impl ConfigRepo {
    pub async fn get(pool: &PgPool, name: &str) -> Result<Option<ConfigValue>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM config WHERE name = $1");
        sqlx::query_as::<_, ConfigValue>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn set(pool: &PgPool, name: &str, value: &str) -> Result<ConfigValue, sqlx::Error> {
        let query = format!(
            "INSERT INTO config (name, value) VALUES ($1, $2)
             ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ConfigValue>(&query)
            .bind(name)
            .bind(value)
            .fetch_one(pool)
            .await
    }

    /// Remove a key. Returns `true` if it existed.
    pub async fn delete(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM config WHERE name = $1")
            .bind(name)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
