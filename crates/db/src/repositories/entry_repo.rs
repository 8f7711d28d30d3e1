//! Repository for the `entries` table.

use sqlx::types::Json;
use sqlx::PgPool;
use dex_core::entry::{EntrySort, ImageField};
use dex_core::search::RANK_WEIGHTS;
use dex_core::types::UserId;

use crate::models::entry::{Entry, EntryWrite, UpsertedEntry};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, title, content, nohtml_content, image, unlisted, owner_id, last_edited, history";

/// Queries and writes for wiki entries.
pub struct EntryRepo;

impl EntryRepo {
    // -- lookups ------------------------------------------------------------

    /// Weighted full-text search over title and plain-text content.
    ///
    /// `tsquery` must already be sanitized. Only rows whose `unlisted` flag
    /// equals `unlisted` are considered.
    pub async fn search(
        pool: &PgPool,
        tsquery: &str,
        unlisted: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entries
             WHERE search_vector @@ to_tsquery('english', $1) AND unlisted = $2
             ORDER BY ts_rank('{RANK_WEIGHTS}'::float4[], search_vector, to_tsquery('english', $1)) DESC,
                      last_edited DESC NULLS LAST, id
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Entry>(&query)
            .bind(tsquery)
            .bind(unlisted)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Find an entry by id, listed or not.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Entry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM entries WHERE id = $1");
        sqlx::query_as::<_, Entry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the entry owned by `owner_id`.
    pub async fn find_by_owner(
        pool: &PgPool,
        owner_id: UserId,
    ) -> Result<Option<Entry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM entries WHERE owner_id = $1");
        sqlx::query_as::<_, Entry>(&query)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Listed entries whose title equals `title` exactly (case-sensitive).
    ///
    /// Not paginated: a title match is returned whatever page the caller
    /// asked for.
    pub async fn find_listed_by_title(
        pool: &PgPool,
        title: &str,
        limit: i64,
    ) -> Result<Vec<Entry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entries
             WHERE title = $1 AND unlisted = false
             ORDER BY last_edited DESC NULLS LAST, id
             LIMIT $2"
        );
        sqlx::query_as::<_, Entry>(&query)
            .bind(title)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Listed entries, most recent (or alphabetically last) first.
    pub async fn list_listed(
        pool: &PgPool,
        sort: EntrySort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entries
             WHERE unlisted = false
             ORDER BY {} DESC NULLS LAST, id
             LIMIT $1 OFFSET $2",
            sort.column()
        );
        sqlx::query_as::<_, Entry>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_listed(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE unlisted = false")
            .fetch_one(pool)
            .await
    }

    /// One uniformly random listed entry.
    pub async fn sample_listed(pool: &PgPool) -> Result<Option<Entry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entries WHERE unlisted = false ORDER BY random() LIMIT 1"
        );
        sqlx::query_as::<_, Entry>(&query).fetch_optional(pool).await
    }

    // -- writes -------------------------------------------------------------

    /// Insert or update an entry and append one history item, in a single
    /// statement.
    ///
    /// The image column is only touched when `input.replace_image` is set.
    /// `created` is `true` when the row did not exist before.
    pub async fn upsert_edit(
        pool: &PgPool,
        input: &EntryWrite,
    ) -> Result<UpsertedEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO entries
                (id, title, content, nohtml_content, image, unlisted, last_edited, history)
             VALUES ($1, $2, $3, $4, $5, $6, $7, jsonb_build_array($8::jsonb))
             ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                content = EXCLUDED.content,
                nohtml_content = EXCLUDED.nohtml_content,
                image = CASE WHEN $9 THEN EXCLUDED.image ELSE entries.image END,
                unlisted = EXCLUDED.unlisted,
                last_edited = EXCLUDED.last_edited,
                history = entries.history || EXCLUDED.history
             RETURNING {COLUMNS}, (xmax = 0) AS created"
        );
        sqlx::query_as::<_, UpsertedEntry>(&query)
            .bind(&input.id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.nohtml_content)
            .bind(input.image.as_ref().map(Json))
            .bind(input.unlisted)
            .bind(input.edited_at)
            .bind(Json(&input.history_item))
            .bind(input.replace_image)
            .fetch_one(pool)
            .await
    }

    /// Persist values computed by normalize-on-read. `None` leaves a column
    /// untouched. Returns `true` if the row exists.
    pub async fn update_normalized(
        pool: &PgPool,
        id: &str,
        image: Option<&ImageField>,
        nohtml_content: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE entries SET
                image = COALESCE($2, image),
                nohtml_content = COALESCE($3, nohtml_content)
             WHERE id = $1",
        )
        .bind(id)
        .bind(image.map(Json))
        .bind(nohtml_content)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear ownership from whatever entry `owner_id` currently owns.
    /// Returns the number of rows changed (0 or 1).
    pub async fn clear_owner(pool: &PgPool, owner_id: UserId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE entries SET owner_id = NULL WHERE owner_id = $1")
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Mark `id` as owned by `owner_id`. Returns `false` if no such entry.
    pub async fn set_owner(pool: &PgPool, id: &str, owner_id: UserId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE entries SET owner_id = $2 WHERE id = $1")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete an entry. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
