//! Entry row model and write DTO.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use dex_core::entry::{HistoryItem, ImageField};
use dex_core::types::{EntryId, Timestamp, UserId};

/// A row from the `entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Entry {
    pub id: EntryId,
    pub title: String,
    pub content: String,
    /// Plain-text projection of `content`; `None` on rows that predate it.
    pub nohtml_content: Option<String>,
    pub image: Option<Json<ImageField>>,
    pub unlisted: bool,
    pub owner_id: Option<UserId>,
    pub last_edited: Option<Timestamp>,
    /// Forward log of applied edits, oldest first.
    pub history: Json<Vec<HistoryItem>>,
}

impl Entry {
    pub fn image_field(&self) -> Option<&ImageField> {
        self.image.as_ref().map(|json| &json.0)
    }

    pub fn history(&self) -> &[HistoryItem] {
        &self.history.0
    }
}

/// Result of an upsert: the written row and whether it was freshly inserted.
#[derive(Debug, Clone, FromRow)]
pub struct UpsertedEntry {
    #[sqlx(flatten)]
    pub entry: Entry,
    pub created: bool,
}

/// Fully computed values for one edit. The caller has already validated and
/// normalized everything; the repository only writes.
#[derive(Debug, Clone)]
pub struct EntryWrite {
    pub id: EntryId,
    pub title: String,
    pub content: String,
    pub nohtml_content: String,
    /// Replace the stored image with `image` (which may be `None`).
    pub replace_image: bool,
    pub image: Option<ImageField>,
    pub unlisted: bool,
    pub edited_at: Timestamp,
    /// Appended to `history`.
    pub history_item: HistoryItem,
}
