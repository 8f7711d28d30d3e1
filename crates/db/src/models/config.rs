use serde::Serialize;
use sqlx::FromRow;
use dex_core::types::Timestamp;

/// Config key naming the featured entry id.
pub const CONFIG_FEATURED: &str = "featured";

/// A row from the `config` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConfigValue {
    pub name: String,
    pub value: String,
    pub updated_at: Timestamp,
}
