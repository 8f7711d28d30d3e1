use std::sync::Arc;

use dex_core::roles::RoleConfig;
use dex_store::EntryStore;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: dex_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub roles: Arc<RoleConfig>,
    pub store: Arc<EntryStore>,
    /// Outbound client for OAuth and page-title lookups.
    pub http: reqwest::Client,
}
