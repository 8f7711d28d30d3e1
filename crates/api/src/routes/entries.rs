//! Route definitions for the `/entries` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::entries;
use crate::state::AppState;

/// Entry routes, registered as `/entries`.
///
/// ```text
/// GET    /                  list_entries
/// POST   /                  create_entry
/// GET    /search            search_entries
/// GET    /random            random_entry
/// GET    /{name}            get_entry
/// PUT    /{name}            update_entry
/// DELETE /{name}            delete_entry
/// GET    /{name}/history    get_history
/// POST   /{name}/revert     revert_entry
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(entries::list_entries).post(entries::create_entry))
        .route("/search", get(entries::search_entries))
        .route("/random", get(entries::random_entry))
        .route(
            "/{name}",
            get(entries::get_entry)
                .put(entries::update_entry)
                .delete(entries::delete_entry),
        )
        .route("/{name}/history", get(entries::get_history))
        .route("/{name}/revert", post(entries::revert_entry))
}
