//! Route definitions for admin-only user management.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Admin routes, registered as `/admin`.
///
/// ```text
/// GET    /users                        list_users
/// PUT    /users/{id}/personal-entry    set_user_personal_entry
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}/personal-entry",
            put(admin::set_user_personal_entry),
        )
}
