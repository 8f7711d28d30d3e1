pub mod admin;
pub mod auth;
pub mod entries;
pub mod featured;
pub mod health;
pub mod me;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /home                                  landing page data
/// /website-title                         link preview lookup
///
/// /auth/login                            redirect to identity provider
/// /auth/callback                         OAuth callback, sets session cookie
///
/// /entries                               list, create (editor)
/// /entries/search                        resolve a query
/// /entries/random                        random listed entry
/// /entries/{name}                        get, edit (editor/owner), delete (admin)
/// /entries/{id}/history                  edit history, newest first
/// /entries/{id}/revert                   replay a history item (editor)
///
/// /featured                              get, set (admin), clear (admin)
///
/// /me                                    current user
/// /me/personal-entry                     assign own entry (editor)
///
/// /admin/users                           role lists (admin)
/// /admin/users/{id}/personal-entry       assign a user's entry (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(handlers::home::home))
        .route(
            "/website-title",
            get(handlers::website_title::website_title),
        )
        .nest("/auth", auth::router())
        .nest("/entries", entries::router())
        .nest("/featured", featured::router())
        .nest("/me", me::router())
        .nest("/admin", admin::router())
}
