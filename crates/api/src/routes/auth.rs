use axum::routing::get;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Login routes, registered as `/auth`.
///
/// ```text
/// GET    /login       login
/// GET    /callback    callback
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
}
