use axum::routing::{get, put};
use axum::Router;

use crate::handlers::me;
use crate::state::AppState;

/// Current-user routes, registered as `/me`.
///
/// ```text
/// GET    /                  get_me
/// PUT    /personal-entry    set_my_personal_entry
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(me::get_me))
        .route("/personal-entry", put(me::set_my_personal_entry))
}
