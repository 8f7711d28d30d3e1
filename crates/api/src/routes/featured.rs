use axum::routing::get;
use axum::Router;

use crate::handlers::featured;
use crate::state::AppState;

/// Featured pointer, registered as `/featured`.
///
/// ```text
/// GET    /    get_featured
/// PUT    /    set_featured     (admin)
/// DELETE /    clear_featured   (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(featured::get_featured)
            .put(featured::set_featured)
            .delete(featured::clear_featured),
    )
}
