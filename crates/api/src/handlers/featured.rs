//! Handlers for the featured entry pointer.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use super::entries::EntryView;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::middleware::session::Viewer;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetFeaturedRequest {
    pub id: String,
}

/// GET /api/v1/featured
///
/// `data` is null when nothing is featured.
pub async fn get_featured(
    viewer: Viewer,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let entry = state.store.featured_entry().await?;
    Ok(Json(DataResponse {
        data: entry.map(|entry| EntryView::new(entry, &state, viewer.user_id())),
    }))
}

/// PUT /api/v1/featured
pub async fn set_featured(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<SetFeaturedRequest>,
) -> AppResult<StatusCode> {
    state.store.set_featured(&input.id).await?;
    tracing::info!(entry_id = %input.id, admin_id = admin.user_id, "Featured entry changed");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/featured
pub async fn clear_featured(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<StatusCode> {
    state.store.clear_featured().await?;
    Ok(StatusCode::NO_CONTENT)
}
