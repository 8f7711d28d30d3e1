//! Admin-only handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use dex_core::types::UserId;

use super::entries::EntryView;
use super::me::{assign_personal_entry, PersonalEntryRequest};
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/users
///
/// The static role lists.
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.roles.as_ref().clone(),
    }))
}

/// PUT /api/v1/admin/users/{id}/personal-entry
pub async fn set_user_personal_entry(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(input): Json<PersonalEntryRequest>,
) -> AppResult<impl IntoResponse> {
    let entry = assign_personal_entry(&state, user_id, &input.query).await?;
    tracing::info!(user_id, entry_id = %entry.id, admin_id = admin.user_id, "Personal entry assigned");
    Ok(Json(DataResponse {
        data: EntryView::new(entry, &state, Some(admin.user_id)),
    }))
}
