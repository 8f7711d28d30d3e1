//! Handlers for the logged-in user's own profile.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use dex_core::error::CoreError;
use dex_core::types::UserId;
use serde::{Deserialize, Serialize};

use super::entries::EntryView;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireEditor;
use crate::middleware::session::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Profile {
    pub user_id: UserId,
    pub roles: Vec<&'static str>,
    pub personal_entry: Option<EntryView>,
}

/// Body for assigning a personal entry; `query` is resolved like a search.
#[derive(Debug, Deserialize)]
pub struct PersonalEntryRequest {
    pub query: String,
}

/// GET /api/v1/me
pub async fn get_me(user: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let personal = state.store.personal_entry(user.user_id).await?;
    Ok(Json(DataResponse {
        data: Profile {
            user_id: user.user_id,
            roles: state.roles.roles_of(user.user_id),
            personal_entry: personal.map(|entry| EntryView::new(entry, &state, Some(user.user_id))),
        },
    }))
}

/// PUT /api/v1/me/personal-entry
pub async fn set_my_personal_entry(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<PersonalEntryRequest>,
) -> AppResult<impl IntoResponse> {
    let entry = assign_personal_entry(&state, user.user_id, &input.query).await?;
    Ok(Json(DataResponse {
        data: EntryView::new(entry, &state, Some(user.user_id)),
    }))
}

/// Resolve `query` to one entry and make it `user_id`'s personal entry.
pub(crate) async fn assign_personal_entry(
    state: &AppState,
    user_id: UserId,
    query: &str,
) -> AppResult<dex_db::models::entry::Entry> {
    let entry = state
        .store
        .resolve_one(query)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::entry_not_found(query)))?;
    state.store.set_owner(user_id, &entry.id).await?;

    // Re-read so the view reflects the new owner.
    let id = entry.id;
    state
        .store
        .get_by_id(&id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::entry_not_found(id)))
}
