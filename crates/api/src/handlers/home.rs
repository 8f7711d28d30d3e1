//! Landing page data.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use dex_core::entry::EntrySort;
use serde::Serialize;

use super::entries::EntryView;
use crate::error::AppResult;
use crate::middleware::session::Viewer;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub entries: Vec<EntryView>,
    pub entry_count: i64,
    pub featured: Option<EntryView>,
}

/// GET /api/v1/home
///
/// Recently edited listed entries, the listed count, and the featured entry.
pub async fn home(viewer: Viewer, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let user = viewer.user_id();
    let entries = state
        .store
        .list_recent(EntrySort::LastEdited, None, None)
        .await?;
    let entry_count = state.store.count_listed().await?;
    let featured = state.store.featured_entry().await?;

    Ok(Json(DataResponse {
        data: HomePage {
            entries: EntryView::many(entries, &state, user),
            entry_count,
            featured: featured.map(|entry| EntryView::new(entry, &state, user)),
        },
    }))
}
