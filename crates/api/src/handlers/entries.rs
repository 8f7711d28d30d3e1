//! Handlers for the `/entries` resource.
//!
//! Lookups go through the entry store's resolution chain, so a path segment
//! may be an id, a title, or a user mention.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use dex_core::content::url_title;
use dex_core::entry::{EntrySort, HistoryItem, ImageChange, ImageField};
use dex_core::error::CoreError;
use dex_core::resolve::ResolveOptions;
use dex_core::search::DEFAULT_RESOLVE_LIMIT;
use dex_core::types::{EntryId, Timestamp, UserId};
use dex_db::models::entry::Entry;
use dex_store::EditRequest;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireEditor};
use crate::middleware::session::{AuthUser, Viewer};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// An entry as shown to a particular viewer. History is served separately.
#[derive(Debug, Serialize)]
pub struct EntryView {
    pub id: EntryId,
    pub title: String,
    /// URL path form of the title.
    pub slug: String,
    pub content: String,
    pub nohtml_content: Option<String>,
    pub image: Option<ImageField>,
    pub unlisted: bool,
    pub owner_id: Option<UserId>,
    pub last_edited: Option<Timestamp>,
    pub edit_count: usize,
    pub can_edit: bool,
}

impl EntryView {
    pub fn new(entry: Entry, state: &AppState, viewer: Option<UserId>) -> Self {
        let can_edit = viewer.is_some_and(|user| may_edit(state, &entry, user));
        Self {
            slug: url_title(&entry.title),
            image: entry.image_field().cloned(),
            edit_count: entry.history().len(),
            id: entry.id,
            title: entry.title,
            content: entry.content,
            nohtml_content: entry.nohtml_content,
            unlisted: entry.unlisted,
            owner_id: entry.owner_id,
            last_edited: entry.last_edited,
            can_edit,
        }
    }

    pub fn many(entries: Vec<Entry>, state: &AppState, viewer: Option<UserId>) -> Vec<Self> {
        entries
            .into_iter()
            .map(|entry| Self::new(entry, state, viewer))
            .collect()
    }
}

/// One history item, tagged with its position for reverts.
#[derive(Debug, Serialize)]
pub struct HistoryView {
    /// 0-based index, oldest first.
    pub edit_number: usize,
    #[serde(flatten)]
    pub item: HistoryItem,
}

/// Result of a create, edit, or revert.
#[derive(Debug, Serialize)]
pub struct EditResult {
    pub id: EntryId,
    pub slug: String,
    pub created: bool,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub sort: Option<EntrySort>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<i64>,
    pub page: Option<i64>,
    #[serde(default)]
    pub unlisted: bool,
}

/// Image action in an edit body. Leaving it out keeps the current image.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ImageInput {
    Set { src: String },
    Clear,
}

impl ImageInput {
    fn into_change(input: Option<ImageInput>) -> ImageChange {
        match input {
            None => ImageChange::Keep,
            Some(ImageInput::Set { src }) => ImageChange::Set(src),
            Some(ImageInput::Clear) => ImageChange::Clear,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EntryInput {
    /// Required on create; a blank or missing title keeps the current one
    /// on edit.
    pub title: Option<String>,
    /// Empty on create when missing; keeps the current content on edit.
    pub content: Option<String>,
    /// Only honored for admins.
    pub unlisted: Option<bool>,
    pub image: Option<ImageInput>,
}

#[derive(Debug, Deserialize)]
pub struct RevertRequest {
    pub edit_number: usize,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Editors may edit anything; other users only their own entry.
fn may_edit(state: &AppState, entry: &Entry, user: UserId) -> bool {
    if state.roles.is_blacklisted(user) {
        return false;
    }
    state.roles.is_editor(user) || entry.owner_id == Some(user)
}

/// Path segments use the slug form of titles.
fn query_from_path(name: &str) -> String {
    name.replace('_', " ")
}

async fn ensure_entry(state: &AppState, id: &str) -> AppResult<Entry> {
    state
        .store
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::entry_not_found(id)))
}

fn edit_result(id: EntryId, title: &str, created: bool) -> EditResult {
    EditResult {
        slug: url_title(title),
        id,
        created,
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/entries
pub async fn list_entries(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let entries = state
        .store
        .list_recent(params.sort.unwrap_or_default(), params.limit, params.page)
        .await?;
    Ok(Json(DataResponse {
        data: EntryView::many(entries, &state, viewer.user_id()),
    }))
}

/// GET /api/v1/entries/search
///
/// Searching unlisted entries is admin-only.
pub async fn search_entries(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let user = viewer.user_id();
    if params.unlisted && !user.is_some_and(|u| state.roles.is_admin(u)) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Admin role required to search unlisted entries".into(),
        )));
    }

    let options = ResolveOptions {
        prefer_id: true,
        limit: params.limit.unwrap_or(DEFAULT_RESOLVE_LIMIT),
        page: params.page.unwrap_or(0),
        unlisted_only: params.unlisted,
    };
    let entries = state.store.resolve(&params.q, options).await?;
    Ok(Json(DataResponse {
        data: EntryView::many(entries, &state, user),
    }))
}

/// GET /api/v1/entries/random
pub async fn random_entry(
    viewer: Viewer,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let entry = state.store.sample().await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "entry",
            id: "random".into(),
        })
    })?;
    Ok(Json(DataResponse {
        data: EntryView::new(entry, &state, viewer.user_id()),
    }))
}

/// GET /api/v1/entries/{name}
///
/// Best single match for an id, title slug, or mention.
pub async fn get_entry(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let entry = state
        .store
        .resolve_one(&query_from_path(&name))
        .await?
        .ok_or_else(|| AppError::Core(CoreError::entry_not_found(name.as_str())))?;
    Ok(Json(DataResponse {
        data: EntryView::new(entry, &state, viewer.user_id()),
    }))
}

/// GET /api/v1/entries/{id}/history
///
/// Newest edit first.
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let entry = ensure_entry(&state, &id).await?;
    let history: Vec<HistoryView> = entry
        .history()
        .iter()
        .cloned()
        .enumerate()
        .rev()
        .map(|(edit_number, item)| HistoryView { edit_number, item })
        .collect();
    Ok(Json(DataResponse { data: history }))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /api/v1/entries
///
/// New entries start unlisted for users on the approval list; admins pick.
pub async fn create_entry(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<EntryInput>,
) -> AppResult<impl IntoResponse> {
    let is_admin = state.roles.is_admin(user.user_id);
    if state.config.new_entries_disabled && !is_admin {
        return Err(AppError::Core(CoreError::Forbidden(
            "New entries are currently disabled".into(),
        )));
    }

    let title = input
        .title
        .ok_or_else(|| AppError::BadRequest("title is required".into()))?;
    let unlisted = if is_admin {
        input.unlisted.unwrap_or(false)
    } else {
        state.roles.needs_approval(user.user_id)
    };

    let outcome = state
        .store
        .edit(EditRequest {
            unlisted,
            image: ImageInput::into_change(input.image),
            ..EditRequest::new(title.clone(), input.content.unwrap_or_default(), user.user_id)
        })
        .await?;

    tracing::info!(entry_id = %outcome.id, user_id = user.user_id, unlisted, "Entry created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: edit_result(outcome.id, title.trim(), outcome.created),
        }),
    ))
}

/// PUT /api/v1/entries/{id}
///
/// Editors, or the entry's owner. Only admins change the unlisted flag.
pub async fn update_entry(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<EntryInput>,
) -> AppResult<impl IntoResponse> {
    let entry = ensure_entry(&state, &id).await?;
    if !may_edit(&state, &entry, user.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not allowed to edit this entry".into(),
        )));
    }

    let title = input
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| entry.title.clone());
    let unlisted = if state.roles.is_admin(user.user_id) {
        input.unlisted.unwrap_or(entry.unlisted)
    } else {
        entry.unlisted
    };
    let content = input.content.unwrap_or(entry.content);

    let outcome = state
        .store
        .edit(EditRequest {
            id: Some(entry.id),
            unlisted,
            image: ImageInput::into_change(input.image),
            ..EditRequest::new(title.clone(), content, user.user_id)
        })
        .await?;

    Ok(Json(DataResponse {
        data: edit_result(outcome.id, title.trim(), outcome.created),
    }))
}

/// POST /api/v1/entries/{id}/revert
pub async fn revert_entry(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<RevertRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = state
        .store
        .revert(&id, input.edit_number, user.user_id)
        .await?;
    let entry = ensure_entry(&state, &outcome.id).await?;

    tracing::info!(entry_id = %outcome.id, edit_number = input.edit_number, "Entry reverted");
    Ok(Json(DataResponse {
        data: edit_result(outcome.id, &entry.title, outcome.created),
    }))
}

/// DELETE /api/v1/entries/{id}
///
/// Admin-only; the entry must be unlisted.
pub async fn delete_entry(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.store.delete(&id, admin.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
