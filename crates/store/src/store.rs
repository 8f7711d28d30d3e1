//! The entry store adapter.
//!
//! History is a forward log: an edit appends the state it wrote, so
//! `history.last()` always mirrors the current entry and [`EntryStore::revert`]
//! replays an older item as a fresh edit instead of undoing anything.

use std::sync::Arc;

use chrono::Utc;
use dex_core::content::{fix_html, remove_html};
use dex_core::entry::{
    history_item, validate_content, validate_title, EntrySort, HistoryItem, ImageChange,
    ImageDescriptor, ImageField,
};
use dex_core::error::CoreError;
use dex_core::resolve::{parse_mention, plan, ResolveOptions, ResolveStep};
use dex_core::search::{build_any_tsquery, clamp_limit, clamp_page, DEFAULT_LIST_LIMIT, MAX_SEARCH_LIMIT};
use dex_core::types::{EntryId, UserId};
use dex_db::models::config::CONFIG_FEATURED;
use dex_db::models::entry::{Entry, EntryWrite};
use dex_db::repositories::{ConfigRepo, EntryRepo};
use dex_db::DbPool;
use dex_events::{AuditLog, AuditRecord, EntryEvent, EntryEventKind, EventBus};

use crate::error::StoreError;
use crate::identity::IdentityCache;
use crate::images::ImageResolver;
use crate::normalize::normalize_entry;

/// Input for [`EntryStore::edit`].
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// Existing entry to edit; `None` creates a new one.
    pub id: Option<EntryId>,
    pub title: String,
    pub content: String,
    pub editor: UserId,
    pub unlisted: bool,
    pub image: ImageChange,
}

impl EditRequest {
    pub fn new(title: impl Into<String>, content: impl Into<String>, editor: UserId) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            editor,
            unlisted: false,
            image: ImageChange::Keep,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub id: EntryId,
    pub created: bool,
}

/// Entry operations shared by the web and chat front ends.
pub struct EntryStore {
    pool: DbPool,
    images: Arc<dyn ImageResolver>,
    audit: Arc<dyn AuditLog>,
    events: Arc<EventBus>,
    identity: Arc<IdentityCache>,
}

impl EntryStore {
    pub fn new(
        pool: DbPool,
        images: Arc<dyn ImageResolver>,
        audit: Arc<dyn AuditLog>,
        events: Arc<EventBus>,
        identity: Arc<IdentityCache>,
    ) -> Self {
        Self {
            pool,
            images,
            audit,
            events,
            identity,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn identity(&self) -> &IdentityCache {
        &self.identity
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Resolve a free-form query to entries.
    ///
    /// Strategies run in order (full-text, exact id, exact listed title,
    /// owner mention) and the first non-empty result wins. A mention-shaped
    /// query with a non-numeric id fails with a validation error, but only
    /// once every earlier strategy came back empty.
    pub async fn resolve(
        &self,
        query: &str,
        options: ResolveOptions,
    ) -> Result<Vec<Entry>, StoreError> {
        let options = options.clamped();

        for step in plan(query, &options) {
            let found = match &step {
                ResolveStep::FullText => match build_any_tsquery(query) {
                    Some(tsquery) => {
                        EntryRepo::search(
                            &self.pool,
                            &tsquery,
                            options.unlisted_only,
                            options.limit,
                            options.offset(),
                        )
                        .await?
                    }
                    None => Vec::new(),
                },
                ResolveStep::ExactId(id) => {
                    EntryRepo::find_by_id(&self.pool, id).await?.into_iter().collect()
                }
                ResolveStep::ExactTitle(title) => {
                    EntryRepo::find_listed_by_title(&self.pool, title, options.limit).await?
                }
                ResolveStep::OwnerMention(raw) => match parse_mention(raw)? {
                    Some(owner) => EntryRepo::find_by_owner(&self.pool, owner)
                        .await?
                        .into_iter()
                        .collect(),
                    None => Vec::new(),
                },
            };

            if !found.is_empty() {
                tracing::debug!(query, step = ?step, count = found.len(), "Resolved entries");
                return self.normalize_all(found).await;
            }
        }

        Ok(Vec::new())
    }

    /// First result of [`resolve`](Self::resolve) with single-result options.
    pub async fn resolve_one(&self, query: &str) -> Result<Option<Entry>, StoreError> {
        Ok(self
            .resolve(query, ResolveOptions::single())
            .await?
            .into_iter()
            .next())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Entry>, StoreError> {
        match EntryRepo::find_by_id(&self.pool, id).await? {
            Some(entry) => Ok(Some(self.normalize(entry).await?)),
            None => Ok(None),
        }
    }

    pub async fn get_by_owner(&self, owner: UserId) -> Result<Option<Entry>, StoreError> {
        match EntryRepo::find_by_owner(&self.pool, owner).await? {
            Some(entry) => Ok(Some(self.normalize(entry).await?)),
            None => Ok(None),
        }
    }

    /// The user's designated personal entry, via the identity cache.
    pub async fn personal_entry(&self, user_id: UserId) -> Result<Option<Entry>, StoreError> {
        match self.identity.personal_entry(user_id).await? {
            Some(id) => self.get_by_id(&id).await,
            None => Ok(None),
        }
    }

    /// Listed entries, newest (or last by title) first.
    pub async fn list_recent(
        &self,
        sort: EntrySort,
        limit: Option<i64>,
        page: Option<i64>,
    ) -> Result<Vec<Entry>, StoreError> {
        let limit = clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_SEARCH_LIMIT);
        let offset = clamp_page(page).saturating_mul(limit);
        let entries = EntryRepo::list_listed(&self.pool, sort, limit, offset).await?;
        self.normalize_all(entries).await
    }

    pub async fn count_listed(&self) -> Result<i64, StoreError> {
        Ok(EntryRepo::count_listed(&self.pool).await?)
    }

    /// One uniformly random listed entry.
    pub async fn sample(&self) -> Result<Option<Entry>, StoreError> {
        match EntryRepo::sample_listed(&self.pool).await? {
            Some(entry) => Ok(Some(self.normalize(entry).await?)),
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Create or update an entry, appending the written state to history.
    pub async fn edit(&self, request: EditRequest) -> Result<EditOutcome, StoreError> {
        let title = request.title.trim().to_string();
        validate_title(&title)?;
        validate_content(&request.content)?;

        let content = fix_html(&request.content);
        let nohtml_content = remove_html(&content);
        let id = request
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let now = Utc::now();

        let (replace_image, image, history_image) = match request.image {
            ImageChange::Keep => {
                let current = EntryRepo::find_by_id(&self.pool, &id)
                    .await?
                    .and_then(|entry| entry.image.map(|json| json.0));
                let history_image = current
                    .as_ref()
                    .map(|field| ImageDescriptor::unresolved(field.src()));
                (false, None, history_image)
            }
            ImageChange::Set(src) => {
                let resolved = match self.images.resolve(&src).await {
                    Ok(descriptor) => descriptor,
                    Err(e) => {
                        tracing::warn!(entry_id = %id, src = %src, error = %e, "Image resolution failed, storing source only");
                        ImageDescriptor::unresolved(src.clone())
                    }
                };
                (
                    true,
                    Some(ImageField::Resolved(resolved)),
                    Some(ImageDescriptor::unresolved(src)),
                )
            }
            ImageChange::Clear => (true, None, None),
        };

        let write = EntryWrite {
            id,
            title: title.clone(),
            content: content.clone(),
            nohtml_content,
            replace_image,
            image,
            unlisted: request.unlisted,
            edited_at: now,
            history_item: HistoryItem {
                author: request.editor,
                title: title.clone(),
                content,
                image: history_image,
                unlisted: request.unlisted,
                time: now,
            },
        };
        let upserted = EntryRepo::upsert_edit(&self.pool, &write).await?;
        let id = upserted.entry.id;

        tracing::info!(entry_id = %id, editor = request.editor, created = upserted.created, "Entry edited");

        if let Err(e) = self
            .audit
            .record(&AuditRecord::edit(request.editor, id.clone(), title.clone()))
            .await
        {
            tracing::warn!(entry_id = %id, error = %e, "Failed to record edit");
        }

        if upserted.created {
            self.events.publish(EntryEvent::new(
                EntryEventKind::Created,
                id.clone(),
                title.clone(),
                request.editor,
            ));
        }
        self.events
            .publish(EntryEvent::new(EntryEventKind::Edited, id.clone(), title, request.editor));

        Ok(EditOutcome {
            id,
            created: upserted.created,
        })
    }

    /// Replay history item `index` (0-based, oldest first) as a new edit.
    ///
    /// The entry keeps its current unlisted flag; history only grows.
    pub async fn revert(
        &self,
        id: &str,
        index: usize,
        editor: UserId,
    ) -> Result<EditOutcome, StoreError> {
        let entry = EntryRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| CoreError::entry_not_found(id))?;
        let target = history_item(entry.history(), index)?;

        self.edit(EditRequest {
            id: Some(entry.id.clone()),
            title: target.title.clone(),
            content: target.content.clone(),
            editor,
            unlisted: entry.unlisted,
            image: ImageChange::from_history(target),
        })
        .await
    }

    /// Flip an entry's unlisted flag, recorded as an ordinary edit.
    /// Returns the new flag.
    pub async fn toggle_unlisted(&self, id: &str, actor: UserId) -> Result<bool, StoreError> {
        let entry = EntryRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| CoreError::entry_not_found(id))?;
        let unlisted = !entry.unlisted;

        self.edit(EditRequest {
            id: Some(entry.id),
            title: entry.title,
            content: entry.content,
            editor: actor,
            unlisted,
            image: ImageChange::Keep,
        })
        .await?;
        Ok(unlisted)
    }

    /// Permanently delete an unlisted entry.
    ///
    /// The audit record is written first; if the sink fails nothing is
    /// deleted.
    pub async fn delete(&self, id: &str, actor: UserId) -> Result<(), StoreError> {
        let entry = EntryRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| CoreError::entry_not_found(id))?;
        if !entry.unlisted {
            return Err(CoreError::Conflict("Only unlisted entries may be deleted".into()).into());
        }

        self.audit
            .record(&AuditRecord::delete(
                actor,
                entry.id.clone(),
                entry.title.clone(),
                entry.content.clone(),
            ))
            .await?;

        if !EntryRepo::delete(&self.pool, &entry.id).await? {
            return Err(CoreError::entry_not_found(id).into());
        }

        tracing::info!(entry_id = %entry.id, actor, "Entry deleted");
        self.events
            .publish(EntryEvent::new(EntryEventKind::Deleted, entry.id, entry.title, actor));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Ownership
    // -----------------------------------------------------------------------

    /// Make `entry_id` the one entry owned by `user_id`.
    ///
    /// Clears the user's previous entry first. The two row updates are not
    /// one transaction; a failure between them leaves the user owning
    /// nothing.
    pub async fn set_owner(&self, user_id: UserId, entry_id: &str) -> Result<(), StoreError> {
        if EntryRepo::find_by_id(&self.pool, entry_id).await?.is_none() {
            return Err(CoreError::entry_not_found(entry_id).into());
        }

        let cleared = EntryRepo::clear_owner(&self.pool, user_id).await?;
        EntryRepo::set_owner(&self.pool, entry_id, user_id).await?;
        self.identity.set_personal_entry(user_id, entry_id).await?;

        tracing::info!(user_id, entry_id, cleared, "Entry owner set");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Featured
    // -----------------------------------------------------------------------

    /// Id of the featured entry, if one is configured.
    pub async fn featured(&self) -> Result<Option<EntryId>, StoreError> {
        Ok(ConfigRepo::get(&self.pool, CONFIG_FEATURED)
            .await?
            .map(|row| row.value))
    }

    /// The featured entry itself. A dangling pointer reads as `None`.
    pub async fn featured_entry(&self) -> Result<Option<Entry>, StoreError> {
        match self.featured().await? {
            Some(id) => self.get_by_id(&id).await,
            None => Ok(None),
        }
    }

    pub async fn set_featured(&self, id: &str) -> Result<(), StoreError> {
        if EntryRepo::find_by_id(&self.pool, id).await?.is_none() {
            return Err(CoreError::entry_not_found(id).into());
        }
        ConfigRepo::set(&self.pool, CONFIG_FEATURED, id).await?;
        tracing::info!(entry_id = id, "Featured entry set");
        Ok(())
    }

    pub async fn clear_featured(&self) -> Result<(), StoreError> {
        ConfigRepo::delete(&self.pool, CONFIG_FEATURED).await?;
        tracing::info!("Featured entry cleared");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Normalization
    // -----------------------------------------------------------------------

    /// Normalize a row, persisting changed columns.
    async fn normalize(&self, entry: Entry) -> Result<Entry, StoreError> {
        let (entry, changes) = normalize_entry(self.images.as_ref(), entry).await;
        if !changes.is_empty() {
            EntryRepo::update_normalized(
                &self.pool,
                &entry.id,
                changes.image.as_ref(),
                changes.nohtml_content.as_deref(),
            )
            .await?;
            tracing::debug!(entry_id = %entry.id, "Persisted normalized entry");
        }
        Ok(entry)
    }

    async fn normalize_all(&self, entries: Vec<Entry>) -> Result<Vec<Entry>, StoreError> {
        let mut normalized = Vec::with_capacity(entries.len());
        for entry in entries {
            normalized.push(self.normalize(entry).await?);
        }
        Ok(normalized)
    }
}
