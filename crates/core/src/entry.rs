//! Entry domain types shared between storage and the front ends, plus input
//! validation.
//!
//! # History semantics
//!
//! An entry's history is a forward log: every edit appends the state it
//! *wrote*, not the state it replaced. The first item is the creating edit
//! and the last item always mirrors the current title and content. Reverting
//! to item `k` therefore replays item `k` as a brand-new edit on top.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Timestamp, UserId};

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum content length in bytes.
pub const MAX_CONTENT_LEN: usize = 100_000;

/// A resolved image reference with a cached thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub src: String,
    /// Base64 thumbnail bytes, `None` until resolved.
    #[serde(default)]
    pub thumbnail_b64: Option<String>,
    #[serde(default)]
    pub thumbnail_content_type: Option<String>,
}

impl ImageDescriptor {
    /// A descriptor that only names its source.
    pub fn unresolved(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            thumbnail_b64: None,
            thumbnail_content_type: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.thumbnail_b64.is_some()
    }
}

/// The stored `image` field: legacy rows hold a bare source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageField {
    Source(String),
    Resolved(ImageDescriptor),
}

impl ImageField {
    /// Source URL regardless of representation.
    pub fn src(&self) -> &str {
        match self {
            ImageField::Source(src) => src,
            ImageField::Resolved(descriptor) => &descriptor.src,
        }
    }

    /// Whether normalization still has work to do on this field.
    pub fn needs_resolution(&self) -> bool {
        match self {
            ImageField::Source(_) => true,
            ImageField::Resolved(descriptor) => !descriptor.is_resolved(),
        }
    }
}

/// One immutable edit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub author: UserId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image: Option<ImageDescriptor>,
    #[serde(default)]
    pub unlisted: bool,
    pub time: Timestamp,
}

/// What an edit does to the entry's image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageChange {
    /// Leave the stored image as is.
    #[default]
    Keep,
    /// Replace it with the image at this source URL.
    Set(String),
    /// Remove the image.
    Clear,
}

impl ImageChange {
    /// The change that reproduces a history item's image.
    pub fn from_history(item: &HistoryItem) -> Self {
        match &item.image {
            Some(image) => ImageChange::Set(image.src.clone()),
            None => ImageChange::Clear,
        }
    }
}

/// Ordering for recent-entry listings (always descending).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySort {
    #[default]
    LastEdited,
    Title,
}

impl EntrySort {
    /// Column to order by. Only ever one of a fixed set of identifiers.
    pub fn column(self) -> &'static str {
        match self {
            EntrySort::LastEdited => "last_edited",
            EntrySort::Title => "title",
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate an entry title (non-empty after trimming, <= 200 chars).
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate entry content (max 100 000 bytes).
pub fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.len() > MAX_CONTENT_LEN {
        return Err(CoreError::Validation(format!(
            "Content must be at most {MAX_CONTENT_LEN} characters"
        )));
    }
    Ok(())
}

/// Look up history item `index` (0-based, oldest first).
pub fn history_item(history: &[HistoryItem], index: usize) -> Result<&HistoryItem, CoreError> {
    history.get(index).ok_or_else(|| {
        CoreError::Validation(format!(
            "History index {index} out of range (entry has {} edits)",
            history.len()
        ))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
