//! Normalize-on-read.
//!
//! Stored rows can lag behind the current shape: a bare image URL (possibly
//! on the legacy host), a descriptor whose thumbnail was never fetched, or a
//! missing plain-text projection. [`normalize_entry`] brings a row up to
//! date and reports which columns must be persisted. Returned content is
//! always passed through `fix_html`; that part is never written back.

use dex_core::content::{fix_html, remove_html, rewrite_legacy_image_host};
use dex_core::entry::ImageField;
use dex_db::models::entry::Entry;
use sqlx::types::Json;

use crate::images::ImageResolver;

/// Columns that changed during normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    pub image: Option<ImageField>,
    pub nohtml_content: Option<String>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.nohtml_content.is_none()
    }
}

/// Bring `entry` up to date. A failed image resolution leaves the image as
/// stored, so the next read retries it.
pub async fn normalize_entry(resolver: &dyn ImageResolver, mut entry: Entry) -> (Entry, Changes) {
    let mut changes = Changes::default();

    if let Some(field) = entry.image_field() {
        if field.needs_resolution() {
            let src = match field {
                ImageField::Source(src) => rewrite_legacy_image_host(src),
                ImageField::Resolved(descriptor) => descriptor.src.clone(),
            };
            match resolver.resolve(&src).await {
                Ok(descriptor) => {
                    let resolved = ImageField::Resolved(descriptor);
                    entry.image = Some(Json(resolved.clone()));
                    changes.image = Some(resolved);
                }
                Err(e) => {
                    tracing::warn!(entry_id = %entry.id, src = %src, error = %e, "Image resolution failed");
                }
            }
        }
    }

    if entry.nohtml_content.is_none() {
        let nohtml = remove_html(&entry.content);
        entry.nohtml_content = Some(nohtml.clone());
        changes.nohtml_content = Some(nohtml);
    }

    entry.content = fix_html(&entry.content);
    (entry, changes)
}
