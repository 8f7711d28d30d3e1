//! Rich reply messages.

use std::fmt;

use dex_core::content::{html_to_markdown, truncate_chars, url_title};
use dex_db::models::entry::Entry;
use serde::Serialize;

/// Longest embed description the chat platform accepts.
pub const MAX_DESCRIPTION_LEN: usize = 2048;

/// Longest embed field value.
pub const MAX_FIELD_VALUE_LEN: usize = 1024;

/// Color used for moderation replies.
pub const COLOR_ADMIN: u32 = 0x00FF00;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub color: Option<u32>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description, truncated to [`MAX_DESCRIPTION_LEN`].
    pub fn description(mut self, description: impl AsRef<str>) -> Self {
        self.description = Some(truncate_chars(description.as_ref(), MAX_DESCRIPTION_LEN));
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl AsRef<str>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: truncate_chars(value.as_ref(), MAX_FIELD_VALUE_LEN),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }
}

/// Plain-text rendering, used by the console transport.
impl fmt::Display for Embed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = &self.title {
            writeln!(f, "== {title} ==")?;
        }
        if let Some(url) = &self.url {
            writeln!(f, "<{url}>")?;
        }
        if let Some(description) = &self.description {
            writeln!(f, "{description}")?;
        }
        for field in &self.fields {
            writeln!(f, "{}: {}", field.name, field.value)?;
        }
        if let Some(thumbnail) = &self.thumbnail {
            writeln!(f, "[thumbnail] {thumbnail}")?;
        }
        if let Some(footer) = &self.footer {
            writeln!(f, "-- {footer}")?;
        }
        Ok(())
    }
}

/// Link to an entry's page on the site.
pub fn entry_url(base_url: &str, title: &str) -> String {
    format!("{base_url}/entry/{}", url_title(title))
}

/// Link to the editor, prefilled with a title.
pub fn new_entry_url(base_url: &str, title: &str) -> String {
    format!("{base_url}/edit?title={}", url_title(title))
}

/// An entry rendered as markdown, linking back to the site.
pub fn entry_embed(entry: &Entry, base_url: &str) -> Embed {
    let mut embed = Embed::new()
        .title(entry.title.clone())
        .description(html_to_markdown(&entry.content))
        .url(entry_url(base_url, &entry.title));
    if let Some(image) = entry.image_field() {
        embed = embed.thumbnail(image.src());
    }
    embed
}

/// Entry metadata without markup, for admins.
pub fn raw_entry_embed(entry: &Entry) -> Embed {
    let optional = |value: Option<String>| value.unwrap_or_else(|| "None".into());

    Embed::new()
        .title("raw entry data")
        .color(COLOR_ADMIN)
        .field("id", &entry.id, false)
        .field("title", &entry.title, false)
        .field(
            "nohtml_content",
            optional(entry.nohtml_content.clone()),
            false,
        )
        .field("unlisted", entry.unlisted.to_string(), true)
        .field("owner_id", optional(entry.owner_id.map(|id| id.to_string())), true)
        .field(
            "last_edited",
            optional(entry.last_edited.map(|t| t.to_rfc3339())),
            true,
        )
        .field("edits", entry.history().len().to_string(), true)
}
