//! Link preview metadata for URLs pasted into entries.
//!
//! Internal entry links are answered from the store; anything else is
//! fetched and scraped for `<title>` and its icon link.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use dex_core::error::CoreError;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Site icon served alongside the front end.
const SITE_ICON_PATH: &str = "/static/icon.png";

#[derive(Debug, Deserialize)]
pub struct WebsiteTitleParams {
    pub url: String,
}

/// Preview metadata. Every field is optional; an internal non-entry URL
/// yields an empty object.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct WebsiteTitle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// GET /api/v1/website-title?url=...
pub async fn website_title(
    State(state): State<AppState>,
    Query(params): Query<WebsiteTitleParams>,
) -> AppResult<impl IntoResponse> {
    let base_url = &state.config.base_url;
    let target = absolutize(params.url.trim(), base_url)?;

    let data = match target.strip_prefix(base_url.as_str()) {
        Some(path) => internal_title(&state, path).await?,
        None => external_title(&state.http, &target).await?,
    };
    Ok(Json(DataResponse { data }))
}

/// Turn protocol-relative and site-relative URLs into absolute ones.
fn absolutize(raw: &str, base_url: &str) -> AppResult<String> {
    if raw.is_empty() {
        return Err(AppError::BadRequest("url must not be empty".into()));
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return Ok(format!("https://{rest}"));
    }
    if raw.starts_with('/') {
        return Ok(format!("{base_url}{raw}"));
    }
    Ok(raw.to_string())
}

async fn internal_title(state: &AppState, path: &str) -> AppResult<WebsiteTitle> {
    let Some(name) = path.strip_prefix("/entry/") else {
        return Ok(WebsiteTitle::default());
    };
    let name: String = url::form_urlencoded::parse(name.as_bytes())
        .map(|(key, value)| {
            if value.is_empty() {
                key.into_owned()
            } else {
                format!("{key}={value}")
            }
        })
        .collect();

    let entry = state
        .store
        .resolve_one(&name.replace('_', " "))
        .await?
        .ok_or_else(|| AppError::Core(CoreError::entry_not_found(name.as_str())))?;

    Ok(WebsiteTitle {
        title: Some(entry.title),
        favicon: Some(format!("{}{SITE_ICON_PATH}", state.config.base_url)),
        content: entry.nohtml_content,
    })
}

async fn external_title(http: &reqwest::Client, target: &str) -> AppResult<WebsiteTitle> {
    let url = Url::parse(target).map_err(|e| AppError::BadRequest(format!("Invalid url: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::BadRequest("Only http(s) URLs are supported".into()));
    }

    let body = http
        .get(url.clone())
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| AppError::Upstream(e.to_string()))?
        .text()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(scrape_metadata(&body, &url))
}

/// Pull the page title and icon out of an HTML document.
fn scrape_metadata(html: &str, page_url: &Url) -> WebsiteTitle {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|node| node.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
    });

    let favicon = Selector::parse(r#"link[rel~="icon"]"#).ok().and_then(|selector| {
        document
            .select(&selector)
            .find_map(|node| node.value().attr("href"))
            .and_then(|href| page_url.join(href).ok())
            .map(String::from)
    });

    WebsiteTitle {
        title,
        favicon,
        content: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://dex.example";

    #[test]
    fn absolutize_protocol_and_site_relative() {
        assert_eq!(absolutize("//x.dev/a", BASE).unwrap(), "https://x.dev/a");
        assert_eq!(
            absolutize("/entry/Cats", BASE).unwrap(),
            "https://dex.example/entry/Cats"
        );
        assert_eq!(absolutize("https://x.dev", BASE).unwrap(), "https://x.dev");
        assert!(absolutize("", BASE).is_err());
    }

    #[test]
    fn scrape_title_and_relative_icon() {
        let page = Url::parse("https://x.dev/blog/post").unwrap();
        let meta = scrape_metadata(
            r#"<html><head><title> Hello </title><link rel="icon" href="/fav.ico"></head></html>"#,
            &page,
        );
        assert_eq!(meta.title.as_deref(), Some("Hello"));
        assert_eq!(meta.favicon.as_deref(), Some("https://x.dev/fav.ico"));
    }

    #[test]
    fn scrape_protocol_relative_icon_and_shortcut_rel() {
        let page = Url::parse("https://x.dev/").unwrap();
        let meta = scrape_metadata(
            r#"<head><link rel="shortcut icon" href="//cdn.x.dev/i.png"></head>"#,
            &page,
        );
        assert_eq!(meta.title, None);
        assert_eq!(meta.favicon.as_deref(), Some("https://cdn.x.dev/i.png"));
    }
}
