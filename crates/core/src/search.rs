//! Full-text search constants and query helpers.
//!
//! Ranking is delegated to Postgres (`tsvector` / `ts_rank`); this module only
//! decides weights, limits, and how user input becomes a `tsquery`.

// ---------------------------------------------------------------------------
// Relevance weights
// ---------------------------------------------------------------------------

/// `ts_rank` weight array in `{D, C, B, A}` order. Titles are indexed as A
/// and plain-text content as D, so a title hit (1.0) scores 20x a content
/// hit (0.05).
pub const RANK_WEIGHTS: &str = "{0.05, 0.1, 0.4, 1.0}";

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default number of results for an entry lookup.
pub const DEFAULT_RESOLVE_LIMIT: i64 = 10;

/// Default page size for recent-entry listings.
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// Maximum number of results per page.
pub const MAX_SEARCH_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Query builder helpers
// ---------------------------------------------------------------------------

/// Split user input into terms that are safe inside a `tsquery`.
///
/// Anything other than alphanumerics and `_` separates terms. Returns `None`
/// if no usable term remains.
fn sanitize_terms(query: &str) -> Option<Vec<&str>> {
    let terms: Vec<&str> = query
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms)
    }
}

/// Build a `tsquery` matching documents that contain ANY term.
///
/// Entry lookups use this form: every term is an independent `should`
/// clause and ranking sorts out the best match.
///
/// # Examples
///
/// ```
/// use dex_core::search::build_any_tsquery;
/// assert_eq!(build_any_tsquery("cats dogs"), Some("cats | dogs".to_string()));
/// assert_eq!(build_any_tsquery("<@123>"), Some("123".to_string()));
/// ```
pub fn build_any_tsquery(query: &str) -> Option<String> {
    sanitize_terms(query).map(|terms| terms.join(" | "))
}

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided page number to non-negative.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
