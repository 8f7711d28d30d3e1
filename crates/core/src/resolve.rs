//! Entry resolution planning.
//!
//! A lookup query is resolved by trying an ordered list of strategies and
//! stopping at the first one that yields anything. The plan itself is pure;
//! the store executes each step against the database.

use crate::error::CoreError;
use crate::search::{clamp_limit, DEFAULT_RESOLVE_LIMIT, MAX_SEARCH_LIMIT};
use crate::types::{EntryId, UserId};

/// Caller options for a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Try an exact id match when full-text search finds nothing.
    pub prefer_id: bool,
    pub limit: i64,
    pub page: i64,
    /// Full-text search only unlisted entries instead of only listed ones.
    pub unlisted_only: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            prefer_id: true,
            limit: DEFAULT_RESOLVE_LIMIT,
            page: 0,
            unlisted_only: false,
        }
    }
}

impl ResolveOptions {
    /// Options for a single best match.
    pub fn single() -> Self {
        Self {
            limit: 1,
            ..Self::default()
        }
    }

    /// Clamp limit and page into their valid ranges.
    pub fn clamped(mut self) -> Self {
        self.limit = clamp_limit(Some(self.limit), DEFAULT_RESOLVE_LIMIT, MAX_SEARCH_LIMIT);
        self.page = self.page.max(0);
        self
    }

    /// Row offset for the requested page.
    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.limit)
    }
}

/// One resolution strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveStep {
    /// Weighted full-text search, filtered by the unlisted flag, paginated.
    FullText,
    /// Exact id lookup (listed or not).
    ExactId(EntryId),
    /// Case-sensitive title equality among listed entries.
    ExactTitle(String),
    /// The entry owned by the mentioned user. Holds the raw mention token;
    /// it is only parsed when the step is reached.
    OwnerMention(String),
}

/// Build the ordered strategy list for `query`.
pub fn plan(query: &str, options: &ResolveOptions) -> Vec<ResolveStep> {
    let mut steps = vec![ResolveStep::FullText];
    if options.prefer_id {
        steps.push(ResolveStep::ExactId(query.to_string()));
    }
    steps.push(ResolveStep::ExactTitle(query.to_string()));
    if is_mention(query) {
        steps.push(ResolveStep::OwnerMention(query.to_string()));
    }
    steps
}

/// Whether `query` is shaped like a `<@ID>` / `<@!ID>` mention token.
pub fn is_mention(query: &str) -> bool {
    query.starts_with("<@") && query.ends_with('>') && query.len() >= 3
}

/// Parse a `<@ID>` or `<@!ID>` mention token.
///
/// Returns `Ok(None)` when the query is not mention-shaped at all, and a
/// validation error when it is but the id is empty or not numeric.
pub fn parse_mention(query: &str) -> Result<Option<UserId>, CoreError> {
    if !is_mention(query) {
        return Ok(None);
    }
    let inner = &query[2..query.len() - 1];
    let digits = inner.strip_prefix('!').unwrap_or(inner);
    digits
        .parse::<UserId>()
        .map(Some)
        .map_err(|_| CoreError::Validation(format!("Malformed user mention '{query}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn mention_plain_and_nickname_forms() {
        assert_eq!(parse_mention("<@123>").unwrap(), Some(123));
        assert_eq!(parse_mention("<@!123>").unwrap(), Some(123));
    }

    #[test]
    fn non_mention_is_none() {
        assert_eq!(parse_mention("cats").unwrap(), None);
        assert_eq!(parse_mention("<@123").unwrap(), None);
        assert_eq!(parse_mention("@123>").unwrap(), None);
    }

    #[test]
    fn malformed_mention_fails() {
        assert_matches!(parse_mention("<@abc>"), Err(CoreError::Validation(_)));
        assert_matches!(parse_mention("<@>"), Err(CoreError::Validation(_)));
        assert_matches!(parse_mention("<@!>"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn plan_orders_every_step() {
        let steps = plan("<@5>", &ResolveOptions::default());
        assert_eq!(
            steps,
            vec![
                ResolveStep::FullText,
                ResolveStep::ExactId("<@5>".into()),
                ResolveStep::ExactTitle("<@5>".into()),
                ResolveStep::OwnerMention("<@5>".into()),
            ]
        );
    }

    #[test]
    fn plan_skips_id_lookup_when_not_preferred() {
        let options = ResolveOptions {
            prefer_id: false,
            ..ResolveOptions::default()
        };
        let steps = plan("Cats", &options);
        assert_eq!(
            steps,
            vec![ResolveStep::FullText, ResolveStep::ExactTitle("Cats".into())]
        );
    }

    #[test]
    fn plan_defers_mention_parsing() {
        let steps = plan("<@x1>", &ResolveOptions::default());
        assert_eq!(steps.last(), Some(&ResolveStep::OwnerMention("<@x1>".into())));
    }

    #[test]
    fn options_clamp_and_offset() {
        let options = ResolveOptions {
            limit: 500,
            page: -2,
            ..ResolveOptions::default()
        }
        .clamped();
        assert_eq!(options.limit, 100);
        assert_eq!(options.page, 0);

        let options = ResolveOptions {
            limit: 10,
            page: 3,
            ..ResolveOptions::default()
        };
        assert_eq!(options.offset(), 30);
    }
}
