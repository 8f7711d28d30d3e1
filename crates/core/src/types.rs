/// External (chat platform) user identifier. Snowflakes fit in a BIGINT.
pub type UserId = i64;

/// Opaque entry key (a hyphenated UUID v4 for entries created here).
pub type EntryId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
