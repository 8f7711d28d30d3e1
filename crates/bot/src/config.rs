use std::time::Duration;

use dex_store::IdentityCacheConfig;

/// Bot configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Command prefix, e.g. `^` in `^entry cats`.
    pub prefix: String,
    /// Public site root used in entry links.
    pub base_url: String,
    /// How long a search result picker waits for a reaction.
    pub picker_timeout: Duration,
    /// Delay applied to blacklisted users' `help` and `entry` commands.
    pub blacklist_delay: Duration,
    pub source_url: String,
    pub identity_cache: IdentityCacheConfig,
}

impl BotConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                             |
    /// |----------------------------|-------------------------------------|
    /// | `BOT_PREFIX`               | `^`                                 |
    /// | `BASE_URL`                 | `http://localhost:3000`             |
    /// | `PICKER_TIMEOUT_SECS`      | `60`                                |
    /// | `BLACKLIST_DELAY_SECS`     | `5`                                 |
    /// | `SOURCE_URL`               | `https://github.com/mat-1/ReplDex`  |
    /// | `IDENTITY_CACHE_CAPACITY`  | `10000`                             |
    /// | `IDENTITY_CACHE_TTL_SECS`  | `300`                               |
    pub fn from_env() -> Self {
        let secs = |var: &str, default: &str| -> Duration {
            let raw = std::env::var(var).unwrap_or_else(|_| default.into());
            Duration::from_secs(
                raw.parse()
                    .unwrap_or_else(|_| panic!("{var} must be a valid u64")),
            )
        };

        let capacity: usize = std::env::var("IDENTITY_CACHE_CAPACITY")
            .unwrap_or_else(|_| "10000".into())
            .parse()
            .expect("IDENTITY_CACHE_CAPACITY must be a valid usize");

        Self {
            prefix: std::env::var("BOT_PREFIX").unwrap_or_else(|_| "^".into()),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into())
                .trim_end_matches('/')
                .to_string(),
            picker_timeout: secs("PICKER_TIMEOUT_SECS", "60"),
            blacklist_delay: secs("BLACKLIST_DELAY_SECS", "5"),
            source_url: std::env::var("SOURCE_URL")
                .unwrap_or_else(|_| "https://github.com/mat-1/ReplDex".into()),
            identity_cache: IdentityCacheConfig {
                capacity,
                ttl: secs("IDENTITY_CACHE_TTL_SECS", "300"),
            },
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: "^".into(),
            base_url: "http://localhost:3000".into(),
            picker_timeout: Duration::from_secs(60),
            blacklist_delay: Duration::from_secs(5),
            source_url: "https://github.com/mat-1/ReplDex".into(),
            identity_cache: IdentityCacheConfig::default(),
        }
    }
}
