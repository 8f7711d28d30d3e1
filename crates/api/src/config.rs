use std::time::Duration;

use dex_store::IdentityCacheConfig;

use crate::auth::oauth::OAuthConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Public site root, used for entry links and OAuth redirects.
    pub base_url: String,
    /// When set, only admins may create entries.
    pub new_entries_disabled: bool,
    /// Chat log channel webhook for the moderation audit log.
    pub audit_webhook_url: Option<String>,
    /// Webhook announcing newly created entries.
    pub new_entry_webhook_url: Option<String>,
    pub identity_cache: IdentityCacheConfig,
    pub oauth: OAuthConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `3000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `BASE_URL`                 | `http://localhost:3000` |
    /// | `NEW_ENTRIES_DISABLED`     | `false`                 |
    /// | `AUDIT_WEBHOOK_URL`        | unset                   |
    /// | `NEW_ENTRY_WEBHOOK_URL`    | unset                   |
    /// | `IDENTITY_CACHE_CAPACITY`  | `10000`                 |
    /// | `IDENTITY_CACHE_TTL_SECS`  | `300`                   |
    ///
    /// OAuth variables are documented on [`OAuthConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let base_url = std::env::var("BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        let new_entries_disabled = std::env::var("NEW_ENTRIES_DISABLED")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let optional = |var: &str| std::env::var(var).ok().filter(|v| !v.trim().is_empty());

        let capacity: usize = std::env::var("IDENTITY_CACHE_CAPACITY")
            .unwrap_or_else(|_| "10000".into())
            .parse()
            .expect("IDENTITY_CACHE_CAPACITY must be a valid usize");

        let ttl_secs: u64 = std::env::var("IDENTITY_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("IDENTITY_CACHE_TTL_SECS must be a valid u64");

        let oauth = OAuthConfig::from_env(&base_url);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            base_url,
            new_entries_disabled,
            audit_webhook_url: optional("AUDIT_WEBHOOK_URL"),
            new_entry_webhook_url: optional("NEW_ENTRY_WEBHOOK_URL"),
            identity_cache: IdentityCacheConfig {
                capacity,
                ttl: Duration::from_secs(ttl_secs),
            },
            oauth,
        }
    }
}
