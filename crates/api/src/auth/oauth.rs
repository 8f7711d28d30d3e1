//! OAuth2 authorization-code login against the chat platform.
//!
//! The provider only tells us who the user is; roles come from the static
//! lists in [`RoleConfig`](dex_core::roles::RoleConfig).

use dex_core::types::UserId;
use serde::Deserialize;

const DEFAULT_AUTHORIZE_URL: &str = "https://discord.com/api/oauth2/authorize";
const DEFAULT_TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
const DEFAULT_USER_URL: &str = "https://discord.com/api/users/@me";

/// Only the user's identity is requested.
pub const OAUTH_SCOPE: &str = "identify";

/// Identity provider settings.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub user_url: String,
    /// Where the provider sends the browser back to.
    pub redirect_uri: String,
}

impl OAuthConfig {
    /// Load from the environment.
    ///
    /// | Env Var                | Default                                     |
    /// |------------------------|---------------------------------------------|
    /// | `OAUTH_CLIENT_ID`      | empty                                       |
    /// | `OAUTH_CLIENT_SECRET`  | empty                                       |
    /// | `OAUTH_AUTHORIZE_URL`  | `https://discord.com/api/oauth2/authorize`  |
    /// | `OAUTH_TOKEN_URL`      | `https://discord.com/api/oauth2/token`      |
    /// | `OAUTH_USER_URL`       | `https://discord.com/api/users/@me`         |
    ///
    /// The redirect URI is always `{base_url}/api/v1/auth/callback`.
    pub fn from_env(base_url: &str) -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };

        Self {
            client_id: var("OAUTH_CLIENT_ID", ""),
            client_secret: var("OAUTH_CLIENT_SECRET", ""),
            authorize_url: var("OAUTH_AUTHORIZE_URL", DEFAULT_AUTHORIZE_URL),
            token_url: var("OAUTH_TOKEN_URL", DEFAULT_TOKEN_URL),
            user_url: var("OAUTH_USER_URL", DEFAULT_USER_URL),
            redirect_uri: format!("{base_url}/api/v1/auth/callback"),
        }
    }

    /// URL the browser is redirected to in order to log in.
    pub fn authorize_redirect(&self) -> Result<String, OAuthError> {
        let url = url::Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", OAUTH_SCOPE),
            ],
        )?;
        Ok(url.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("invalid provider URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned a non-numeric user id: {0}")]
    InvalidUserId(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
}

/// Trade an authorization code for the id of the user who granted it.
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &OAuthConfig,
    code: &str,
) -> Result<UserId, OAuthError> {
    let token: TokenResponse = http
        .post(&config.token_url)
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", OAUTH_SCOPE),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let user: ProviderUser = http
        .get(&config.user_url)
        .bearer_auth(&token.access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    user.id
        .parse::<UserId>()
        .map_err(|_| OAuthError::InvalidUserId(user.id))
}
