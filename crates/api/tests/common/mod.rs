#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use dex_api::auth::oauth::OAuthConfig;
use dex_api::config::ServerConfig;
use dex_api::router::build_app_router;
use dex_api::state::AppState;
use dex_core::entry::ImageDescriptor;
use dex_core::roles::RoleConfig;
use dex_core::types::UserId;
use dex_events::{EventBus, TracingAuditLog};
use dex_store::{EntryStore, IdentityCache, IdentityCacheConfig, ImageError, ImageResolver};

pub const ADMIN: UserId = 1;
pub const EDITOR: UserId = 2;
/// Editor whose new entries start unlisted.
pub const APPROVAL_EDITOR: UserId = 3;
/// On the editor list, but blacklisted.
pub const BLACKLISTED: UserId = 4;
/// Logged in, no roles.
pub const VISITOR: UserId = 5;

pub const BASE_URL: &str = "http://dex.test";

/// Thumbnails without network access.
struct StaticImages;

#[async_trait]
impl ImageResolver for StaticImages {
    async fn resolve(&self, src: &str) -> Result<ImageDescriptor, ImageError> {
        Ok(ImageDescriptor {
            src: src.to_string(),
            thumbnail_b64: Some("AAAA".into()),
            thumbnail_content_type: Some("image/png".into()),
        })
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        base_url: BASE_URL.to_string(),
        new_entries_disabled: false,
        audit_webhook_url: None,
        new_entry_webhook_url: None,
        identity_cache: IdentityCacheConfig::default(),
        oauth: OAuthConfig {
            client_id: "client-1".into(),
            client_secret: "secret".into(),
            authorize_url: "https://id.example/oauth2/authorize".into(),
            token_url: "https://id.example/oauth2/token".into(),
            user_url: "https://id.example/users/@me".into(),
            redirect_uri: format!("{BASE_URL}/api/v1/auth/callback"),
        },
    }
}

pub fn test_roles() -> RoleConfig {
    RoleConfig {
        admins: vec![ADMIN],
        editors: vec![EDITOR, APPROVAL_EDITOR, BLACKLISTED],
        approval: vec![APPROVAL_EDITOR],
        blacklisted: vec![BLACKLISTED],
        devs: Vec::new(),
        reporters: Vec::new(),
    }
}

pub fn build_test_state(pool: PgPool, config: &ServerConfig) -> AppState {
    let identity = Arc::new(IdentityCache::new(pool.clone(), config.identity_cache));
    let store = EntryStore::new(
        pool.clone(),
        Arc::new(StaticImages),
        Arc::new(TracingAuditLog),
        Arc::new(EventBus::default()),
        identity,
    );

    AppState {
        pool,
        config: Arc::new(config.clone()),
        roles: Arc::new(test_roles()),
        store: Arc::new(store),
        http: reqwest::Client::new(),
    }
}

/// Full application router plus its state, for seeding data directly.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> (Router, AppState) {
    let state = build_test_state(pool, &config);
    (build_app_router(state.clone(), &config), state)
}

pub fn build_test_app(pool: PgPool) -> (Router, AppState) {
    build_test_app_with(pool, test_config())
}

/// `Cookie` header value for a fresh session of `user_id`.
pub async fn login(state: &AppState, user_id: UserId) -> String {
    let token = state
        .store
        .identity()
        .create_session(user_id)
        .await
        .unwrap();
    format!("sid={token}")
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
