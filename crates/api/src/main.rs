use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dex_api::config::ServerConfig;
use dex_api::router::build_app_router;
use dex_api::state::AppState;
use dex_core::roles::RoleConfig;
use dex_events::{AuditLog, ChatLogWebhook, EventBus, NewEntryNotifier, TracingAuditLog, WebhookDelivery};
use dex_store::{EntryStore, HttpImageResolver, IdentityCache};

/// Timeout for outbound calls made on behalf of a request.
const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dex_api=debug,dex_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let roles = RoleConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        admins = roles.admins.len(),
        editors = roles.editors.len(),
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = dex_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    dex_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    dex_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let delivery = WebhookDelivery::new();

    // Spawn the new-entry notifier when a webhook is configured.
    let notifier_cancel = CancellationToken::new();
    let notifier_handle = config.new_entry_webhook_url.clone().map(|url| {
        let notifier = NewEntryNotifier::new(url, config.base_url.clone(), delivery.clone());
        tokio::spawn(notifier.run(event_bus.subscribe(), notifier_cancel.clone()))
    });

    // --- Audit log ---
    let audit: Arc<dyn AuditLog> = match &config.audit_webhook_url {
        Some(url) => Arc::new(ChatLogWebhook::new(url.clone(), delivery.clone())),
        None => {
            tracing::warn!("AUDIT_WEBHOOK_URL not set, moderation actions are only logged locally");
            Arc::new(TracingAuditLog)
        }
    };

    // --- Entry store ---
    let identity = Arc::new(IdentityCache::new(pool.clone(), config.identity_cache));
    let store = Arc::new(EntryStore::new(
        pool.clone(),
        Arc::new(HttpImageResolver::new()),
        audit,
        Arc::clone(&event_bus),
        identity,
    ));

    let http = reqwest::Client::builder()
        .timeout(OUTBOUND_TIMEOUT)
        .build()
        .expect("Failed to build reqwest HTTP client");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        roles: Arc::new(roles),
        store,
        http,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    notifier_cancel.cancel();
    if let Some(handle) = notifier_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("New-entry notifier stopped");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
