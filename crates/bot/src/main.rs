use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dex_bot::config::BotConfig;
use dex_bot::console::{ConsoleInput, ConsoleTransport};
use dex_bot::dispatcher::Dispatcher;
use dex_bot::reactions::ReactionHub;
use dex_core::roles::RoleConfig;
use dex_events::{AuditLog, ChatLogWebhook, EventBus, TracingAuditLog, WebhookDelivery};
use dex_store::{EntryStore, HttpImageResolver, IdentityCache};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they do not interleave with console replies.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dex_bot=info,dex_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = BotConfig::from_env();
    let roles = Arc::new(RoleConfig::from_env());

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = dex_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    dex_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    let audit: Arc<dyn AuditLog> = match std::env::var("AUDIT_WEBHOOK_URL") {
        Ok(url) if !url.is_empty() => Arc::new(ChatLogWebhook::new(url, WebhookDelivery::new())),
        _ => Arc::new(TracingAuditLog),
    };

    let identity = Arc::new(IdentityCache::new(pool.clone(), config.identity_cache));
    let store = Arc::new(EntryStore::new(
        pool,
        Arc::new(HttpImageResolver::new()),
        audit,
        Arc::new(EventBus::default()),
        identity,
    ));

    let console_user = std::env::var("CONSOLE_USER_ID")
        .unwrap_or_else(|_| "0".into())
        .parse()
        .context("CONSOLE_USER_ID must be a numeric user id")?;
    let transport = Arc::new(ConsoleTransport::new(console_user, "console"));

    let reactions = ReactionHub::default();
    let cancel = CancellationToken::new();
    let dispatcher = Arc::new(Dispatcher::new(
        store,
        roles,
        transport.clone(),
        reactions.clone(),
        config.clone(),
        cancel.clone(),
    ));

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received SIGINT, shutting down");
                cancel.cancel();
            }
        }
    });

    tracing::info!(prefix = %config.prefix, user = console_user, "Console bot ready");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };
        let Some(line) = line else {
            break;
        };

        match transport.interpret(&line).await {
            ConsoleInput::Message(message) => {
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move {
                    if let Err(err) = dispatcher.handle(&message).await {
                        tracing::error!(error = %err, content = %message.content, "Command failed");
                    }
                });
            }
            ConsoleInput::Reaction(event) => reactions.publish(event),
            ConsoleInput::Ignored => tracing::warn!("Nothing to react to"),
        }
    }

    cancel.cancel();
    tracing::info!("Console bot stopped");
    Ok(())
}
