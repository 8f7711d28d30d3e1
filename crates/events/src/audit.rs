//! Moderation audit log.
//!
//! Every edit and delete is written to an [`AuditLog`]. Edit records are
//! best-effort and sent once; a delete must be recorded before the row is
//! removed, so its delivery is retried and a failing sink blocks the delete.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use dex_core::types::UserId;

use crate::delivery::webhook::{WebhookDelivery, WebhookError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Edit,
    Delete,
}

impl AuditAction {
    fn verb(self) -> &'static str {
        match self {
            AuditAction::Edit => "edited",
            AuditAction::Delete => "deleted",
        }
    }
}

/// One moderation record.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub action: AuditAction,
    pub actor: UserId,
    pub entry_id: String,
    pub title: String,
    /// Entry content at the time of the action (deletes keep a copy).
    pub content: Option<String>,
    pub time: DateTime<Utc>,
}

impl AuditRecord {
    pub fn edit(actor: UserId, entry_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            action: AuditAction::Edit,
            actor,
            entry_id: entry_id.into(),
            title: title.into(),
            content: None,
            time: Utc::now(),
        }
    }

    pub fn delete(
        actor: UserId,
        entry_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            action: AuditAction::Delete,
            actor,
            entry_id: entry_id.into(),
            title: title.into(),
            content: Some(content.into()),
            time: Utc::now(),
        }
    }

    /// One-line chat rendering, e.g. `<@1> edited **Cats** (abc)`.
    pub fn line(&self) -> String {
        format!(
            "<@{}> {} **{}** ({})",
            self.actor,
            self.action.verb(),
            self.title,
            self.entry_id
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Audit delivery failed: {0}")]
    Delivery(#[from] WebhookError),
}

/// Destination for moderation records.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

// ---------------------------------------------------------------------------
// Chat log channel (webhook)
// ---------------------------------------------------------------------------

/// Posts records to a chat log channel through its incoming webhook.
pub struct ChatLogWebhook {
    url: String,
    delivery: WebhookDelivery,
}

impl ChatLogWebhook {
    pub fn new(url: impl Into<String>, delivery: WebhookDelivery) -> Self {
        Self {
            url: url.into(),
            delivery,
        }
    }

    fn payload(record: &AuditRecord) -> serde_json::Value {
        serde_json::json!({
            "content": record.line(),
            "audit": record,
        })
    }
}

#[async_trait]
impl AuditLog for ChatLogWebhook {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let payload = Self::payload(record);
        match record.action {
            AuditAction::Edit => self.delivery.send_once(&self.url, &payload).await?,
            AuditAction::Delete => self.delivery.deliver(&self.url, &payload).await?,
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Writes records to the process log. Used when no log channel is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLog;

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        tracing::info!(
            action = ?record.action,
            actor = record.actor,
            entry_id = %record.entry_id,
            title = %record.title,
            "Audit"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    // Port 9 (discard) refuses connections on loopback.
    const DEAD_URL: &str = "http://127.0.0.1:9/hook";

    fn dead_log(backoff: Duration) -> ChatLogWebhook {
        ChatLogWebhook::new(DEAD_URL, WebhookDelivery::new().with_backoff(vec![backoff]))
    }

    #[test]
    fn line_names_actor_action_and_entry() {
        let record = AuditRecord::edit(12, "abc", "Cats");
        assert_eq!(record.line(), "<@12> edited **Cats** (abc)");

        let record = AuditRecord::delete(3, "x", "Dogs", "<p>woof</p>");
        assert_eq!(record.line(), "<@3> deleted **Dogs** (x)");
    }

    #[test]
    fn webhook_payload_carries_record() {
        let record = AuditRecord::delete(3, "x", "Dogs", "<p>woof</p>");
        let payload = ChatLogWebhook::payload(&record);
        assert_eq!(payload["audit"]["action"], "delete");
        assert_eq!(payload["audit"]["content"], "<p>woof</p>");
        assert_eq!(payload["content"], record.line());
    }

    #[tokio::test]
    async fn tracing_sink_always_succeeds() {
        assert!(TracingAuditLog.record(&AuditRecord::edit(1, "a", "A")).await.is_ok());
    }

    #[tokio::test]
    async fn edit_records_are_not_retried() {
        let log = dead_log(Duration::from_secs(30));
        let started = Instant::now();
        let result = log.record(&AuditRecord::edit(1, "a", "A")).await;
        assert!(matches!(result, Err(AuditError::Delivery(_))));
        assert!(started.elapsed() < Duration::from_secs(15));
    }

    #[tokio::test]
    async fn delete_records_are_retried() {
        let log = dead_log(Duration::from_millis(50));
        let started = Instant::now();
        let result = log.record(&AuditRecord::delete(1, "a", "A", "<p>a</p>")).await;
        assert!(result.is_err());
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
