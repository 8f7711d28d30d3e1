//! New-entry announcements.
//!
//! [`NewEntryNotifier`] listens on the [`EventBus`](crate::bus::EventBus) for
//! created entries and posts a short message to a webhook. Delivery is a
//! single attempt per event; failures are logged and dropped.

use dex_core::content::url_title;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::{EntryEvent, EntryEventKind};
use crate::delivery::webhook::WebhookDelivery;

/// Background service announcing newly created entries.
pub struct NewEntryNotifier {
    url: String,
    base_url: String,
    delivery: WebhookDelivery,
}

impl NewEntryNotifier {
    /// `base_url` is the public site root used to build entry links.
    pub fn new(url: impl Into<String>, base_url: impl Into<String>, delivery: WebhookDelivery) -> Self {
        Self {
            url: url.into(),
            base_url: base_url.into(),
            delivery,
        }
    }

    /// Consume events until the bus closes or `cancel` fires.
    pub async fn run(self, mut receiver: broadcast::Receiver<EntryEvent>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("New-entry notifier cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) if event.kind == EntryEventKind::Created => {
                        let payload = self.payload(&event);
                        let delivery = self.delivery.clone();
                        let url = self.url.clone();
                        tokio::spawn(async move {
                            if let Err(e) = delivery.send_once(&url, &payload).await {
                                tracing::warn!(error = %e, "New-entry notification failed");
                            }
                        });
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "New-entry notifier lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, new-entry notifier shutting down");
                        break;
                    }
                },
            }
        }
    }

    /// Message body announcing a created entry.
    fn payload(&self, event: &EntryEvent) -> serde_json::Value {
        let link = format!(
            "{}/entry/{}",
            self.base_url.trim_end_matches('/'),
            url_title(&event.title)
        );
        serde_json::json!({
            "content": format!("New entry: **{}** {link}", event.title),
            "entry_id": event.entry_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;

    fn notifier() -> NewEntryNotifier {
        NewEntryNotifier::new("http://127.0.0.1:9/hook", "https://dex.example/", WebhookDelivery::new())
    }

    #[test]
    fn payload_links_to_entry_page() {
        let event = EntryEvent::new(EntryEventKind::Created, "abc", "Big cats", 3);
        let payload = notifier().payload(&event);
        assert_eq!(
            payload["content"],
            "New entry: **Big cats** https://dex.example/entry/Big_cats"
        );
        assert_eq!(payload["entry_id"], "abc");
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let bus = EventBus::default();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(notifier().run(bus.subscribe(), cancel.clone()));
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn run_stops_when_bus_closes() {
        let bus = EventBus::default();
        let receiver = bus.subscribe();
        drop(bus);
        notifier().run(receiver, CancellationToken::new()).await;
    }
}
