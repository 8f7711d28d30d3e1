//! In-process fan-out of entry lifecycle events.
//!
//! The store publishes an [`EntryEvent`] after each committed change;
//! background services (the new-entry notifier) subscribe. Publishing never
//! blocks and never fails: with no subscribers the event is dropped.

use chrono::{DateTime, Utc};
use dex_core::types::{EntryId, UserId};
use serde::Serialize;
use tokio::sync::broadcast;

/// What happened to the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryEventKind {
    /// An edit inserted a brand-new row.
    Created,
    /// Any committed edit, including the one that created the entry.
    Edited,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryEvent {
    pub kind: EntryEventKind,
    pub entry_id: EntryId,
    pub title: String,
    pub actor: UserId,
    pub at: DateTime<Utc>,
}

impl EntryEvent {
    pub fn new(
        kind: EntryEventKind,
        entry_id: impl Into<EntryId>,
        title: impl Into<String>,
        actor: UserId,
    ) -> Self {
        Self {
            kind,
            entry_id: entry_id.into(),
            title: title.into(),
            actor,
            at: Utc::now(),
        }
    }
}

/// Buffered events per subscriber before the slowest one starts lagging.
const DEFAULT_CAPACITY: usize = 256;

/// Shared as `Arc<EventBus>` between the store and its subscribers.
pub struct EventBus {
    sender: broadcast::Sender<EntryEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: EntryEvent) {
        let kind = event.kind;
        if self.sender.send(event).is_err() {
            tracing::trace!(?kind, "No event subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EntryEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(EntryEvent::new(EntryEventKind::Created, "abc", "Cats", 7));

        let seen = first.recv().await.unwrap();
        assert_eq!(seen.kind, EntryEventKind::Created);
        assert_eq!(seen.entry_id, "abc");
        assert_eq!(seen.actor, 7);
        assert_eq!(second.recv().await.unwrap(), seen);
    }

    #[test]
    fn publishing_without_subscribers_is_a_no_op() {
        EventBus::default().publish(EntryEvent::new(EntryEventKind::Deleted, "x", "X", 1));
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_value(EntryEventKind::Created).unwrap();
        assert_eq!(json, "created");
    }
}
