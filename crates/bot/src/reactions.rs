//! Fan-out of reaction events to whoever is waiting on them.

use dex_core::types::UserId;
use tokio::sync::broadcast;

use crate::transport::MessageId;

/// Default channel capacity for the reaction hub.
const DEFAULT_CAPACITY: usize = 256;

/// A user added a reaction to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub message: MessageId,
    pub user: UserId,
    pub emoji: String,
}

/// Broadcasts reactions from the transport to pending pickers.
///
/// Subscribers that lag behind miss events; a picker treats that like any
/// other non-matching reaction.
#[derive(Debug, Clone)]
pub struct ReactionHub {
    sender: broadcast::Sender<ReactionEvent>,
}

impl ReactionHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a reaction. Without subscribers it is dropped.
    pub fn publish(&self, event: ReactionEvent) {
        let receivers = self.sender.send(event).unwrap_or(0);
        tracing::trace!(receivers, "Reaction published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReactionEvent> {
        self.sender.subscribe()
    }
}

impl Default for ReactionHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_reactions() {
        let hub = ReactionHub::default();
        let mut rx = hub.subscribe();
        let event = ReactionEvent {
            message: 1,
            user: 2,
            emoji: "1️⃣".into(),
        };

        hub.publish(event.clone());
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        ReactionHub::default().publish(ReactionEvent {
            message: 1,
            user: 2,
            emoji: "x".into(),
        });
    }
}
