//! The seam between the dispatcher and a concrete chat platform.

use async_trait::async_trait;
use dex_core::types::UserId;

use crate::embed::Embed;

pub type ChannelId = u64;
pub type MessageId = u64;

/// A message received from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: MessageId,
    pub channel: ChannelId,
    pub author: UserId,
    pub author_name: String,
    pub content: String,
}

/// What the bot sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Embed(Embed),
}

impl From<Embed> for Reply {
    fn from(embed: Embed) -> Self {
        Reply::Embed(embed)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Chat platform rejected the request: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post a reply in `channel` and return the new message's id.
    async fn send(&self, channel: ChannelId, reply: Reply) -> Result<MessageId, TransportError>;

    /// Add a reaction to one of the bot's messages.
    async fn react(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), TransportError>;

    /// Post to the staff log channel where entry requests go.
    async fn send_to_log_channel(&self, reply: Reply) -> Result<MessageId, TransportError>;
}
