//! A transport that talks over stdin/stdout, for local use.
//!
//! Each stdin line is a message from the configured console user. A line
//! of the form `react <n>` clicks keycap `n` on the bot's latest message.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dex_core::types::UserId;
use tokio::sync::Mutex;

use crate::picker::KEYCAPS;
use crate::reactions::ReactionEvent;
use crate::transport::{ChannelId, ChatTransport, IncomingMessage, MessageId, Reply, TransportError};

/// Channel id used for every console message.
pub const CONSOLE_CHANNEL: ChannelId = 1;

/// What a console input line means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Message(IncomingMessage),
    Reaction(ReactionEvent),
    /// `react` with no bot message to react to, or a bad index.
    Ignored,
}

pub struct ConsoleTransport {
    user: UserId,
    user_name: String,
    next_id: AtomicU64,
    last_bot_message: Mutex<Option<MessageId>>,
}

impl ConsoleTransport {
    pub fn new(user: UserId, user_name: impl Into<String>) -> Self {
        Self {
            user,
            user_name: user_name.into(),
            next_id: AtomicU64::new(1),
            last_bot_message: Mutex::new(None),
        }
    }

    fn next_id(&self) -> MessageId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Interpret one line typed by the console user.
    pub async fn interpret(&self, line: &str) -> ConsoleInput {
        if let Some(arg) = line.trim().strip_prefix("react ") {
            let target = *self.last_bot_message.lock().await;
            let keycap = arg
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| KEYCAPS.get(i));
            return match (target, keycap) {
                (Some(message), Some(emoji)) => ConsoleInput::Reaction(ReactionEvent {
                    message,
                    user: self.user,
                    emoji: emoji.to_string(),
                }),
                _ => ConsoleInput::Ignored,
            };
        }

        ConsoleInput::Message(IncomingMessage {
            id: self.next_id(),
            channel: CONSOLE_CHANNEL,
            author: self.user,
            author_name: self.user_name.clone(),
            content: line.to_string(),
        })
    }

    fn print(&self, header: &str, reply: &Reply) -> Result<(), TransportError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{header}")?;
        match reply {
            Reply::Text(text) => writeln!(out, "{text}")?,
            Reply::Embed(embed) => write!(out, "{embed}")?,
        }
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send(&self, _channel: ChannelId, reply: Reply) -> Result<MessageId, TransportError> {
        let id = self.next_id();
        self.print(&format!("[bot #{id}]"), &reply)?;
        *self.last_bot_message.lock().await = Some(id);
        Ok(id)
    }

    async fn react(
        &self,
        _channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), TransportError> {
        self.print(&format!("[bot reacted {emoji} on #{message}]"), &Reply::Text(String::new()))
    }

    async fn send_to_log_channel(&self, reply: Reply) -> Result<MessageId, TransportError> {
        let id = self.next_id();
        self.print(&format!("[log channel #{id}]"), &reply)?;
        Ok(id)
    }
}
