//! Reaction-based result picker.
//!
//! After posting numbered results the bot adds keycap reactions and waits
//! for the invoking user to click one. The wait is bounded by a timeout and
//! can be cancelled; both end the flow without a reply.

use std::time::Duration;

use dex_core::types::UserId;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::reactions::ReactionEvent;
use crate::transport::MessageId;

/// Keycap emoji for choices 1 through 10.
pub const KEYCAPS: [&str; 10] = [
    "1\u{fe0f}\u{20e3}",
    "2\u{fe0f}\u{20e3}",
    "3\u{fe0f}\u{20e3}",
    "4\u{fe0f}\u{20e3}",
    "5\u{fe0f}\u{20e3}",
    "6\u{fe0f}\u{20e3}",
    "7\u{fe0f}\u{20e3}",
    "8\u{fe0f}\u{20e3}",
    "9\u{fe0f}\u{20e3}",
    "\u{1f51f}",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    /// 0-based index of the chosen option.
    Picked(usize),
    TimedOut,
    Cancelled,
}

/// Which reactions count as a choice.
#[derive(Debug, Clone, Copy)]
pub struct PickFilter {
    pub message: MessageId,
    pub user: UserId,
    /// Number of options offered (at most [`KEYCAPS`]`.len()`).
    pub options: usize,
}

impl PickFilter {
    /// The option index this reaction selects, if it is a valid choice.
    pub fn choice(&self, event: &ReactionEvent) -> Option<usize> {
        if event.message != self.message || event.user != self.user {
            return None;
        }
        KEYCAPS
            .iter()
            .take(self.options)
            .position(|keycap| *keycap == event.emoji)
    }
}

/// Wait for the first matching reaction.
///
/// Subscribe before adding the reactions so a fast click is not missed.
pub async fn await_pick(
    mut receiver: broadcast::Receiver<ReactionEvent>,
    filter: PickFilter,
    timeout: Duration,
    cancel: &CancellationToken,
) -> PickOutcome {
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return PickOutcome::Cancelled,
            _ = &mut deadline => return PickOutcome::TimedOut,
            received = receiver.recv() => match received {
                Ok(event) => {
                    if let Some(index) = filter.choice(&event) {
                        return PickOutcome::Picked(index);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, message = filter.message, "Picker lagged behind reactions");
                }
                // Hub dropped: nothing more can arrive.
                Err(RecvError::Closed) => return PickOutcome::Cancelled,
            },
        }
    }
}
