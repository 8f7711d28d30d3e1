//! Chat webhook posts.
//!
//! Audit records must reach the log channel, so [`WebhookDelivery::deliver`]
//! retries with backoff. Announcements use [`WebhookDelivery::send_once`].

use std::time::Duration;

/// Waits between attempts: 1 s, 2 s, 4 s, then give up.
const DEFAULT_BACKOFF: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// Per-attempt HTTP timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

/// Posts JSON bodies to chat webhooks. Cloning shares the HTTP client.
#[derive(Clone)]
pub struct WebhookDelivery {
    client: reqwest::Client,
    backoff: Vec<Duration>,
}

impl WebhookDelivery {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            backoff: DEFAULT_BACKOFF.to_vec(),
        }
    }

    /// Replace the waits between attempts. One attempt is made per wait,
    /// plus the first.
    pub fn with_backoff(mut self, backoff: Vec<Duration>) -> Self {
        self.backoff = backoff;
        self
    }

    /// Post `payload`, retrying failures. Returns the last error once every
    /// attempt has failed.
    pub async fn deliver(&self, url: &str, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let mut waits = self.backoff.iter();
        let mut attempt = 1;
        loop {
            let err = match self.send_once(url, payload).await {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };
            let Some(wait) = waits.next() else {
                tracing::error!(url, attempt, error = %err, "Webhook delivery gave up");
                return Err(err);
            };
            tracing::warn!(url, attempt, error = %err, retry_in = ?wait, "Webhook delivery failed");
            tokio::time::sleep(*wait).await;
            attempt += 1;
        }
    }

    /// A single POST.
    pub async fn send_once(&self, url: &str, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }
}

impl Default for WebhookDelivery {
    fn default() -> Self {
        Self::new()
    }
}
