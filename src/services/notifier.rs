//! Progress notifications - capability layer
//!
//! Fire-and-forget status messages at work/volume/batch granularity. A
//! failed notification is logged and swallowed; losing a status message must
//! never fail the batch.

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

/// Notification sink interface
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Notifier that only writes to the log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) {
        info!("📣 {}", message);
    }
}

/// Notifier posting to a Slack-style webhook, with log fallback
pub struct SlackNotifier {
    http: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url: webhook_url.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, message: &str) {
        info!("📣 {}", message);
        let result = self
            .http
            .post(&self.webhook_url)
            .json(&json!({ "text": message }))
            .send()
            .await;
        if let Err(e) = result {
            warn!("notification delivery failed: {}", e);
        }
    }
}
