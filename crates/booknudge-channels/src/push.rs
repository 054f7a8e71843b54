//! Push sender — FCM HTTP API.
//!
//! Posts a JSON notification payload keyed by the client's device token.

use async_trait::async_trait;

use booknudge_core::config::PushChannelConfig;
use booknudge_core::error::{BookNudgeError, Result};
use booknudge_core::traits::ChannelSender;
use booknudge_core::types::{ChannelKind, Recipient, ReminderMessage};

/// FCM-backed push sender.
pub struct PushSender {
    config: PushChannelConfig,
    client: reqwest::Client,
}

impl PushSender {
    pub fn new(config: PushChannelConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// FCM notification payload for one reminder.
    fn payload(token: &str, message: &ReminderMessage) -> serde_json::Value {
        serde_json::json!({
            "to": token,
            "notification": {
                "title": message.subject,
                "body": message.body,
            },
            "priority": "high",
        })
    }
}

#[async_trait]
impl ChannelSender for PushSender {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Push
    }

    async fn send(&self, recipient: &Recipient, message: &ReminderMessage) -> Result<()> {
        let token = recipient
            .push_token
            .as_deref()
            .ok_or_else(|| BookNudgeError::Channel("No push token on file".into()))?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("key={}", self.config.server_key))
            .json(&Self::payload(token, message))
            .send()
            .await
            .map_err(|e| BookNudgeError::Channel(format!("Push API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BookNudgeError::Channel(format!(
                "Push API error {status}: {error_text}"
            )));
        }

        tracing::debug!("Push reminder sent to device token ending {}", tail(token));
        Ok(())
    }
}

/// Last few characters of a token, for log lines that must not leak it.
fn tail(token: &str) -> &str {
    let split = token.len().saturating_sub(6);
    token.get(split..).unwrap_or(token)
}
