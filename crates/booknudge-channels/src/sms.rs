//! SMS sender — Twilio Messages API.
//!
//! Posts form-encoded `To`/`From`/`Body` with basic auth. The rendered body
//! is compacted to a single line before sending.

use async_trait::async_trait;

use booknudge_core::config::SmsChannelConfig;
use booknudge_core::error::{BookNudgeError, Result};
use booknudge_core::traits::ChannelSender;
use booknudge_core::types::{ChannelKind, Recipient, ReminderMessage};

/// Twilio-backed SMS sender.
pub struct SmsSender {
    config: SmsChannelConfig,
    client: reqwest::Client,
}

impl SmsSender {
    pub fn new(config: SmsChannelConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base, self.config.account_sid
        )
    }

    /// Single-line SMS body: subject, then the body with newlines collapsed.
    fn sms_body(message: &ReminderMessage) -> String {
        let body = message.body.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("{}: {}", message.subject, body)
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn send(&self, recipient: &Recipient, message: &ReminderMessage) -> Result<()> {
        let to = recipient
            .phone
            .as_deref()
            .ok_or_else(|| BookNudgeError::Channel("No phone number on file".into()))?;

        let body = Self::sms_body(message);
        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", body.as_str()),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| BookNudgeError::Channel(format!("SMS API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BookNudgeError::Channel(format!(
                "SMS API error {status}: {error_text}"
            )));
        }

        tracing::debug!("SMS reminder sent to {to}");
        Ok(())
    }
}
