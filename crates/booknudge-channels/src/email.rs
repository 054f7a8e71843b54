//! Email sender — async SMTP via lettre.
//!
//! Builds a plain-text message from the rendered reminder and submits it
//! through `AsyncSmtpTransport`. Works with Gmail, Outlook, custom servers.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use booknudge_core::config::EmailChannelConfig;
use booknudge_core::error::{BookNudgeError, Result};
use booknudge_core::traits::ChannelSender;
use booknudge_core::types::{ChannelKind, Recipient, ReminderMessage};

/// SMTP email sender.
pub struct EmailSender {
    config: EmailChannelConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailSender {
    /// Build the sender and its SMTP transport from config.
    pub fn new(config: EmailChannelConfig) -> Result<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| BookNudgeError::Channel(format!("SMTP relay setup: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();
        Ok(Self { config, transport })
    }

    fn from_mailbox(&self) -> Result<Mailbox> {
        let addr = match &self.config.from_name {
            Some(name) => format!("{} <{}>", name, self.config.from_email),
            None => self.config.from_email.clone(),
        };
        addr.parse()
            .map_err(|e| BookNudgeError::Channel(format!("Bad from address: {e}")))
    }

    /// Assemble the lettre message for one reminder.
    fn build_message(&self, to: &str, message: &ReminderMessage) -> Result<Message> {
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| BookNudgeError::Channel(format!("Bad recipient address: {e}")))?;
        Message::builder()
            .from(self.from_mailbox()?)
            .to(to_mailbox)
            .subject(&message.subject)
            .body(message.body.clone())
            .map_err(|e| BookNudgeError::Channel(format!("Email build: {e}")))
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, recipient: &Recipient, message: &ReminderMessage) -> Result<()> {
        let to = recipient
            .email
            .as_deref()
            .ok_or_else(|| BookNudgeError::Channel("No email address on file".into()))?;

        let email = self.build_message(to, message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| BookNudgeError::Channel(format!("SMTP send: {e}")))?;

        tracing::debug!("Email reminder sent to {to}");
        Ok(())
    }
}
