//! # BookNudge Channels
//!
//! One `ChannelSender` implementation per notification transport:
//! email (SMTP), SMS (Twilio Messages API), push (FCM).
//!
//! Each sender owns its provider detail — credentials, endpoints, formatting.
//! The scheduler core only sees the narrow `ChannelSender` boundary.

pub mod email;
pub mod push;
pub mod sms;

use std::sync::Arc;

use booknudge_core::config::BookNudgeConfig;
use booknudge_core::traits::ChannelSender;

pub use email::EmailSender;
pub use push::PushSender;
pub use sms::SmsSender;

/// Build every enabled, fully-configured sender from config.
/// Called at service init to wire the dispatcher.
pub fn senders_from_config(config: &BookNudgeConfig) -> Vec<Arc<dyn ChannelSender>> {
    let mut senders: Vec<Arc<dyn ChannelSender>> = Vec::new();

    if let Some(email) = &config.channel.email
        && email.enabled
        && !email.smtp_host.is_empty()
    {
        match EmailSender::new(email.clone()) {
            Ok(sender) => senders.push(Arc::new(sender)),
            Err(e) => tracing::warn!("Email sender disabled: {e}"),
        }
    }

    if let Some(sms) = &config.channel.sms
        && sms.enabled
        && !sms.account_sid.is_empty()
    {
        senders.push(Arc::new(SmsSender::new(sms.clone())));
    }

    if let Some(push) = &config.channel.push
        && push.enabled
        && !push.server_key.is_empty()
    {
        senders.push(Arc::new(PushSender::new(push.clone())));
    }

    senders
}
