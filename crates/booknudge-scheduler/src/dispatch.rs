//! Notification dispatch — concurrent fan-out of one firing across channels.
//!
//! Every requested channel is invoked independently with its own timeout;
//! one slow or failing channel never delays or fails the others. The call
//! returns only after every channel has succeeded, failed, or timed out,
//! with exactly one `DeliveryOutcome` per requested channel.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use booknudge_core::config::DispatchConfig;
use booknudge_core::traits::ChannelSender;
use booknudge_core::types::{Appointment, ChannelKind, DeliveryOutcome, ReminderOffset};

use crate::render;

/// Fans one rendered reminder out to the requested channel senders.
pub struct NotificationDispatcher {
    senders: HashMap<ChannelKind, Arc<dyn ChannelSender>>,
    send_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(senders: Vec<Arc<dyn ChannelSender>>, config: &DispatchConfig) -> Self {
        let senders = senders.into_iter().map(|s| (s.kind(), s)).collect();
        Self {
            senders,
            send_timeout: Duration::from_secs(config.send_timeout_secs),
        }
    }

    /// Deliver one firing to every requested channel, concurrently.
    ///
    /// Never fails as a whole: provider errors, timeouts, and unregistered
    /// channels all land as failed outcomes for that channel only.
    pub async fn dispatch(
        &self,
        appointment: &Appointment,
        offset: ReminderOffset,
        channels: &BTreeSet<ChannelKind>,
    ) -> HashMap<ChannelKind, DeliveryOutcome> {
        // Rendered once, shared by every channel of this firing.
        let message = render(appointment, offset);

        let sends = channels.iter().map(|&channel| {
            let message = &message;
            async move {
                let outcome = match self.senders.get(&channel) {
                    None => {
                        DeliveryOutcome::failed(channel, "no sender registered for channel")
                    }
                    Some(sender) => {
                        let send = sender.send(&appointment.recipient, message);
                        match tokio::time::timeout(self.send_timeout, send).await {
                            Ok(Ok(())) => DeliveryOutcome::ok(channel),
                            Ok(Err(e)) => DeliveryOutcome::failed(channel, e.to_string()),
                            Err(_) => DeliveryOutcome::failed(
                                channel,
                                format!("timed out after {}s", self.send_timeout.as_secs()),
                            ),
                        }
                    }
                };
                if let Some(error) = &outcome.error {
                    tracing::warn!(
                        "Reminder delivery via {channel} failed for appointment {}: {error}",
                        appointment.id
                    );
                }
                (channel, outcome)
            }
        });

        join_all(sends).await.into_iter().collect()
    }
}
