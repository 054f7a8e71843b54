//! Boundary traits between the reminder core and the outside world.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Appointment, AppointmentId, ChannelKind, Recipient, ReminderMessage};

/// One notification transport (email, SMS, push).
///
/// Implementations own every channel-specific detail: provider credentials,
/// rate limits, and retry policy. The core only hands over a rendered message
/// and an addressee and observes success or failure.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Which channel this sender serves.
    fn kind(&self) -> ChannelKind;

    /// Deliver one rendered reminder to the recipient.
    async fn send(&self, recipient: &Recipient, message: &ReminderMessage) -> Result<()>;
}

/// Read-only adapter over the booking domain's appointment store.
///
/// The core never mutates appointments; it only materializes the data
/// needed to schedule or reschedule reminders.
#[async_trait]
pub trait AppointmentSource: Send + Sync {
    /// Look up an appointment by id. `Ok(None)` means it does not exist.
    async fn appointment(&self, id: AppointmentId) -> Result<Option<Appointment>>;
}
