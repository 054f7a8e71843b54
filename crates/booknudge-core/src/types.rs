//! Reminder data model — appointments, offsets, settings, outcomes.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BookNudgeError, Result};

/// Unique appointment identifier, owned by the booking domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppointmentId(Uuid);

impl AppointmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for AppointmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Contact addresses for the client behind an appointment.
/// Each sender picks the address for its own channel; a missing address
/// fails that channel's send only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub push_token: Option<String>,
}

/// A confirmed appointment, read-only to this core.
///
/// `scheduled_at` is immutable once a reminder has been armed against it —
/// a changed time goes through cancel + reschedule, never in-place mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    /// Absolute instant the appointment takes place.
    pub scheduled_at: DateTime<Utc>,
    /// Display name of the booked service (e.g. "Haircut & Style").
    pub service_name: String,
    /// Display name of the service professional.
    pub professional_name: String,
    /// Where reminders for this appointment get delivered.
    pub recipient: Recipient,
}

/// A notification channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Sms,
    Push,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
            ChannelKind::Sms => "sms",
            ChannelKind::Push => "push",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long before the appointment a reminder fires, in whole minutes.
///
/// `fire time = appointment time - offset`. Offsets within one settings
/// revision are unique (set semantics).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReminderOffset {
    minutes: i64,
}

impl ReminderOffset {
    pub fn minutes(minutes: i64) -> Self {
        Self { minutes }
    }

    pub fn hours(hours: i64) -> Self {
        Self { minutes: hours * 60 }
    }

    pub fn as_minutes(&self) -> i64 {
        self.minutes
    }

    /// The offset as a chrono duration, for fire-time arithmetic.
    pub fn to_duration(&self) -> Duration {
        Duration::minutes(self.minutes)
    }

    /// Lead phrase for message rendering: "in 24 hours", "in 30 minutes".
    pub fn lead_phrase(&self) -> String {
        if self.minutes % 60 == 0 {
            let hours = self.minutes / 60;
            if hours == 1 {
                "in 1 hour".to_string()
            } else {
                format!("in {hours} hours")
            }
        } else if self.minutes == 1 {
            "in 1 minute".to_string()
        } else {
            format!("in {} minutes", self.minutes)
        }
    }
}

impl fmt::Display for ReminderOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minutes % 60 == 0 {
            write!(f, "{}h", self.minutes / 60)
        } else {
            write!(f, "{}m", self.minutes)
        }
    }
}

/// Per-appointment reminder preferences: which channels, which offsets.
///
/// Replaced wholesale on update (via `reschedule`), never patched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderSettings {
    pub channels: BTreeSet<ChannelKind>,
    pub offsets: BTreeSet<ReminderOffset>,
}

impl ReminderSettings {
    /// Build settings. The channel set must be non-empty.
    pub fn new(
        channels: impl IntoIterator<Item = ChannelKind>,
        offsets: impl IntoIterator<Item = ReminderOffset>,
    ) -> Result<Self> {
        let channels: BTreeSet<ChannelKind> = channels.into_iter().collect();
        if channels.is_empty() {
            return Err(BookNudgeError::Config(
                "reminder settings need at least one channel".into(),
            ));
        }
        Ok(Self {
            channels,
            offsets: offsets.into_iter().collect(),
        })
    }
}

/// Lifecycle of a scheduled reminder.
///
/// `Pending -> Firing -> {Delivered | PartiallyDelivered | Failed}`, or
/// `Pending -> Cancelled`. No transition leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderStatus {
    Pending,
    Firing,
    Delivered,
    PartiallyDelivered,
    Failed,
    Cancelled,
}

impl ReminderStatus {
    /// Terminal status for one firing, derived from its per-channel outcomes.
    pub fn from_outcomes(outcomes: &[DeliveryOutcome]) -> Self {
        let delivered = outcomes.iter().filter(|o| o.success).count();
        if delivered == outcomes.len() && !outcomes.is_empty() {
            ReminderStatus::Delivered
        } else if delivered > 0 {
            ReminderStatus::PartiallyDelivered
        } else {
            ReminderStatus::Failed
        }
    }
}

/// Result of one channel's send within one firing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub channel: ChannelKind,
    pub success: bool,
    /// Failure detail when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn ok(channel: ChannelKind) -> Self {
        Self {
            channel,
            success: true,
            error: None,
        }
    }

    pub fn failed(channel: ChannelKind, reason: impl Into<String>) -> Self {
        Self {
            channel,
            success: false,
            error: Some(reason.into()),
        }
    }
}

/// Rendered reminder content, shared by every channel of one firing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderMessage {
    pub subject: String,
    pub body: String,
}

/// Audit record of one completed firing, surfaced back to the booking domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiringRecord {
    pub appointment_id: AppointmentId,
    pub offset: ReminderOffset,
    pub fired_at: DateTime<Utc>,
    pub status: ReminderStatus,
    /// One outcome per requested channel, in channel order.
    pub outcomes: Vec<DeliveryOutcome>,
}
