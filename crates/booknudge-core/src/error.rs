//! BookNudge error types.

use thiserror::Error;

use crate::types::{AppointmentId, ReminderOffset};

/// Errors surfaced by the reminder core.
///
/// Only caller-misuse conditions come back as `Err` from the public contract.
/// Per-channel delivery failures are data (`DeliveryOutcome`), never errors.
#[derive(Debug, Error)]
pub enum BookNudgeError {
    /// Configuration load/parse failure, or invalid reminder settings.
    #[error("Config error: {0}")]
    Config(String),

    /// A channel sender failed to deliver. Only ever observed inside a
    /// `DeliveryOutcome`; `dispatch` never propagates it.
    #[error("Channel error: {0}")]
    Channel(String),

    /// `schedule` called for a key that already has a pending reminder.
    /// The caller must `cancel` before re-scheduling.
    #[error("Reminder already pending for appointment {appointment_id} at offset {offset}")]
    DuplicateReminder {
        appointment_id: AppointmentId,
        offset: ReminderOffset,
    },

    /// Appointment source lookup failure at the booking-domain boundary.
    #[error("Appointment source error: {0}")]
    Source(String),
}

/// Result alias used across BookNudge crates.
pub type Result<T> = std::result::Result<T, BookNudgeError>;
