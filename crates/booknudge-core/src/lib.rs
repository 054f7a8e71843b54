//! # BookNudge Core
//!
//! Shared building blocks for the appointment reminder subsystem:
//! data model, channel/appointment-source traits, error type, config.
//!
//! The scheduling and dispatch logic lives in `booknudge-scheduler`;
//! concrete channel transports live in `booknudge-channels`.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::BookNudgeConfig;
pub use error::{BookNudgeError, Result};
pub use traits::{AppointmentSource, ChannelSender};
pub use types::{
    Appointment, AppointmentId, ChannelKind, DeliveryOutcome, FiringRecord, Recipient,
    ReminderMessage, ReminderOffset, ReminderSettings, ReminderStatus,
};
