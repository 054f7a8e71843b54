//! # BookNudge Scheduler
//!
//! Appointment reminder scheduling and multi-channel notification dispatch.
//! In-process, timer-driven, zero overhead between firings.
//!
//! ## Architecture
//! ```text
//! ReminderScheduler
//!   ├── schedule(appointment, settings) → one timer task per future offset
//!   ├── cancel(appointment_id)          → disarm every pending timer
//!   └── reschedule(appointment, new)    → cancel, then schedule
//!
//! timer elapses → claim from ReminderRegistry (gone = cancelled, skip)
//!   → NotificationDispatcher (render once, fan out concurrently)
//!       ├── email  ┐
//!       ├── sms    ├─ join-all, per-channel timeout
//!       └── push   ┘
//!   → aggregate DeliveryOutcomes → FiringRecord in bounded history
//! ```
//!
//! Timers are in-memory only; pending reminders do not survive a process
//! restart. The registry is per-instance, so a durable due-time index can
//! replace it without touching the scheduler contract.

pub mod dispatch;
pub mod registry;
pub mod render;
pub mod scheduler;

pub use dispatch::NotificationDispatcher;
pub use registry::{ReminderKey, ReminderRegistry};
pub use render::render;
pub use scheduler::ReminderScheduler;
