//! Reminder message rendering.
//!
//! One message per appointment + offset, shared by every channel of a
//! firing. Channels may adapt formatting (SMS compacts to one line) but the
//! semantic content is rendered exactly once.

use booknudge_core::types::{Appointment, ReminderMessage, ReminderOffset};

/// Render the reminder for one firing.
pub fn render(appointment: &Appointment, offset: ReminderOffset) -> ReminderMessage {
    let subject = format!("Reminder: {}", appointment.service_name);
    let when = appointment.scheduled_at.format("%Y-%m-%d %H:%M UTC");
    let body = format!(
        "Your {} with {} is {} ({}). See you soon!",
        appointment.service_name,
        appointment.professional_name,
        offset.lead_phrase(),
        when
    );
    ReminderMessage { subject, body }
}
