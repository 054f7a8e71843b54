//! Reminder scheduler — the orchestrating core.
//!
//! Owns the pending-reminder registry and a bounded firing history. Each
//! accepted offset gets its own timer task; firings run on their own tasks,
//! so a slow channel on one appointment never delays another's reminder.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use booknudge_core::config::BookNudgeConfig;
use booknudge_core::error::{BookNudgeError, Result};
use booknudge_core::traits::{AppointmentSource, ChannelSender};
use booknudge_core::types::{
    Appointment, AppointmentId, ChannelKind, FiringRecord, ReminderOffset, ReminderSettings,
    ReminderStatus,
};

use crate::dispatch::NotificationDispatcher;
use crate::registry::{ReminderKey, ReminderRegistry};

/// Cheaply cloneable handle to one scheduler instance.
///
/// Cancellation is best-effort against in-flight dispatch: once a firing has
/// claimed its registry entry, `cancel` no longer affects it — channel sends
/// already underway run to completion and their record still lands in
/// history, so a send that actually went out is never lost to audit.
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    registry: ReminderRegistry,
    dispatcher: NotificationDispatcher,
    /// Completed firings, newest last. Bounded ring buffer.
    history: Mutex<VecDeque<FiringRecord>>,
    history_limit: usize,
}

impl ReminderScheduler {
    /// Create a scheduler with its own empty registry.
    pub fn new(dispatcher: NotificationDispatcher, history_limit: usize) -> Self {
        Self::with_registry(ReminderRegistry::new(), dispatcher, history_limit)
    }

    /// Create a scheduler around an injected registry.
    pub fn with_registry(
        registry: ReminderRegistry,
        dispatcher: NotificationDispatcher,
        history_limit: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                dispatcher,
                history: Mutex::new(VecDeque::new()),
                history_limit,
            }),
        }
    }

    /// Wire a scheduler from config and the configured channel senders.
    pub fn from_config(config: &BookNudgeConfig, senders: Vec<Arc<dyn ChannelSender>>) -> Self {
        let dispatcher = NotificationDispatcher::new(senders, &config.dispatch);
        Self::new(dispatcher, config.dispatch.history_limit)
    }

    /// Arm one reminder per future offset in `settings`.
    ///
    /// Offsets whose fire time is not strictly in the future are silently
    /// skipped. If any remaining (appointment, offset) key already has a
    /// pending reminder, the whole call fails with `DuplicateReminder` and
    /// arms nothing — callers must `cancel` first.
    ///
    /// Returns the accepted offsets, largest (earliest-firing) first.
    ///
    /// Must be called within a tokio runtime.
    pub fn schedule(
        &self,
        appointment: &Appointment,
        settings: &ReminderSettings,
    ) -> Result<Vec<ReminderOffset>> {
        let now = Utc::now();
        let mut entries: Vec<(ReminderKey, DateTime<Utc>)> = Vec::new();
        for offset in &settings.offsets {
            let fire_at = appointment.scheduled_at - offset.to_duration();
            if fire_at <= now {
                tracing::debug!(
                    "Skipping past-due {offset} reminder for appointment {}",
                    appointment.id
                );
                continue;
            }
            entries.push(((appointment.id, *offset), fire_at));
        }
        // Earliest fire time first.
        entries.sort_by_key(|(_, fire_at)| *fire_at);

        let inner = Arc::clone(&self.inner);
        let channels = settings.channels.clone();
        self.inner.registry.arm(&entries, |key, fire_at| {
            let inner = Arc::clone(&inner);
            let appointment = appointment.clone();
            let channels = channels.clone();
            tokio::spawn(async move {
                wait_until(fire_at).await;
                inner.fire(key, &appointment, &channels).await;
            })
        })?;

        let accepted: Vec<ReminderOffset> = entries.iter().map(|((_, offset), _)| *offset).collect();
        tracing::info!(
            "Scheduled {} reminder(s) for appointment {} at {}",
            accepted.len(),
            appointment.id,
            appointment.scheduled_at
        );
        Ok(accepted)
    }

    /// Disarm every pending reminder for an appointment.
    ///
    /// Idempotent; returns how many reminders were removed. Once this
    /// returns, no previously-armed timer for the appointment will dispatch.
    pub fn cancel(&self, id: AppointmentId) -> usize {
        let removed = self.inner.registry.cancel_appointment(id);
        if removed > 0 {
            tracing::info!("Cancelled {removed} pending reminder(s) for appointment {id}");
        }
        removed
    }

    /// Replace an appointment's reminders wholesale: cancel, then schedule.
    ///
    /// Cancellation is fully applied — old timers disarmed — before any new
    /// timer for the same appointment is armed, so no timer from the old
    /// settings can fire under the new ones.
    pub fn reschedule(
        &self,
        appointment: &Appointment,
        settings: &ReminderSettings,
    ) -> Result<Vec<ReminderOffset>> {
        self.cancel(appointment.id);
        self.schedule(appointment, settings)
    }

    /// Materialize an appointment through the booking domain and schedule it.
    pub async fn schedule_from_source(
        &self,
        source: &dyn AppointmentSource,
        id: AppointmentId,
        settings: &ReminderSettings,
    ) -> Result<Vec<ReminderOffset>> {
        let appointment = self.lookup(source, id).await?;
        self.schedule(&appointment, settings)
    }

    /// Materialize an appointment through the booking domain and replace its
    /// reminders wholesale.
    pub async fn reschedule_from_source(
        &self,
        source: &dyn AppointmentSource,
        id: AppointmentId,
        settings: &ReminderSettings,
    ) -> Result<Vec<ReminderOffset>> {
        let appointment = self.lookup(source, id).await?;
        self.reschedule(&appointment, settings)
    }

    async fn lookup(
        &self,
        source: &dyn AppointmentSource,
        id: AppointmentId,
    ) -> Result<Appointment> {
        source
            .appointment(id)
            .await?
            .ok_or_else(|| BookNudgeError::Source(format!("unknown appointment {id}")))
    }

    /// Completed firings, oldest first.
    pub fn history(&self) -> Vec<FiringRecord> {
        self.inner
            .history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Number of pending reminders across all appointments.
    pub fn pending_count(&self) -> usize {
        self.inner.registry.pending_count()
    }

    /// Pending offsets for one appointment, in firing order.
    pub fn pending_offsets(&self, id: AppointmentId) -> Vec<ReminderOffset> {
        self.inner.registry.pending_offsets(id)
    }
}

impl Inner {
    /// One timer has elapsed: claim, dispatch, record.
    async fn fire(
        &self,
        key: ReminderKey,
        appointment: &Appointment,
        channels: &BTreeSet<ChannelKind>,
    ) {
        let (appointment_id, offset) = key;
        if !self.registry.claim(&key) {
            // Cancelled between arming and firing.
            tracing::debug!(
                "Reminder {offset} for appointment {appointment_id} was cancelled, skipping"
            );
            return;
        }

        tracing::info!("Firing {offset} reminder for appointment {appointment_id}");
        let outcomes = self.dispatcher.dispatch(appointment, offset, channels).await;
        let mut outcomes: Vec<_> = outcomes.into_values().collect();
        outcomes.sort_by_key(|o| o.channel);

        let status = ReminderStatus::from_outcomes(&outcomes);
        match status {
            ReminderStatus::Delivered => {
                tracing::info!(
                    "Reminder {offset} for appointment {appointment_id} delivered on all channels"
                );
            }
            ReminderStatus::PartiallyDelivered => {
                tracing::warn!(
                    "Reminder {offset} for appointment {appointment_id} partially delivered"
                );
            }
            _ => {
                tracing::warn!(
                    "Reminder {offset} for appointment {appointment_id} failed on all channels"
                );
            }
        }

        self.record(FiringRecord {
            appointment_id,
            offset,
            fired_at: Utc::now(),
            status,
            outcomes,
        });
    }

    fn record(&self, record: FiringRecord) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.push_back(record);
        while history.len() > self.history_limit {
            history.pop_front();
        }
    }
}

/// Suspend until the wall-clock fire time. Already-due times return at once.
async fn wait_until(fire_at: DateTime<Utc>) {
    if let Ok(delay) = (fire_at - Utc::now()).to_std() {
        tokio::time::sleep(delay).await;
    }
}
