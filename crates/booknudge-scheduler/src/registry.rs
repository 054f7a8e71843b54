//! Pending-reminder registry — the only mutable shared state in the core.
//!
//! Keyed by (appointment id, offset); at most one pending reminder may exist
//! per key. Every mutation goes through a single lock, which makes `cancel`
//! linearizable with respect to timer firing: a timer that loses the race
//! claims nothing and never dispatches.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use booknudge_core::error::{BookNudgeError, Result};
use booknudge_core::types::{AppointmentId, ReminderOffset};

/// Identity of one scheduled reminder.
pub type ReminderKey = (AppointmentId, ReminderOffset);

/// A reminder that has been armed but not yet fired.
struct PendingReminder {
    fire_at: DateTime<Utc>,
    /// Handle of the armed timer task; aborted on cancel.
    handle: JoinHandle<()>,
}

/// Registry of pending reminders, owned by one scheduler instance.
#[derive(Default)]
pub struct ReminderRegistry {
    inner: Mutex<HashMap<ReminderKey, PendingReminder>>,
}

impl ReminderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ReminderKey, PendingReminder>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Atomically check-and-arm a batch of reminders.
    ///
    /// If any key already has a pending entry the whole call fails with
    /// `DuplicateReminder` and nothing is armed — callers must `cancel`
    /// before re-scheduling, silent overwrite would leak a live timer.
    /// The spawn closure runs under the registry lock so a concurrent
    /// `schedule` for the same key cannot interleave.
    pub fn arm<F>(&self, entries: &[(ReminderKey, DateTime<Utc>)], mut spawn: F) -> Result<()>
    where
        F: FnMut(ReminderKey, DateTime<Utc>) -> JoinHandle<()>,
    {
        let mut pending = self.lock();
        for ((appointment_id, offset), _) in entries {
            if pending.contains_key(&(*appointment_id, *offset)) {
                return Err(BookNudgeError::DuplicateReminder {
                    appointment_id: *appointment_id,
                    offset: *offset,
                });
            }
        }
        for (key, fire_at) in entries {
            let handle = spawn(*key, *fire_at);
            pending.insert(
                *key,
                PendingReminder {
                    fire_at: *fire_at,
                    handle,
                },
            );
        }
        Ok(())
    }

    /// Claim a reminder for firing, removing it from the pending set.
    ///
    /// Returns false if the reminder was cancelled; the firing must then
    /// abandon dispatch.
    pub fn claim(&self, key: &ReminderKey) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Disarm and remove every pending reminder for an appointment.
    /// Returns how many were removed; zero is a success (idempotent).
    pub fn cancel_appointment(&self, id: AppointmentId) -> usize {
        let mut pending = self.lock();
        let keys: Vec<ReminderKey> = pending
            .keys()
            .filter(|(appointment_id, _)| *appointment_id == id)
            .copied()
            .collect();
        for key in &keys {
            if let Some(entry) = pending.remove(key) {
                entry.handle.abort();
            }
        }
        keys.len()
    }

    /// Number of pending reminders across all appointments.
    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// Pending offsets for one appointment, ascending by fire time.
    pub fn pending_offsets(&self, id: AppointmentId) -> Vec<ReminderOffset> {
        let pending = self.lock();
        let mut entries: Vec<(ReminderOffset, DateTime<Utc>)> = pending
            .iter()
            .filter(|((appointment_id, _), _)| *appointment_id == id)
            .map(|((_, offset), entry)| (*offset, entry.fire_at))
            .collect();
        entries.sort_by_key(|(_, fire_at)| *fire_at);
        entries.into_iter().map(|(offset, _)| offset).collect()
    }

    /// Whether a key is still pending.
    pub fn contains(&self, key: &ReminderKey) -> bool {
        self.lock().contains_key(key)
    }
}
