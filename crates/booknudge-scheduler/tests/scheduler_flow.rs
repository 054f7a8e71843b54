//! End-to-end scheduler flows under a paused tokio clock.
//!
//! Recording fake senders stand in for the channel transports; time is
//! driven by sleeping on the paused test clock, which auto-advances
//! through armed reminder timers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};

use booknudge_core::config::DispatchConfig;
use booknudge_core::error::{BookNudgeError, Result};
use booknudge_core::traits::ChannelSender;
use booknudge_core::types::{
    Appointment, AppointmentId, ChannelKind, Recipient, ReminderMessage, ReminderOffset,
    ReminderSettings, ReminderStatus,
};
use booknudge_scheduler::{NotificationDispatcher, ReminderScheduler};

type CallLog = Arc<Mutex<Vec<(ChannelKind, String)>>>;

struct RecordingSender {
    kind: ChannelKind,
    fail: bool,
    calls: CallLog,
}

#[async_trait]
impl ChannelSender for RecordingSender {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, _recipient: &Recipient, message: &ReminderMessage) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((self.kind, message.body.clone()));
        if self.fail {
            Err(BookNudgeError::Channel("push token expired".into()))
        } else {
            Ok(())
        }
    }
}

struct Harness {
    scheduler: ReminderScheduler,
    calls: CallLog,
}

fn harness(failing: &[ChannelKind]) -> Harness {
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
    let senders: Vec<Arc<dyn ChannelSender>> =
        [ChannelKind::Email, ChannelKind::Sms, ChannelKind::Push]
            .into_iter()
            .map(|kind| {
                Arc::new(RecordingSender {
                    kind,
                    fail: failing.contains(&kind),
                    calls: Arc::clone(&calls),
                }) as Arc<dyn ChannelSender>
            })
            .collect();
    let dispatcher = NotificationDispatcher::new(senders, &DispatchConfig::default());
    Harness {
        scheduler: ReminderScheduler::new(dispatcher, 100),
        calls,
    }
}

fn appointment_in_hours(hours: i64) -> Appointment {
    Appointment {
        id: AppointmentId::new(),
        scheduled_at: Utc::now() + ChronoDuration::hours(hours),
        service_name: "Haircut & Style".into(),
        professional_name: "Dana Wu".into(),
        recipient: Recipient {
            email: Some("client@example.com".into()),
            phone: Some("+15557654321".into()),
            push_token: Some("device-token".into()),
        },
    }
}

fn settings(
    channels: &[ChannelKind],
    offsets: &[ReminderOffset],
) -> ReminderSettings {
    ReminderSettings::new(channels.iter().copied(), offsets.iter().copied()).unwrap()
}

async fn run_clock_hours(hours: u64) {
    tokio::time::sleep(Duration::from_secs(hours * 3600)).await;
}

#[tokio::test(start_paused = true)]
async fn partial_failure_yields_partially_delivered() {
    // Appointment at T+48h, offsets {24h, 2h, 30m}, channels {email, push};
    // push fails on every firing.
    let h = harness(&[ChannelKind::Push]);
    let appointment = appointment_in_hours(48);
    let prefs = settings(
        &[ChannelKind::Email, ChannelKind::Push],
        &[
            ReminderOffset::hours(24),
            ReminderOffset::hours(2),
            ReminderOffset::minutes(30),
        ],
    );

    let accepted = h.scheduler.schedule(&appointment, &prefs).unwrap();
    assert_eq!(accepted.len(), 3);
    assert_eq!(h.scheduler.pending_count(), 3);

    // Past the first fire time (T+24h) only.
    run_clock_hours(25).await;
    let history = h.scheduler.history();
    assert_eq!(history.len(), 1);
    let first = &history[0];
    assert_eq!(first.offset, ReminderOffset::hours(24));
    assert_eq!(first.status, ReminderStatus::PartiallyDelivered);
    assert_eq!(first.outcomes.len(), 2);
    let email = first
        .outcomes
        .iter()
        .find(|o| o.channel == ChannelKind::Email)
        .unwrap();
    assert!(email.success);
    let push = first
        .outcomes
        .iter()
        .find(|o| o.channel == ChannelKind::Push)
        .unwrap();
    assert!(!push.success);
    assert_eq!(h.scheduler.pending_count(), 2);

    // Through the remaining firings; non-decreasing fire-time order.
    run_clock_hours(24).await;
    let history = h.scheduler.history();
    let fired: Vec<ReminderOffset> = history.iter().map(|r| r.offset).collect();
    assert_eq!(
        fired,
        vec![
            ReminderOffset::hours(24),
            ReminderOffset::hours(2),
            ReminderOffset::minutes(30)
        ]
    );
    assert_eq!(h.scheduler.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn message_rendered_per_offset() {
    let h = harness(&[]);
    let appointment = appointment_in_hours(48);
    let prefs = settings(&[ChannelKind::Email], &[ReminderOffset::hours(24)]);
    h.scheduler.schedule(&appointment, &prefs).unwrap();

    run_clock_hours(25).await;
    let calls = h.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (channel, body) = &calls[0];
    assert_eq!(*channel, ChannelKind::Email);
    assert!(body.contains("in 24 hours"));
    assert!(body.contains("Dana Wu"));
}

#[tokio::test(start_paused = true)]
async fn reschedule_after_first_firing_leaves_it_untouched() {
    // Settings edited at T+30h, after the 24h reminder already fired:
    // the remaining entries are re-armed with email only.
    let h = harness(&[]);
    let appointment = appointment_in_hours(48);
    let original = settings(
        &[ChannelKind::Email, ChannelKind::Push],
        &[
            ReminderOffset::hours(24),
            ReminderOffset::hours(2),
            ReminderOffset::minutes(30),
        ],
    );
    h.scheduler.schedule(&appointment, &original).unwrap();

    run_clock_hours(30).await;
    assert_eq!(h.scheduler.history().len(), 1);
    assert_eq!(h.scheduler.pending_count(), 2);

    let edited = settings(
        &[ChannelKind::Email],
        &[ReminderOffset::hours(2), ReminderOffset::minutes(30)],
    );
    let accepted = h.scheduler.reschedule(&appointment, &edited).unwrap();
    assert_eq!(accepted.len(), 2);

    // Re-armed timers wait out their full wall-clock lead again.
    run_clock_hours(48).await;
    let history = h.scheduler.history();
    assert_eq!(history.len(), 3);
    // First firing keeps both channels; re-armed ones are email only.
    assert_eq!(history[0].outcomes.len(), 2);
    assert_eq!(history[1].outcomes.len(), 1);
    assert_eq!(history[1].outcomes[0].channel, ChannelKind::Email);
    assert_eq!(history[2].outcomes.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn no_dispatch_after_cancel_even_when_due() {
    let h = harness(&[]);
    let appointment = appointment_in_hours(2);
    // Fires one minute from now.
    let prefs = settings(
        &[ChannelKind::Email],
        &[ReminderOffset::minutes(119)],
    );
    h.scheduler.schedule(&appointment, &prefs).unwrap();
    assert_eq!(h.scheduler.cancel(appointment.id), 1);

    // Run well past the fire time: nothing fires, nothing is recorded.
    run_clock_hours(3).await;
    assert!(h.scheduler.history().is_empty());
    assert!(h.calls.lock().unwrap().is_empty());
    assert_eq!(h.scheduler.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn reschedule_is_idempotent_in_effect() {
    let h = harness(&[]);
    let appointment = appointment_in_hours(48);
    let prefs = settings(
        &[ChannelKind::Email],
        &[ReminderOffset::hours(24), ReminderOffset::hours(2)],
    );

    let first = h.scheduler.reschedule(&appointment, &prefs).unwrap();
    let second = h.scheduler.reschedule(&appointment, &prefs).unwrap();
    assert_eq!(first, second);
    assert_eq!(h.scheduler.pending_count(), 2);

    // The pending set never holds two reminders for one key: each offset
    // fires exactly once.
    run_clock_hours(50).await;
    assert_eq!(h.scheduler.history().len(), 2);
    assert_eq!(h.calls.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn duplicate_schedule_fails_and_arms_nothing() {
    let h = harness(&[]);
    let appointment = appointment_in_hours(48);
    let prefs = settings(
        &[ChannelKind::Email],
        &[ReminderOffset::hours(24), ReminderOffset::hours(2)],
    );
    h.scheduler.schedule(&appointment, &prefs).unwrap();

    let err = h.scheduler.schedule(&appointment, &prefs).unwrap_err();
    assert!(matches!(err, BookNudgeError::DuplicateReminder { .. }));
    assert_eq!(h.scheduler.pending_count(), 2);

    run_clock_hours(50).await;
    // Each offset fired exactly once despite the rejected second call.
    assert_eq!(h.scheduler.history().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn appointment_created_too_late_gets_no_reminder() {
    let h = harness(&[]);
    // Appointment in 10 minutes with only a 24h offset: nothing to arm.
    let appointment = Appointment {
        scheduled_at: Utc::now() + ChronoDuration::minutes(10),
        ..appointment_in_hours(0)
    };
    let prefs = settings(&[ChannelKind::Email], &[ReminderOffset::hours(24)]);
    let accepted = h.scheduler.schedule(&appointment, &prefs).unwrap();
    assert!(accepted.is_empty());

    run_clock_hours(1).await;
    assert!(h.scheduler.history().is_empty());
    assert!(h.calls.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn independent_appointments_do_not_interfere() {
    let h = harness(&[]);
    let first = appointment_in_hours(3);
    let second = appointment_in_hours(3);
    let prefs = settings(&[ChannelKind::Email], &[ReminderOffset::hours(1)]);

    h.scheduler.schedule(&first, &prefs).unwrap();
    h.scheduler.schedule(&second, &prefs).unwrap();
    assert_eq!(h.scheduler.pending_count(), 2);

    // Cancelling one appointment leaves the other armed and firing.
    h.scheduler.cancel(first.id);
    run_clock_hours(4).await;

    let history = h.scheduler.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].appointment_id, second.id);
}
