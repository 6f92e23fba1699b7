//! Reminder records and their persisted snapshot form.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Upper bound for every reminder span (interval, first delay, penalty).
pub const MAX_INTERVAL_DAYS: i64 = 365;

pub fn max_interval() -> Duration {
    Duration::days(MAX_INTERVAL_DAYS)
}

fn check_span(field: &str, span: Duration) -> Result<(), ValidationError> {
    if span > max_interval() {
        return Err(ValidationError::InvalidValue {
            field: field.into(),
            message: format!("must be at most {MAX_INTERVAL_DAYS} days"),
        });
    }
    Ok(())
}

/// Stable identifier of a reminder inside a registry.
///
/// Ids are assigned when a reminder enters the registry and are not
/// persisted; the stored list is addressed by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(Uuid);

impl ReminderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReminderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How a reminder reacts to notifications that go unanswered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Escalation {
    /// Every fire re-arms at the normal interval.
    Normal,
    /// After a fire the reminder re-arms at the shorter `interval` until the
    /// user acknowledges it, or until `count` reaches `max`.
    Penalty {
        interval: Duration,
        /// `None` never resets the penalty on its own.
        max: Option<u32>,
        count: u32,
        ignored: bool,
    },
}

impl Escalation {
    /// Build a penalty policy. A zero `max` disables the automatic reset.
    pub fn penalty(interval: Duration, max: u32) -> Self {
        if interval <= Duration::zero() {
            return Escalation::Normal;
        }
        Escalation::Penalty {
            interval,
            max: (max > 0).then_some(max),
            count: 0,
            ignored: false,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Escalation::Penalty { ignored: true, .. })
    }

    pub fn ignore_count(&self) -> u32 {
        match self {
            Escalation::Normal => 0,
            Escalation::Penalty { count, .. } => *count,
        }
    }

    pub(crate) fn clear_ignored(&mut self) {
        if let Escalation::Penalty { ignored, .. } = self {
            *ignored = false;
        }
    }

    /// Advance the escalation state after a fire and return the delay until
    /// the next one.
    pub(crate) fn next_delay(&mut self, normal: Duration) -> Duration {
        match self {
            Escalation::Normal => normal,
            Escalation::Penalty {
                interval,
                max,
                count,
                ignored,
            } => {
                if let Some(max) = *max {
                    if *count >= max {
                        *ignored = false;
                        *count = 0;
                        return normal;
                    }
                }
                *ignored = true;
                *count += 1;
                *interval
            }
        }
    }
}

/// A single break reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub title: String,
    pub message: String,
    /// When the next notification is due.
    pub next_fire_time: DateTime<Utc>,
    /// Normal repeat interval.
    pub interval: Duration,
    /// Delay used only for the very first arm.
    pub start_override: Option<Duration>,
    pub escalation: Escalation,
    /// Set only while the reminder is paused.
    pub paused_at: Option<DateTime<Utc>>,
}

impl Reminder {
    /// Create a reminder repeating every `interval`.
    ///
    /// # Errors
    /// Returns an error if `interval` is not positive or longer than
    /// [`MAX_INTERVAL_DAYS`].
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        interval: Duration,
    ) -> Result<Self, ValidationError> {
        if interval <= Duration::zero() {
            return Err(ValidationError::InvalidValue {
                field: "interval".into(),
                message: "must be greater than zero".into(),
            });
        }
        check_span("interval", interval)?;
        Ok(Self {
            title: title.into(),
            message: message.into(),
            next_fire_time: DateTime::<Utc>::UNIX_EPOCH,
            interval,
            start_override: None,
            escalation: Escalation::Normal,
            paused_at: None,
        })
    }

    pub fn with_start_override(mut self, delay: Duration) -> Self {
        self.start_override = (delay > Duration::zero()).then_some(delay);
        self
    }

    pub fn with_penalty(mut self, interval: Duration, max: u32) -> Self {
        self.escalation = Escalation::penalty(interval, max);
        self
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Check the spans the builders accept without validation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_span("interval", self.interval)?;
        if let Some(delay) = self.start_override {
            check_span("start_override", delay)?;
        }
        if let Escalation::Penalty { interval, .. } = &self.escalation {
            check_span("ignore_interval", *interval)?;
        }
        Ok(())
    }
}

/// Persisted shape of a reminder, one element of the `active_reminders`
/// JSON array. Durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSnapshot {
    pub next_reminder: DateTime<Utc>,
    pub reminder_interval_amount: u64,
    #[serde(default)]
    pub reminder_start_override_amount: u64,
    #[serde(default)]
    pub ignored_reminder_interval_amount: u64,
    #[serde(default)]
    pub max_ignored_reminders: u32,
    #[serde(default)]
    pub ignored_reminders: u32,
    #[serde(default)]
    pub is_ignored: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub paused_time: Option<DateTime<Utc>>,
}

fn millis(d: Duration) -> u64 {
    d.num_milliseconds().max(0) as u64
}

fn from_millis(ms: u64) -> Duration {
    i64::try_from(ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .unwrap_or(Duration::MAX)
}

impl From<&Reminder> for ReminderSnapshot {
    fn from(r: &Reminder) -> Self {
        let (ignore_ms, max, count, ignored) = match &r.escalation {
            Escalation::Normal => (0, 0, 0, false),
            Escalation::Penalty {
                interval,
                max,
                count,
                ignored,
            } => (millis(*interval), max.unwrap_or(0), *count, *ignored),
        };
        Self {
            next_reminder: r.next_fire_time,
            reminder_interval_amount: millis(r.interval),
            reminder_start_override_amount: r.start_override.map(millis).unwrap_or(0),
            ignored_reminder_interval_amount: ignore_ms,
            max_ignored_reminders: max,
            ignored_reminders: count,
            is_ignored: ignored,
            message: r.message.clone(),
            title: r.title.clone(),
            paused: r.paused_at.is_some(),
            paused_time: r.paused_at,
        }
    }
}

impl TryFrom<ReminderSnapshot> for Reminder {
    type Error = ValidationError;

    fn try_from(s: ReminderSnapshot) -> Result<Self, Self::Error> {
        let mut reminder = Reminder::new(s.title, s.message, from_millis(s.reminder_interval_amount))?
            .with_start_override(from_millis(s.reminder_start_override_amount));
        reminder.next_fire_time = s.next_reminder;
        reminder.escalation = match Escalation::penalty(
            from_millis(s.ignored_reminder_interval_amount),
            s.max_ignored_reminders,
        ) {
            Escalation::Penalty { interval, max, .. } => Escalation::Penalty {
                interval,
                max,
                count: s.ignored_reminders,
                ignored: s.is_ignored,
            },
            Escalation::Normal => Escalation::Normal,
        };
        // A paused entry without a pause time has nothing left to wait for.
        reminder.paused_at = s.paused.then(|| s.paused_time.unwrap_or(s.next_reminder));
        reminder.validate()?;
        Ok(reminder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(m: i64) -> Duration {
        Duration::minutes(m)
    }

    #[test]
    fn penalty_sequence_resets_at_max() {
        let mut esc = Escalation::penalty(minutes(5), 3);
        let delays: Vec<_> = (0..4).map(|_| esc.next_delay(minutes(30))).collect();
        assert_eq!(delays, vec![minutes(5), minutes(5), minutes(5), minutes(30)]);
        assert_eq!(esc.ignore_count(), 0);
        assert!(!esc.is_ignored());
    }

    #[test]
    fn penalty_without_max_keeps_counting() {
        let mut esc = Escalation::penalty(minutes(5), 0);
        for _ in 0..10 {
            assert_eq!(esc.next_delay(minutes(30)), minutes(5));
        }
        assert_eq!(esc.ignore_count(), 10);
        assert!(esc.is_ignored());
    }

    #[test]
    fn zero_penalty_interval_is_normal() {
        assert_eq!(Escalation::penalty(Duration::zero(), 3), Escalation::Normal);
    }

    #[test]
    fn reminder_rejects_zero_interval() {
        assert!(Reminder::new("t", "m", Duration::zero()).is_err());
    }

    #[test]
    fn reminder_rejects_interval_beyond_a_year() {
        assert!(Reminder::new("t", "m", max_interval()).is_ok());
        let err = Reminder::new("t", "m", max_interval() + Duration::seconds(1)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "interval"));
    }

    #[test]
    fn validate_checks_builder_spans() {
        let long = Duration::days(MAX_INTERVAL_DAYS * 2);
        let reminder = Reminder::new("t", "m", minutes(30)).unwrap();
        assert!(reminder.clone().with_start_override(long).validate().is_err());
        assert!(reminder.clone().with_penalty(long, 3).validate().is_err());
        assert!(reminder.with_penalty(minutes(5), 3).validate().is_ok());
    }

    #[test]
    fn snapshot_with_oversized_spans_is_rejected() {
        let json = r#"{
            "nextReminder": "2024-05-01T09:00:00Z",
            "reminderIntervalAmount": 9000000000000000000,
            "title": "Huge"
        }"#;
        let snap: ReminderSnapshot = serde_json::from_str(json).unwrap();
        assert!(Reminder::try_from(snap).is_err());

        let json = r#"{
            "nextReminder": "2024-05-01T09:00:00Z",
            "reminderIntervalAmount": 60000,
            "reminderStartOverrideAmount": 18446744073709551615
        }"#;
        let snap: ReminderSnapshot = serde_json::from_str(json).unwrap();
        assert!(Reminder::try_from(snap).is_err());
    }

    #[test]
    fn snapshot_uses_camel_case_keys() {
        let reminder = Reminder::new("Stretch", "Stand up", minutes(30))
            .unwrap()
            .with_penalty(minutes(5), 3);
        let json = serde_json::to_value(ReminderSnapshot::from(&reminder)).unwrap();
        assert_eq!(json["reminderIntervalAmount"], 1_800_000);
        assert_eq!(json["ignoredReminderIntervalAmount"], 300_000);
        assert_eq!(json["maxIgnoredReminders"], 3);
        assert_eq!(json["isIgnored"], false);
        assert_eq!(json["paused"], false);
        assert!(json["pausedTime"].is_null());
    }

    #[test]
    fn snapshot_from_browser_json() {
        let json = r#"{
            "nextReminder": "2024-03-01T10:30:00.000Z",
            "reminderIntervalAmount": 1800000,
            "reminderStartOverrideAmount": 0,
            "ignoredReminderIntervalAmount": 300000,
            "maxIgnoredReminders": 3,
            "ignoredReminders": 2,
            "isIgnored": true,
            "message": "Look away from the screen",
            "title": "Eyes",
            "paused": false,
            "pausedTime": null
        }"#;
        let snap: ReminderSnapshot = serde_json::from_str(json).unwrap();
        let reminder = Reminder::try_from(snap).unwrap();
        assert_eq!(reminder.start_override, None);
        assert_eq!(reminder.escalation.ignore_count(), 2);
        assert!(reminder.escalation.is_ignored());
        assert!(!reminder.is_paused());
    }

    #[test]
    fn paused_snapshot_without_time_uses_next_reminder() {
        let next = DateTime::parse_from_rfc3339("2024-03-01T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let snap = ReminderSnapshot {
            next_reminder: next,
            reminder_interval_amount: 60_000,
            reminder_start_override_amount: 0,
            ignored_reminder_interval_amount: 0,
            max_ignored_reminders: 0,
            ignored_reminders: 0,
            is_ignored: false,
            message: String::new(),
            title: String::new(),
            paused: true,
            paused_time: None,
        };
        let reminder = Reminder::try_from(snap).unwrap();
        assert_eq!(reminder.paused_at, Some(next));
    }
}
