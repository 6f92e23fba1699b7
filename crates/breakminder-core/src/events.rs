use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reminder::ReminderId;

/// Every state change in the system produces an Event.
/// Hosts drain them from the registry after each call; the activity
/// detector returns its signal directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ReminderArmed {
        id: ReminderId,
        due: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// A notification was delivered and the reminder re-armed.
    ReminderFired {
        id: ReminderId,
        ignore_count: u32,
        next_due: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    ReminderPaused {
        id: ReminderId,
        remaining_ms: i64,
        at: DateTime<Utc>,
    },
    ReminderResumed {
        id: ReminderId,
        delay_ms: i64,
        at: DateTime<Utc>,
    },
    ReminderAcknowledged {
        id: ReminderId,
        was_ignored: bool,
        at: DateTime<Utc>,
    },
    ReminderCancelled {
        id: ReminderId,
        at: DateTime<Utc>,
    },
    /// The reminder list was persisted after a change.
    RemindersChanged {
        count: usize,
        at: DateTime<Utc>,
    },
    /// Sustained input while the app window lacked focus.
    ContinuousActivity {
        hits: u32,
        windows: u32,
        at: DateTime<Utc>,
    },
}
