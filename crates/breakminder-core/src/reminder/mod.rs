mod model;
mod queue;
mod registry;
mod scheduler;

pub use model::{Escalation, Reminder, ReminderId, ReminderSnapshot};
pub use queue::{QueueEntry, TimerQueue};
pub use registry::{ReminderRegistry, ACTIVE_REMINDERS_KEY, EDIT_INDEX_KEY};
pub use scheduler::{ReminderScheduler, SchedulerState, TimerHandle};
