//! Per-reminder timer state machine.
//!
//! The scheduler holds no OS timer. Arming produces a [`TimerHandle`] that the
//! registry pushes onto its queue; the registry later hands the handle's
//! generation back to [`ReminderScheduler::fire`]. Any re-arm, pause or cancel
//! bumps the generation first, so a stale handle can never fire.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Armed <-> Paused
//! Armed | Paused -> Idle   (cancel)
//! ```
//!
//! Commands that do not apply to the current state are no-ops and return
//! `None`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::model::{Reminder, ReminderId};
use crate::events::Event;
use crate::traits::{NotificationSink, WindowVisibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Armed,
    Paused,
}

/// A pending fire. Only valid while `generation` matches the scheduler's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub due: DateTime<Utc>,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct ReminderScheduler {
    id: ReminderId,
    reminder: Reminder,
    state: SchedulerState,
    generation: u64,
}

impl ReminderScheduler {
    /// Wrap a reminder. Paused reminders start `Paused`, all others `Idle`.
    pub fn new(id: ReminderId, reminder: Reminder) -> Self {
        let state = if reminder.is_paused() {
            SchedulerState::Paused
        } else {
            SchedulerState::Idle
        };
        Self {
            id,
            reminder,
            state,
            generation: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> ReminderId {
        self.id
    }

    pub fn reminder(&self) -> &Reminder {
        &self.reminder
    }

    pub fn into_reminder(self) -> Reminder {
        self.reminder
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// The live pending fire, if armed.
    pub fn pending(&self) -> Option<TimerHandle> {
        (self.state == SchedulerState::Armed).then_some(TimerHandle {
            due: self.reminder.next_fire_time,
            generation: self.generation,
        })
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.state == SchedulerState::Armed && self.generation == generation
    }

    /// Time left until the next fire. Paused reminders report what they had
    /// left when paused; idle ones report nothing.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self.state {
            SchedulerState::Armed => Some((self.reminder.next_fire_time - now).max(Duration::zero())),
            SchedulerState::Paused => self
                .reminder
                .paused_at
                .map(|at| (self.reminder.next_fire_time - at).max(Duration::zero())),
            SchedulerState::Idle => None,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// First arm after creation: waits `start_override`, else the interval.
    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != SchedulerState::Idle {
            return None;
        }
        let delay = self.reminder.start_override.unwrap_or(self.reminder.interval);
        let handle = self.arm(now, delay);
        Some(Event::ReminderArmed {
            id: self.id,
            due: handle.due,
            at: now,
        })
    }

    /// Re-arm a reminder restored from storage at its stored deadline.
    /// Deadlines already in the past fire on the next poll, exactly once.
    pub fn rearm_restored(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != SchedulerState::Idle {
            return None;
        }
        let delay = (self.reminder.next_fire_time - now).max(Duration::zero());
        let handle = self.arm(now, delay);
        Some(Event::ReminderArmed {
            id: self.id,
            due: handle.due,
            at: now,
        })
    }

    /// Deliver the notification for the handle with `generation` and re-arm.
    pub fn fire(
        &mut self,
        now: DateTime<Utc>,
        generation: u64,
        sink: &mut dyn NotificationSink,
    ) -> Option<Event> {
        if !self.is_current(generation) {
            return None;
        }
        sink.deliver(self.id, &self.reminder.title, &self.reminder.message);

        let delay = self.reminder.escalation.next_delay(self.reminder.interval);
        let handle = self.arm(now, delay);
        tracing::debug!(
            id = %self.id,
            ignore_count = self.reminder.escalation.ignore_count(),
            delay_ms = delay.num_milliseconds(),
            "reminder fired"
        );
        Some(Event::ReminderFired {
            id: self.id,
            ignore_count: self.reminder.escalation.ignore_count(),
            next_due: handle.due,
            at: now,
        })
    }

    /// The user responded to a delivered notification.
    ///
    /// An ignored reminder drops its penalty timer and re-arms at the normal
    /// interval. The window is brought forward either way.
    pub fn acknowledge(
        &mut self,
        now: DateTime<Utc>,
        window: &mut dyn WindowVisibility,
    ) -> Option<Event> {
        let was_ignored = self.reminder.escalation.is_ignored();
        if was_ignored {
            self.acknowledge_ignored(now);
        }
        window.show();
        Some(Event::ReminderAcknowledged {
            id: self.id,
            was_ignored,
            at: now,
        })
    }

    /// Clear the ignored flag and re-arm at the normal interval.
    ///
    /// A paused reminder stays paused; its remaining time becomes one full
    /// interval.
    pub fn acknowledge_ignored(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.reminder.escalation.clear_ignored();
        match self.state {
            SchedulerState::Paused => {
                let at = self.reminder.paused_at.unwrap_or(now);
                self.reminder.next_fire_time = at
                    .checked_add_signed(self.reminder.interval)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                None
            }
            SchedulerState::Idle | SchedulerState::Armed => {
                let handle = self.arm(now, self.reminder.interval);
                Some(Event::ReminderArmed {
                    id: self.id,
                    due: handle.due,
                    at: now,
                })
            }
        }
    }

    pub fn set_paused(&mut self, paused: bool, now: DateTime<Utc>) -> Option<Event> {
        match (paused, self.state) {
            (true, SchedulerState::Armed) => {
                self.invalidate();
                self.state = SchedulerState::Paused;
                self.reminder.paused_at = Some(now);
                Some(Event::ReminderPaused {
                    id: self.id,
                    remaining_ms: (self.reminder.next_fire_time - now).num_milliseconds(),
                    at: now,
                })
            }
            (false, SchedulerState::Paused) => {
                let paused_at = self.reminder.paused_at.take().unwrap_or(now);
                // Overdue at pause time: fire on the next poll.
                let delay = (self.reminder.next_fire_time - paused_at).max(Duration::zero());
                self.arm(now, delay);
                Some(Event::ReminderResumed {
                    id: self.id,
                    delay_ms: delay.num_milliseconds(),
                    at: now,
                })
            }
            _ => None,
        }
    }

    /// Drop any pending fire and go idle. Cancelling an idle scheduler is a
    /// no-op.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state == SchedulerState::Idle {
            return None;
        }
        self.invalidate();
        self.state = SchedulerState::Idle;
        self.reminder.paused_at = None;
        Some(Event::ReminderCancelled { id: self.id, at: now })
    }

    /// Swap in a new reminder, dropping any pending fire. The generation
    /// keeps counting so handles for the old reminder stay dead.
    pub fn replace_reminder(&mut self, reminder: Reminder) {
        self.invalidate();
        self.state = if reminder.is_paused() {
            SchedulerState::Paused
        } else {
            SchedulerState::Idle
        };
        self.reminder = reminder;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn arm(&mut self, now: DateTime<Utc>, delay: Duration) -> TimerHandle {
        self.invalidate();
        self.state = SchedulerState::Armed;
        // Deadlines past the end of the calendar clamp to it.
        self.reminder.next_fire_time = now
            .checked_add_signed(delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        TimerHandle {
            due: self.reminder.next_fire_time,
            generation: self.generation,
        }
    }
}
