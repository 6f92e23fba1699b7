//! Ordered reminder collection with persistence and the fire loop.
//!
//! The registry owns one [`ReminderScheduler`] per reminder, addressed by a
//! stable [`ReminderId`], and a single [`TimerQueue`] shared by all of them.
//! Every mutation writes the full list back to the store before returning.
//!
//! Store layout:
//! - `active_reminders`: JSON array of [`ReminderSnapshot`] in list order.
//! - `edit-reminder-index`: position of the reminder open for editing, `-1`
//!   for none.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use super::model::{Reminder, ReminderId, ReminderSnapshot};
use super::queue::TimerQueue;
use super::scheduler::{ReminderScheduler, TimerHandle};
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::traits::{NotificationSink, PersistenceStore, WindowVisibility};

pub const ACTIVE_REMINDERS_KEY: &str = "active_reminders";
pub const EDIT_INDEX_KEY: &str = "edit-reminder-index";

/// Dead queue entries tolerated per reminder before the queue is compacted.
const STALE_PER_REMINDER: usize = 4;

pub struct ReminderRegistry<S> {
    store: S,
    reminders: IndexMap<ReminderId, ReminderScheduler>,
    queue: TimerQueue,
    editing: Option<ReminderId>,
    events: Vec<Event>,
    /// What this registry last wrote, to notice writes from elsewhere.
    last_saved: Option<(String, String)>,
}

impl<S: PersistenceStore> ReminderRegistry<S> {
    /// An empty registry over `store`. Nothing is read until [`reload`].
    ///
    /// [`reload`]: ReminderRegistry::reload
    pub fn new(store: S) -> Self {
        Self {
            store,
            reminders: IndexMap::new(),
            queue: TimerQueue::new(),
            editing: None,
            events: Vec::new(),
            last_saved: None,
        }
    }

    /// Restore the stored list and arm every reminder except paused ones and
    /// the one open for editing.
    ///
    /// # Errors
    /// Returns an error only if the store itself fails. Missing or malformed
    /// data loads as an empty list.
    pub fn load(store: S, now: DateTime<Utc>) -> Result<Self> {
        let mut registry = Self::new(store);
        registry.reload(now)?;
        Ok(registry)
    }

    /// Drop in-memory state and restore from the store again.
    pub fn reload(&mut self, now: DateTime<Utc>) -> Result<()> {
        let snapshots = self.read_snapshots()?;
        let edit_index = self.read_edit_index()?;

        self.reminders.clear();
        self.queue.clear();
        self.editing = None;

        for (pos, snapshot) in snapshots.into_iter().enumerate() {
            match Reminder::try_from(snapshot) {
                Ok(reminder) => {
                    let id = ReminderId::new();
                    if edit_index == Some(pos) {
                        self.editing = Some(id);
                    }
                    self.reminders
                        .insert(id, ReminderScheduler::new(id, reminder));
                }
                Err(e) => tracing::warn!(position = pos, error = %e, "skipping invalid stored reminder"),
            }
        }

        let ids: Vec<ReminderId> = self.reminders.keys().copied().collect();
        for id in ids {
            if Some(id) == self.editing {
                continue;
            }
            self.apply(id, |s| s.rearm_restored(now));
        }

        tracing::info!(
            count = self.reminders.len(),
            editing = self.editing.is_some(),
            "reminders loaded"
        );
        self.save()
    }

    /// Write the full ordered list and the edit index to the store.
    pub fn save(&mut self) -> Result<()> {
        let snapshots: Vec<ReminderSnapshot> = self
            .reminders
            .values()
            .map(|s| ReminderSnapshot::from(s.reminder()))
            .collect();
        let list = serde_json::to_string(&snapshots)?;
        let edit_index = self
            .editing
            .and_then(|id| self.reminders.get_index_of(&id))
            .map(|pos| pos as i64)
            .unwrap_or(-1)
            .to_string();

        self.store.set(ACTIVE_REMINDERS_KEY, &list)?;
        self.store.set(EDIT_INDEX_KEY, &edit_index)?;
        tracing::debug!(count = snapshots.len(), edit_index = %edit_index, "reminders saved");
        self.last_saved = Some((list, edit_index));
        Ok(())
    }

    /// Whether the stored data differs from what this registry last wrote.
    pub fn store_changed(&self) -> Result<bool> {
        let list = self.store.get(ACTIVE_REMINDERS_KEY)?;
        let edit = self.store.get(EDIT_INDEX_KEY)?;
        Ok(match &self.last_saved {
            Some((saved_list, saved_edit)) => {
                list.as_deref() != Some(saved_list.as_str())
                    || edit.as_deref() != Some(saved_edit.as_str())
            }
            None => list.is_some(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get(&self, id: ReminderId) -> Option<&ReminderScheduler> {
        self.reminders.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReminderScheduler> {
        self.reminders.values()
    }

    pub fn id_at(&self, position: usize) -> Option<ReminderId> {
        self.reminders.get_index(position).map(|(id, _)| *id)
    }

    pub fn position(&self, id: ReminderId) -> Option<usize> {
        self.reminders.get_index_of(&id)
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    pub fn editing(&self) -> Option<ReminderId> {
        self.editing
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Take the events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Earliest live deadline across all reminders.
    pub fn next_due(&mut self) -> Option<DateTime<Utc>> {
        let reminders = &self.reminders;
        self.queue
            .peek_live(|e| {
                reminders
                    .get(&e.id)
                    .is_some_and(|s| s.is_current(e.generation))
            })
            .map(|e| e.due)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append a reminder and arm it.
    pub fn add(&mut self, reminder: Reminder, now: DateTime<Utc>) -> Result<ReminderId> {
        let id = ReminderId::new();
        self.reminders
            .insert(id, ReminderScheduler::new(id, reminder));
        self.apply(id, |s| s.start(now));
        tracing::info!(%id, "reminder added");
        self.changed(now)?;
        Ok(id)
    }

    /// Swap the reminder behind `id` for `reminder` and arm it afresh.
    pub fn replace(&mut self, id: ReminderId, reminder: Reminder, now: DateTime<Utc>) -> Result<()> {
        let scheduler = self.scheduler_mut(id)?;
        scheduler.replace_reminder(reminder);
        self.apply(id, |s| s.start(now));
        if self.editing == Some(id) {
            self.editing = None;
        }
        tracing::info!(%id, "reminder replaced");
        self.changed(now)
    }

    pub fn remove(&mut self, id: ReminderId, now: DateTime<Utc>) -> Result<Reminder> {
        let mut scheduler = self
            .reminders
            .shift_remove(&id)
            .ok_or(ValidationError::UnknownReminder(id))?;
        if let Some(event) = scheduler.cancel(now) {
            self.events.push(event);
        }
        if self.editing == Some(id) {
            self.editing = None;
        }
        tracing::info!(%id, "reminder removed");
        self.changed(now)?;
        Ok(scheduler.into_reminder())
    }

    pub fn set_paused(&mut self, id: ReminderId, paused: bool, now: DateTime<Utc>) -> Result<bool> {
        self.scheduler_mut(id)?;
        let applied = self.apply(id, |s| s.set_paused(paused, now));
        self.changed(now)?;
        Ok(applied)
    }

    /// The user responded to the notification of `id`.
    pub fn acknowledge(
        &mut self,
        id: ReminderId,
        now: DateTime<Utc>,
        window: &mut dyn WindowVisibility,
    ) -> Result<()> {
        self.scheduler_mut(id)?;
        self.apply(id, |s| s.acknowledge(now, window));
        self.changed(now)
    }

    pub fn acknowledge_ignored(&mut self, id: ReminderId, now: DateTime<Utc>) -> Result<()> {
        self.scheduler_mut(id)?;
        self.apply(id, |s| s.acknowledge_ignored(now));
        self.changed(now)
    }

    pub fn cancel(&mut self, id: ReminderId, now: DateTime<Utc>) -> Result<()> {
        self.scheduler_mut(id)?;
        self.apply(id, |s| s.cancel(now));
        self.changed(now)
    }

    /// Open `id` for editing. Its timer stops until the edit ends, and a
    /// reload will not re-arm it.
    pub fn begin_edit(&mut self, id: ReminderId, now: DateTime<Utc>) -> Result<()> {
        let scheduler = self.scheduler_mut(id)?;
        if scheduler.pending().is_some() {
            if let Some(event) = scheduler.cancel(now) {
                self.events.push(event);
            }
        }
        self.editing = Some(id);
        tracing::info!(%id, "editing reminder");
        self.save()
    }

    /// Replace the reminder being edited. Returns its id, or `None` when no
    /// edit was open.
    pub fn finish_edit(&mut self, reminder: Reminder, now: DateTime<Utc>) -> Result<Option<ReminderId>> {
        let Some(id) = self.editing else {
            return Ok(None);
        };
        self.replace(id, reminder, now)?;
        Ok(Some(id))
    }

    /// Close the editor without changes and re-arm the reminder where it was.
    pub fn abandon_edit(&mut self, now: DateTime<Utc>) -> Result<()> {
        if let Some(id) = self.editing.take() {
            self.apply(id, |s| s.rearm_restored(now));
            tracing::info!(%id, "edit abandoned");
        }
        self.save()
    }

    /// Fire every reminder due at `now`, each at most once.
    ///
    /// Returns the ids that fired. The list is saved once if anything fired.
    pub fn fire_due(
        &mut self,
        now: DateTime<Utc>,
        sink: &mut dyn NotificationSink,
    ) -> Result<Vec<ReminderId>> {
        let mut due = Vec::new();
        while let Some(entry) = self.queue.pop_due(now) {
            due.push(entry);
        }

        let mut fired = Vec::new();
        for entry in due {
            let is_live = self
                .reminders
                .get(&entry.id)
                .is_some_and(|s| s.is_current(entry.generation));
            if !is_live {
                continue;
            }
            if self.apply(entry.id, |s| s.fire(now, entry.generation, sink)) {
                fired.push(entry.id);
            }
        }

        if !fired.is_empty() {
            self.changed(now)?;
        }
        Ok(fired)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn scheduler_mut(&mut self, id: ReminderId) -> Result<&mut ReminderScheduler> {
        self.reminders
            .get_mut(&id)
            .ok_or_else(|| ValidationError::UnknownReminder(id).into())
    }

    /// Run a scheduler command, record its event and queue any new timer.
    /// Returns whether the command applied.
    fn apply(
        &mut self,
        id: ReminderId,
        command: impl FnOnce(&mut ReminderScheduler) -> Option<Event>,
    ) -> bool {
        let Some(scheduler) = self.reminders.get_mut(&id) else {
            return false;
        };
        let before: Option<TimerHandle> = scheduler.pending();
        let event = command(scheduler);
        let after = scheduler.pending();
        if let Some(handle) = after {
            if after != before {
                self.queue.push(id, handle);
                self.compact_queue();
            }
        }
        match event {
            Some(event) => {
                self.events.push(event);
                true
            }
            None => false,
        }
    }

    /// Pause/resume and ack cycles leave dead entries far from the head;
    /// sweep them once they outnumber the live ones.
    fn compact_queue(&mut self) {
        if self.queue.len() <= (self.reminders.len() + 1) * STALE_PER_REMINDER {
            return;
        }
        let reminders = &self.reminders;
        self.queue.retain(|e| {
            reminders
                .get(&e.id)
                .is_some_and(|s| s.is_current(e.generation))
        });
        tracing::debug!(entries = self.queue.len(), "timer queue compacted");
    }

    fn changed(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.save()?;
        self.events.push(Event::RemindersChanged {
            count: self.reminders.len(),
            at: now,
        });
        Ok(())
    }

    fn read_snapshots(&self) -> Result<Vec<ReminderSnapshot>> {
        let Some(raw) = self.store.get(ACTIVE_REMINDERS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(list) => Ok(list),
            Err(e) => {
                tracing::warn!(error = %e, "stored reminder list is malformed, starting empty");
                Ok(Vec::new())
            }
        }
    }

    fn read_edit_index(&self) -> Result<Option<usize>> {
        let raw = self.store.get(EDIT_INDEX_KEY)?;
        Ok(raw
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(|v| usize::try_from(v).ok()))
    }
}
