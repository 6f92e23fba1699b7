//! Seams to the host application.
//!
//! The core never renders, stores bytes or talks to the OS itself; the
//! desktop shell (or the CLI) implements these.

use crate::error::StoreError;
use crate::reminder::ReminderId;

/// Presents a notification to the user.
///
/// When the user responds, the host calls
/// [`ReminderRegistry::acknowledge`](crate::ReminderRegistry::acknowledge)
/// with the same `id`.
pub trait NotificationSink {
    fn deliver(&mut self, id: ReminderId, title: &str, message: &str);
}

/// The main app window.
pub trait WindowVisibility {
    fn is_focused(&self) -> bool;

    /// Bring the window forward.
    fn show(&mut self);
}

/// String key-value storage shared by every window of the app.
///
/// `set` must replace the previous value atomically: readers see either
/// the old or the new value, never a partial write.
pub trait PersistenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: PersistenceStore + ?Sized> PersistenceStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}
