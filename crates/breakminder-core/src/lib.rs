//! # breakminder Core Library
//!
//! Scheduling and decision logic for a desktop break-reminder tool. The
//! desktop shell and the CLI are thin hosts over the same core: they provide
//! notification delivery, window control, storage and raw input through the
//! traits in [`traits`], and drive time forward by calling into the registry.
//!
//! ## Architecture
//!
//! - **Reminders**: one state machine per reminder (`Idle -> Armed <-> Paused`)
//!   with ignore-penalty escalation, owned by a registry that persists the
//!   ordered list after every change and fires due reminders from a single
//!   min-priority queue
//! - **Activity**: a sliding-window heuristic over raw input that signals
//!   sustained work outside the app window
//! - **Storage**: SQLite key-value store and TOML configuration
//!
//! All operations take `now` explicitly; nothing here reads the clock.
//!
//! ## Key Components
//!
//! - [`ReminderRegistry`]: reminder collection, persistence and fire loop
//! - [`ReminderScheduler`]: per-reminder state machine
//! - [`ActivityDetector`]: continuous-activity heuristic
//! - [`Config`]: application configuration management

pub mod activity;
pub mod error;
pub mod events;
pub mod humanize;
pub mod reminder;
pub mod storage;
pub mod traits;

pub use activity::{
    ActivityConfig, ActivityDetector, ActivityMonitor, InputKind, RawInputEvent, RawInputStream,
};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use humanize::{humanize, humanize_between};
pub use reminder::{
    Escalation, Reminder, ReminderId, ReminderRegistry, ReminderScheduler, ReminderSnapshot,
    SchedulerState, TimerHandle,
};
pub use storage::{Config, MemoryStore, SqliteStore};
pub use traits::{NotificationSink, PersistenceStore, WindowVisibility};
