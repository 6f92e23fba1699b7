mod config;
pub mod database;
mod memory;

pub use config::{Config, NotificationsConfig, ReminderDefaults, ActivitySettings};
pub use database::SqliteStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/breakminder[-dev]/` based on BREAKMINDER_ENV.
///
/// Set BREAKMINDER_ENV=dev to use the development data directory, or
/// BREAKMINDER_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("BREAKMINDER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("BREAKMINDER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("breakminder-dev")
            } else {
                base_dir.join("breakminder")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
