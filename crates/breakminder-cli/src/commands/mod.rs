pub mod config;
pub mod edit;
pub mod reminder;
pub mod watch;

use breakminder_core::{ReminderId, ReminderRegistry, SqliteStore};
use chrono::{DateTime, Duration, Utc};

/// Open the shared store and restore the reminder list.
pub fn open_registry(now: DateTime<Utc>) -> Result<ReminderRegistry<SqliteStore>, Box<dyn std::error::Error>> {
    let store = SqliteStore::open()?;
    Ok(ReminderRegistry::load(store, now)?)
}

/// Resolve a list position as printed by `reminder list`.
pub fn id_at(
    registry: &ReminderRegistry<SqliteStore>,
    index: usize,
) -> Result<ReminderId, Box<dyn std::error::Error>> {
    registry
        .id_at(index)
        .ok_or_else(|| format!("no reminder at index {index} ({} total)", registry.len()).into())
}

/// Parse spans like `90s`, `30m`, `2h`. A bare number is minutes.
pub fn parse_span(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let n: i64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{s}', expected e.g. 90s, 30m or 2h"))?;
    let span = match unit {
        "s" => Duration::try_seconds(n),
        "" | "m" => Duration::try_minutes(n),
        "h" => Duration::try_hours(n),
        other => return Err(format!("unknown duration unit '{other}', use s, m or h")),
    };
    span.ok_or_else(|| format!("duration '{s}' is out of range"))
}
