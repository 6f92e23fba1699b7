//! Human-readable "time until" strings for the reminder list.
//!
//! Only the largest whole unit is shown: 90 minutes reads `1 hour.`,
//! 25 hours reads `1 day.`.

use chrono::{DateTime, Duration, Utc};

use crate::error::ValidationError;

/// Describe the span from `start` to `end`.
///
/// # Errors
/// Returns [`ValidationError::InvalidTimeRange`] if `end` precedes `start`.
pub fn humanize_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<String, ValidationError> {
    if end < start {
        return Err(ValidationError::InvalidTimeRange { start, end });
    }
    Ok(describe(end - start))
}

/// Describe a non-negative duration.
///
/// # Errors
/// Returns [`ValidationError::InvalidValue`] for negative durations.
pub fn humanize(d: Duration) -> Result<String, ValidationError> {
    if d < Duration::zero() {
        return Err(ValidationError::InvalidValue {
            field: "duration".into(),
            message: format!("must not be negative, got {}ms", d.num_milliseconds()),
        });
    }
    Ok(describe(d))
}

fn describe(d: Duration) -> String {
    let (n, unit) = if d.num_days() >= 1 {
        (d.num_days(), "day")
    } else if d.num_hours() >= 1 {
        (d.num_hours(), "hour")
    } else if d.num_minutes() >= 1 {
        (d.num_minutes(), "minute")
    } else {
        return "less than a minute.".to_string();
    };
    let plural = if n == 1 { "" } else { "s" };
    format!("{n} {unit}{plural}.")
}
