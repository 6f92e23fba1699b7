//! Sliding-window "continuous activity" heuristic.
//!
//! Time is cut into intervals of `interval_ms`. The detector fires when input
//! arrived in at least `hit_threshold` of the last `window_size` intervals
//! while the app window was unfocused. Intervals are consumed in order, so two
//! counters replace a full history:
//!
//! - `hit_count`: intervals that saw input
//! - `window_count`: intervals elapsed, including empty ones
//!
//! Both start at 1 (the interval that set the first deadline).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::traits::WindowVisibility;

/// Detector tuning. Defaults: 4 s intervals, window of 10, threshold of 6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_window_size")]
    pub window_size: u32,
    #[serde(default = "default_hit_threshold")]
    pub hit_threshold: u32,
}

fn default_interval_ms() -> u64 {
    4000
}
fn default_window_size() -> u32 {
    10
}
fn default_hit_threshold() -> u32 {
    6
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            window_size: default_window_size(),
            hit_threshold: default_hit_threshold(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActivityDetector {
    config: ActivityConfig,
    deadline: Option<DateTime<Utc>>,
    hit_count: u32,
    window_count: u32,
}

impl ActivityDetector {
    pub fn new(config: ActivityConfig) -> Self {
        Self {
            config,
            deadline: None,
            hit_count: 1,
            window_count: 1,
        }
    }

    pub fn config(&self) -> &ActivityConfig {
        &self.config
    }

    pub fn hit_count(&self) -> u32 {
        self.hit_count
    }

    pub fn window_count(&self) -> u32 {
        self.window_count
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    fn interval(&self) -> Duration {
        i64::try_from(self.config.interval_ms.max(1))
            .ok()
            .and_then(Duration::try_milliseconds)
            .unwrap_or(Duration::MAX)
    }

    fn next_deadline(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.interval())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Return to baseline with a fresh deadline one interval from `now`.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.hit_count = 1;
        self.window_count = 1;
        self.deadline = Some(self.next_deadline(now));
    }

    /// Feed one raw input event, asking `window` for focus.
    pub fn observe_with(
        &mut self,
        now: DateTime<Utc>,
        window: &dyn WindowVisibility,
    ) -> Option<Event> {
        self.observe(now, window.is_focused())
    }

    /// Feed one raw input event. Returns the continuous-activity signal when
    /// the hit threshold is reached.
    pub fn observe(&mut self, now: DateTime<Utc>, focused: bool) -> Option<Event> {
        let Some(deadline) = self.deadline else {
            self.deadline = Some(self.next_deadline(now));
            return None;
        };

        // In-focus input never counts toward being away.
        if focused {
            self.reset(now);
            return None;
        }

        let delta = now - deadline;
        if delta < Duration::zero() {
            return None;
        }

        let interval_ms = self.interval().num_milliseconds().max(1);
        let elapsed = (delta.num_milliseconds() / interval_ms + 1).clamp(0, u32::MAX as i64) as u32;
        self.hit_count = self.hit_count.saturating_add(1);
        self.window_count = self.window_count.saturating_add(elapsed);
        self.deadline = Some(self.next_deadline(now));

        if self.hit_count >= self.config.hit_threshold {
            let event = Event::ContinuousActivity {
                hits: self.hit_count,
                windows: self.window_count,
                at: now,
            };
            tracing::debug!(
                hits = self.hit_count,
                windows = self.window_count,
                "continuous activity detected"
            );
            self.reset(now);
            return Some(event);
        }
        if self.window_count >= self.config.window_size {
            self.reset(now);
        }
        None
    }
}

impl Default for ActivityDetector {
    fn default() -> Self {
        Self::new(ActivityConfig::default())
    }
}
