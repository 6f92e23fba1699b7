//! Integration tests for continuous-activity detection.

use std::cell::Cell;

use breakminder_core::{ActivityConfig, ActivityDetector, Event, WindowVisibility};
use chrono::{DateTime, Duration, Utc};

/// Window whose focus the test flips between events.
struct ToggleWindow {
    focused: Cell<bool>,
}

impl WindowVisibility for ToggleWindow {
    fn is_focused(&self) -> bool {
        self.focused.get()
    }

    fn show(&mut self) {
        self.focused.set(true);
    }
}

fn base() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T14:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn test_signal_after_six_spaced_events_while_unfocused() {
    let window = ToggleWindow {
        focused: Cell::new(false),
    };
    let mut detector = ActivityDetector::default();

    let mut emitted_at = None;
    for i in 0..6 {
        let now = base() + Duration::milliseconds(i * 4500);
        if let Some(Event::ContinuousActivity { .. }) = detector.observe_with(now, &window) {
            emitted_at = Some(i);
        }
    }
    assert_eq!(emitted_at, Some(5));
}

#[test]
fn test_focus_before_threshold_prevents_signal() {
    let window = ToggleWindow {
        focused: Cell::new(false),
    };
    let mut detector = ActivityDetector::default();

    for i in 0..6 {
        if i == 3 {
            window.focused.set(true);
        }
        let now = base() + Duration::milliseconds(i * 4000);
        assert!(detector.observe_with(now, &window).is_none());
        window.focused.set(false);
    }
}

#[test]
fn test_burst_within_one_interval_counts_once() {
    let mut detector = ActivityDetector::default();
    detector.observe(base(), false);
    for ms in (4000..8000).step_by(100) {
        assert!(detector
            .observe(base() + Duration::milliseconds(ms), false)
            .is_none());
    }
    assert_eq!(detector.hit_count(), 2);
}

#[test]
fn test_external_reset_returns_to_baseline() {
    let mut detector = ActivityDetector::new(ActivityConfig {
        interval_ms: 1000,
        window_size: 4,
        hit_threshold: 3,
    });
    detector.observe(base(), false);
    detector.observe(base() + Duration::seconds(1), false);
    assert_eq!(detector.hit_count(), 2);

    let now = base() + Duration::milliseconds(1500);
    detector.reset(now);
    assert_eq!((detector.hit_count(), detector.window_count()), (1, 1));
    assert_eq!(detector.deadline(), Some(now + Duration::seconds(1)));

    // Custom threshold: two more spaced events reach 3 hits.
    assert!(detector.observe(now + Duration::seconds(1), false).is_none());
    assert!(detector.observe(now + Duration::seconds(2), false).is_some());
}
