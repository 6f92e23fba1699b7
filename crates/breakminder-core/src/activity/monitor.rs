//! Wires a raw input source to the [`ActivityDetector`].
//!
//! The OS-level hook only runs while the user preference is on; toggling it
//! starts and stops the underlying [`RawInputStream`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::detector::{ActivityConfig, ActivityDetector};
use crate::error::Result;
use crate::events::Event;
use crate::traits::WindowVisibility;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Key,
    Pointer,
    Wheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInputEvent {
    pub at: DateTime<Utc>,
    pub kind: InputKind,
}

/// A global input hook.
pub trait RawInputStream {
    /// Begin sending events to `tx` until [`stop`](RawInputStream::stop).
    fn start(&mut self, tx: mpsc::UnboundedSender<RawInputEvent>) -> Result<()>;

    fn stop(&mut self);
}

pub struct ActivityMonitor<I> {
    stream: I,
    detector: ActivityDetector,
    rx: Option<mpsc::UnboundedReceiver<RawInputEvent>>,
}

impl<I: RawInputStream> ActivityMonitor<I> {
    pub fn new(stream: I, config: ActivityConfig) -> Self {
        Self {
            stream,
            detector: ActivityDetector::new(config),
            rx: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.rx.is_some()
    }

    pub fn detector(&self) -> &ActivityDetector {
        &self.detector
    }

    /// Start or stop the input hook. Repeating the current setting is a no-op.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        match (enabled, self.rx.is_some()) {
            (true, false) => {
                let (tx, rx) = mpsc::unbounded_channel();
                self.stream.start(tx)?;
                self.rx = Some(rx);
                tracing::info!("activity detection enabled");
            }
            (false, true) => {
                self.stream.stop();
                self.rx = None;
                tracing::info!("activity detection disabled");
            }
            _ => {}
        }
        Ok(())
    }

    /// Wait for the next input event. Pends forever while disabled, so it
    /// can sit in a `select!` next to other sources.
    pub async fn next_event(&mut self) -> Option<RawInputEvent> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Non-blocking variant of [`next_event`](ActivityMonitor::next_event).
    pub fn try_next_event(&mut self) -> Option<RawInputEvent> {
        self.rx.as_mut()?.try_recv().ok()
    }

    pub fn observe(&mut self, event: RawInputEvent, window: &dyn WindowVisibility) -> Option<Event> {
        self.detector.observe_with(event.at, window)
    }

    /// The window became visible through other means.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.detector.reset(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[derive(Default)]
    struct ChannelStream {
        tx: Option<mpsc::UnboundedSender<RawInputEvent>>,
        starts: u32,
    }

    impl RawInputStream for ChannelStream {
        fn start(&mut self, tx: mpsc::UnboundedSender<RawInputEvent>) -> Result<()> {
            self.starts += 1;
            self.tx = Some(tx);
            Ok(())
        }

        fn stop(&mut self) {
            self.tx = None;
        }
    }

    struct Unfocused;

    impl WindowVisibility for Unfocused {
        fn is_focused(&self) -> bool {
            false
        }

        fn show(&mut self) {}
    }

    #[test]
    fn toggle_starts_and_stops_hook() {
        let mut monitor = ActivityMonitor::new(ChannelStream::default(), ActivityConfig::default());
        monitor.set_enabled(true).unwrap();
        monitor.set_enabled(true).unwrap();
        assert_eq!(monitor.stream.starts, 1);
        assert!(monitor.is_enabled());

        monitor.set_enabled(false).unwrap();
        assert!(!monitor.is_enabled());
        assert!(monitor.stream.tx.is_none());
        assert!(monitor.try_next_event().is_none());
    }

    #[tokio::test]
    async fn events_flow_into_detector() {
        let mut monitor = ActivityMonitor::new(ChannelStream::default(), ActivityConfig::default());
        monitor.set_enabled(true).unwrap();
        let tx = monitor.stream.tx.clone().unwrap();
        let start = Utc::now();
        for i in 0..6 {
            tx.send(RawInputEvent {
                at: start + Duration::milliseconds(i * 4000),
                kind: InputKind::Key,
            })
            .unwrap();
        }

        let mut signals = 0;
        for _ in 0..6 {
            let event = monitor.next_event().await.unwrap();
            if monitor.observe(event, &Unfocused).is_some() {
                signals += 1;
            }
        }
        assert_eq!(signals, 1);
    }
}
