//! Long-running host loop: fires reminders and watches for activity.
//!
//! Other `breakminder` invocations write to the same store; the loop notices
//! and reloads, the way a second app window would.

use std::time::Duration as StdDuration;

use breakminder_core::{
    ActivityMonitor, Config, Event, ReminderRegistry, SqliteStore, WindowVisibility,
};
use chrono::Utc;
use clap::Args;
use tokio::time::Instant;

use crate::host::{StdinInput, TerminalNotifier, TerminalWindow};

#[derive(Args)]
pub struct WatchArgs {
    /// Treat each line on stdin as user input for activity detection
    #[arg(long)]
    activity_from_stdin: bool,
    /// How often to look for changes made by other processes, in ms
    #[arg(long, default_value_t = 1000)]
    poll_ms: u64,
    /// Stop after this many seconds
    #[arg(long)]
    duration_secs: Option<u64>,
}

pub fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(watch(args))
}

async fn watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut registry = ReminderRegistry::load(SqliteStore::open()?, Utc::now())?;
    let mut notifier = TerminalNotifier::new(config.notifications.enabled);
    let mut window = TerminalWindow;
    let mut monitor =
        ActivityMonitor::new(StdinInput::default(), config.activity.detector_config());
    monitor.set_enabled(args.activity_from_stdin || config.activity.enabled)?;

    let poll = StdDuration::from_millis(args.poll_ms.max(50));
    let stop_at = args
        .duration_secs
        .map(|secs| Instant::now() + StdDuration::from_secs(secs));
    tracing::info!(reminders = registry.len(), "watching");

    loop {
        let now = Utc::now();
        if registry.store_changed()? {
            tracing::info!("reminder list changed elsewhere, reloading");
            registry.reload(now)?;
        }
        registry.fire_due(now, &mut notifier)?;
        log_events(&mut registry);

        let mut wait = registry
            .next_due()
            .map(|due| (due - Utc::now()).to_std().unwrap_or_default())
            .unwrap_or(poll)
            .min(poll);
        if let Some(stop_at) = stop_at {
            let left = stop_at.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            wait = wait.min(left);
        }

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            input = monitor.next_event() => match input {
                Some(event) => {
                    if let Some(signal) = monitor.observe(event, &window) {
                        tracing::info!(?signal, "continuous activity away from breakminder");
                        if config.notifications.surface_on_activity {
                            window.show();
                        }
                    }
                }
                // stdin closed
                None => monitor.set_enabled(false)?,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

fn log_events(registry: &mut ReminderRegistry<SqliteStore>) {
    for event in registry.drain_events() {
        match &event {
            Event::ReminderFired { id, ignore_count, next_due, .. } => {
                tracing::info!(%id, ignore_count, %next_due, "reminder delivered");
            }
            other => tracing::debug!(event = ?other, "reminder event"),
        }
    }
}
