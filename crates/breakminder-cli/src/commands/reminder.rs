use breakminder_core::{
    humanize, Config, Escalation, Reminder, ReminderScheduler, SchedulerState,
};
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Subcommand};

use super::{id_at, open_registry, parse_span};
use crate::host::TerminalWindow;

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Create a reminder and arm it
    Add {
        #[command(flatten)]
        fields: ReminderFields,
    },
    /// List reminders with their time left
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a reminder
    Remove {
        /// Position in the list (as shown by `reminder list`)
        index: usize,
    },
    /// Pause a reminder, keeping its remaining time
    Pause { index: usize },
    /// Resume a paused reminder
    Resume { index: usize },
    /// Respond to a delivered notification
    Ack { index: usize },
    /// Drop the ignore penalty and wait a full interval
    AckIgnored { index: usize },
}

/// Reminder fields shared by `reminder add` and `edit finish`.
#[derive(Args, Default)]
pub struct ReminderFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub message: Option<String>,
    /// Repeat interval, e.g. 30m
    #[arg(long, value_parser = parse_span)]
    pub every: Option<Duration>,
    /// Delay before the first notification only
    #[arg(long, value_parser = parse_span)]
    pub first_after: Option<Duration>,
    /// Shorter repeat used while notifications go unanswered (0 disables)
    #[arg(long, value_parser = parse_span)]
    pub ignore_every: Option<Duration>,
    /// Unanswered notifications before falling back to the normal interval
    /// (0 never falls back)
    #[arg(long)]
    pub max_ignored: Option<u32>,
}

impl ReminderFields {
    /// Build a reminder from these fields, falling back to `base`.
    pub fn build(self, base: &Reminder) -> Result<Reminder, Box<dyn std::error::Error>> {
        let (base_ignore, base_max) = match &base.escalation {
            Escalation::Normal => (Duration::zero(), 0),
            Escalation::Penalty { interval, max, .. } => {
                (*interval, max.unwrap_or(0))
            }
        };
        let reminder = Reminder::new(
            self.title.unwrap_or_else(|| base.title.clone()),
            self.message.unwrap_or_else(|| base.message.clone()),
            self.every.unwrap_or(base.interval),
        )?
        .with_start_override(
            self.first_after
                .or(base.start_override)
                .unwrap_or_else(Duration::zero),
        )
        .with_penalty(
            self.ignore_every.unwrap_or(base_ignore),
            self.max_ignored.unwrap_or(base_max),
        );
        reminder.validate()?;
        Ok(reminder)
    }
}

fn config_minutes(key: &str, minutes: u64) -> Result<Duration, String> {
    i64::try_from(minutes)
        .ok()
        .and_then(Duration::try_minutes)
        .ok_or_else(|| format!("config value defaults.{key} = {minutes} is out of range"))
}

/// Template reminder carrying the configured defaults.
fn from_config(config: &Config) -> Result<Reminder, Box<dyn std::error::Error>> {
    let d = &config.defaults;
    let reminder = Reminder::new(
        "Take a break",
        "Step away from the screen for a moment.",
        config_minutes("interval_min", d.interval_min)?,
    )?
    .with_start_override(config_minutes("start_override_min", d.start_override_min)?)
    .with_penalty(
        config_minutes("ignore_interval_min", d.ignore_interval_min)?,
        d.max_ignored,
    );
    reminder.validate()?;
    Ok(reminder)
}

fn describe(scheduler: &ReminderScheduler, now: DateTime<Utc>) -> String {
    match (scheduler.state(), scheduler.remaining(now)) {
        (SchedulerState::Idle, _) | (_, None) => "stopped".to_string(),
        (state, Some(left)) => {
            let text = humanize(left).unwrap_or_default();
            if state == SchedulerState::Paused {
                format!("paused, {text}")
            } else {
                format!("next in {text}")
            }
        }
    }
}

pub fn run(action: ReminderAction) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let mut registry = open_registry(now)?;

    match action {
        ReminderAction::Add { fields } => {
            let config = Config::load_or_default();
            let reminder = fields.build(&from_config(&config)?)?;
            let id = registry.add(reminder, now)?;
            let index = registry.position(id).unwrap_or_default();
            println!("added reminder {index}");
        }
        ReminderAction::List { json } => {
            let editing = registry.editing();
            if json {
                let rows: Vec<_> = registry
                    .iter()
                    .enumerate()
                    .map(|(index, s)| {
                        let r = s.reminder();
                        serde_json::json!({
                            "index": index,
                            "title": r.title,
                            "message": r.message,
                            "state": s.state(),
                            "next_fire_time": r.next_fire_time,
                            "remaining_ms": s.remaining(now).map(|d| d.num_milliseconds()),
                            "ignore_count": r.escalation.ignore_count(),
                            "ignored": r.escalation.is_ignored(),
                            "editing": editing == Some(s.id()),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if registry.is_empty() {
                println!("no reminders");
            } else {
                for (index, s) in registry.iter().enumerate() {
                    let marker = if editing == Some(s.id()) { " (editing)" } else { "" };
                    println!(
                        "{index:>3}  {:<24} {}{marker}",
                        s.reminder().title,
                        describe(s, now)
                    );
                }
            }
        }
        ReminderAction::Remove { index } => {
            let id = id_at(&registry, index)?;
            let removed = registry.remove(id, now)?;
            println!("removed '{}'", removed.title);
        }
        ReminderAction::Pause { index } => {
            let id = id_at(&registry, index)?;
            if registry.set_paused(id, true, now)? {
                println!("paused");
            } else {
                println!("not running, nothing to pause");
            }
        }
        ReminderAction::Resume { index } => {
            let id = id_at(&registry, index)?;
            if registry.set_paused(id, false, now)? {
                println!("resumed");
            } else {
                println!("not paused");
            }
        }
        ReminderAction::Ack { index } => {
            let id = id_at(&registry, index)?;
            registry.acknowledge(id, now, &mut TerminalWindow)?;
            println!("ok");
        }
        ReminderAction::AckIgnored { index } => {
            let id = id_at(&registry, index)?;
            registry.acknowledge_ignored(id, now)?;
            println!("ok");
        }
    }

    for event in registry.drain_events() {
        tracing::debug!(?event, "reminder event");
    }
    Ok(())
}
