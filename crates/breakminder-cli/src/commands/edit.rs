use chrono::Utc;
use clap::Subcommand;

use super::reminder::ReminderFields;
use super::{id_at, open_registry};

#[derive(Subcommand)]
pub enum EditAction {
    /// Open a reminder for editing; its timer stops until the edit ends
    Start {
        /// Position in the list
        index: usize,
    },
    /// Save changes to the reminder being edited and re-arm it
    Finish {
        #[command(flatten)]
        fields: ReminderFields,
    },
    /// Close the editor without changes
    Abandon,
}

pub fn run(action: EditAction) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let mut registry = open_registry(now)?;

    match action {
        EditAction::Start { index } => {
            let id = id_at(&registry, index)?;
            registry.begin_edit(id, now)?;
            println!("editing reminder {index}");
        }
        EditAction::Finish { fields } => {
            let current = registry
                .editing()
                .and_then(|id| registry.get(id))
                .map(|s| s.reminder().clone())
                .ok_or("no reminder is being edited")?;
            let reminder = fields.build(&current)?;
            registry.finish_edit(reminder, now)?;
            println!("saved");
        }
        EditAction::Abandon => {
            registry.abandon_edit(now)?;
            println!("ok");
        }
    }
    Ok(())
}
