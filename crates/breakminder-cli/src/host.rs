//! Terminal stand-ins for the desktop shell.

use breakminder_core::{
    InputKind, NotificationSink, RawInputEvent, RawInputStream, ReminderId, WindowVisibility,
};
use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Prints notifications to stdout.
pub struct TerminalNotifier {
    enabled: bool,
}

impl TerminalNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl NotificationSink for TerminalNotifier {
    fn deliver(&mut self, id: ReminderId, title: &str, message: &str) {
        if !self.enabled {
            tracing::debug!(%id, "notifications disabled, dropping");
            return;
        }
        println!("[{}] {title}: {message}", Local::now().format("%H:%M"));
    }
}

/// The terminal never has "app focus"; showing it just rings the bell.
#[derive(Default)]
pub struct TerminalWindow;

impl WindowVisibility for TerminalWindow {
    fn is_focused(&self) -> bool {
        false
    }

    fn show(&mut self) {
        tracing::info!("bringing breakminder forward");
        print!("\x07");
    }
}

/// Every line read from stdin counts as one key press.
#[derive(Default)]
pub struct StdinInput {
    task: Option<JoinHandle<()>>,
}

impl RawInputStream for StdinInput {
    fn start(&mut self, tx: mpsc::UnboundedSender<RawInputEvent>) -> breakminder_core::error::Result<()> {
        self.task = Some(tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(_)) = lines.next_line().await {
                let event = RawInputEvent {
                    at: chrono::Utc::now(),
                    kind: InputKind::Key,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        }));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
