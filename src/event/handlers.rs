use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{EditorEvent, EventHandler, Notification, Severity};

/// Forwards events to the `log` facade.
#[derive(Debug, Default)]
pub struct LogHandler;

impl EventHandler for LogHandler {
    fn handle_event(&mut self, event: &EditorEvent) {
        match event {
            EditorEvent::Notification(Notification { severity, message }) => match severity {
                Severity::Error => log::error!("❌ {}", message),
                Severity::Warning => log::warn!("⚠️ {}", message),
                Severity::Success => log::info!("✅ {}", message),
                Severity::Info => log::info!("{}", message),
            },
            EditorEvent::HistoryChanged { step, len } => {
                log::debug!("📜 History step {} of {}", step, len);
            }
            other => log::trace!("{:?}", other),
        }
    }
}

/// Collects notifications into a shared list that a UI (or a test) can drain.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, oldest first.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    /// Remove and return everything received so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn last(&self) -> Option<Notification> {
        self.entries.lock().last().cloned()
    }

    /// Handler that feeds this log; subscribe it to an [`crate::event::EventBus`].
    pub fn handler(&self) -> Box<dyn EventHandler> {
        Box::new(self.clone())
    }
}

impl EventHandler for NotificationLog {
    fn handle_event(&mut self, event: &EditorEvent) {
        if let EditorEvent::Notification(notification) = event {
            self.entries.lock().push(notification.clone());
        }
    }
}
