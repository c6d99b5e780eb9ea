//! User-facing notifications
//!
//! Every notification is logged and published on the event bus; how it is
//! shown (toast, terminal line) is up to the subscriber.

use crate::events::{AppEvent, EventBus, NotificationLevel};

#[derive(Clone)]
pub struct NotificationService {
    events: EventBus,
}

impl NotificationService {
    pub fn new(events: EventBus) -> Self {
        Self { events }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Warning, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Info, message.into());
    }

    fn notify(&self, level: NotificationLevel, message: String) {
        match level {
            NotificationLevel::Error => tracing::error!("{}", message),
            NotificationLevel::Warning => tracing::warn!("{}", message),
            NotificationLevel::Success | NotificationLevel::Info => tracing::info!("{}", message),
        }

        self.events.publish(AppEvent::Notification { level, message });
    }
}
