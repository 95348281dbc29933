//! Notification sink for task failures

use std::sync::Mutex;

/// A user-visible notification about a failed task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Title (the tool name)
    pub title: String,
    /// Subtitle (what happened)
    pub subtitle: String,
    /// Detail message
    pub message: String,
    /// Whether the sink should make an audible signal
    pub sound: bool,
}

impl Notification {
    /// Notification for a failed task
    pub fn failure(task: &str, message: impl Into<String>) -> Self {
        Self {
            title: "assetline".to_string(),
            subtitle: format!("{} failed", task),
            message: message.into(),
            sound: true,
        }
    }
}

/// Destination for failure notifications.
///
/// Every task error of a run reaches exactly one sink.
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification
    fn notify(&self, notification: &Notification);
}

/// Sink that logs notifications through tracing
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: &Notification) {
        tracing::error!(
            title = %notification.title,
            "{}: {}",
            notification.subtitle,
            notification.message
        );
    }
}

/// Sink that keeps notifications for later inspection (useful for testing)
#[derive(Debug, Default)]
pub struct CollectingSink {
    notifications: Mutex<Vec<Notification>>,
}

impl CollectingSink {
    /// Get all collected notifications
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for CollectingSink {
    fn notify(&self, notification: &Notification) {
        if let Ok(mut n) = self.notifications.lock() {
            n.push(notification.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_notification() {
        let n = Notification::failure("css", "Undefined variable: $brand");
        assert_eq!(n.subtitle, "css failed");
        assert!(n.sound);
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::default();
        sink.notify(&Notification::failure("html", "missing include"));
        LogSink.notify(&Notification::failure("html", "missing include"));
        assert_eq!(sink.notifications().len(), 1);
    }
}
