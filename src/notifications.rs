//! User-visible notifications and the sinks that receive them.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
    Warning,
}

/// Where the UI should anchor the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPosition {
    #[default]
    TopCenter,
    TopRight,
    BottomCenter,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: Option<String>,
    pub message: String,
    pub dismissible: bool,
    pub position: NotificationPosition,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        level: NotificationLevel,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            level,
            title: None,
            message: message.into(),
            dismissible: true,
            position: NotificationPosition::default(),
            timestamp,
        }
    }

    pub fn success(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(NotificationLevel::Success, message, timestamp)
    }

    pub fn error(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(NotificationLevel::Error, message, timestamp)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn persistent(mut self) -> Self {
        self.dismissible = false;
        self
    }
}

/// Receives notifications. Delivery must not block the caller.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Keeps every notification in memory, newest last.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notification> {
        self.entries.lock().ok().and_then(|e| e.last().cloned())
    }

    /// Removes and returns the newest notification.
    pub fn pop(&self) -> Option<Notification> {
        self.entries.lock().ok().and_then(|mut e| e.pop())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for NotificationLog {
    fn notify(&self, notification: Notification) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(notification),
            Err(_) => error!("notification log lock poisoned, dropping notification"),
        }
    }
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => error!(message = %notification.message, "notification"),
            NotificationLevel::Warning => warn!(message = %notification.message, "notification"),
            NotificationLevel::Success | NotificationLevel::Info => {
                info!(message = %notification.message, "notification")
            }
        }
    }
}

/// Forwards notifications over an unbounded channel to a consumer task.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, UnboundedReceiver<Notification>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.sender.send(notification) {
            warn!("notification receiver dropped: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn defaults_are_dismissible_top_center() {
        let n = Notification::success("done", now());
        assert!(n.dismissible);
        assert_eq!(n.position, NotificationPosition::TopCenter);
        assert_eq!(n.level, NotificationLevel::Success);
        assert!(n.title.is_none());
    }

    #[test]
    fn log_pops_newest_first() {
        let log = NotificationLog::new();
        log.notify(Notification::success("first", now()));
        log.notify(Notification::error("second", now()));
        assert_eq!(log.len(), 2);
        assert_eq!(log.pop().unwrap().level, NotificationLevel::Error);
        assert_eq!(log.last().unwrap().message, "first");
    }

    #[tokio::test]
    async fn channel_delivers_in_order() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier.notify(Notification::success("a", now()));
        notifier.notify(Notification::error("b", now()).persistent());
        assert_eq!(rx.recv().await.unwrap().message, "a");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.message, "b");
        assert!(!second.dismissible);
    }

    #[test]
    fn level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&NotificationLevel::Error).unwrap(), r#""error""#);
    }
}
