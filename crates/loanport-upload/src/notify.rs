use std::sync::{Mutex, PoisonError};

use loanport_core::{ErrorMetadata, UploadError};
use serde::Serialize;

use crate::traits::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(file_name: &str) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: "Upload Successful".to_string(),
            message: format!("{} uploaded successfully.", file_name),
        }
    }

    /// Title and message come from the error's metadata, so connectivity
    /// failures read differently from server rejections.
    pub fn from_error(err: &UploadError) -> Self {
        let level = match err {
            UploadError::Cancelled => NotificationLevel::Warning,
            err if err.kind() == loanport_core::ErrorKind::ValidationRejection => {
                NotificationLevel::Warning
            }
            _ => NotificationLevel::Error,
        };
        Self {
            level,
            title: err.title().to_string(),
            message: err.client_message(),
        }
    }
}

/// Writes notifications to the log. Default for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => tracing::info!(
                title = %notification.title,
                "{}",
                notification.message
            ),
            NotificationLevel::Warning => tracing::warn!(
                title = %notification.title,
                "{}",
                notification.message
            ),
            NotificationLevel::Error => tracing::error!(
                title = %notification.title,
                "{}",
                notification.message
            ),
        }
    }
}

/// Keeps every notification in memory, in order.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.notifications().into_iter().map(|n| n.title).collect()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_notification_is_distinct() {
        let network = Notification::from_error(&UploadError::Transport("fetch failed".into()));
        let server = Notification::from_error(&UploadError::Server {
            status: 422,
            message: "Unprocessable".into(),
        });
        assert_eq!(network.title, "Connection problem");
        assert_eq!(server.title, "Upload failed");
        assert_ne!(network.message, server.message);
        assert_eq!(server.level, NotificationLevel::Error);
    }

    #[test]
    fn test_validation_rejection_is_warning() {
        let n = Notification::from_error(&UploadError::FileTooLarge {
            file_name: "big.pdf".into(),
            size: 6_000_000,
            max: 5_242_880,
        });
        assert_eq!(n.level, NotificationLevel::Warning);
        assert_eq!(n.title, "File too large");
    }

    #[test]
    fn test_collecting_notifier_keeps_order() {
        let notifier = CollectingNotifier::new();
        notifier.notify(Notification::success("a.pdf"));
        notifier.notify(Notification::from_error(&UploadError::Cancelled));
        assert_eq!(notifier.titles(), vec!["Upload Successful", "Upload cancelled"]);
    }
}
