//! Delivery of the recovery notification.

use std::path::PathBuf;

use error_stack::Report;
use error_stack::ResultExt;
use thiserror::Error;
use tracing::info;

/// Content of a desktop notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub icon: Option<PathBuf>,
}

impl Default for Notification {
    fn default() -> Self {
        Self {
            title: "Kubernetes Update".to_string(),
            message: "All pods are running normally!".to_string(),
            icon: Some(PathBuf::from("img.png")),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to deliver notification '{title}'")]
    DeliveryFailed { title: String },
}

/// Fire-and-forget notification sink. Failures are not retried.
pub trait Notifier: Send + Sync {
    /// # Errors
    ///
    /// - [`NotifyError::DeliveryFailed`] if the notification could not be shown
    fn notify(&self, notification: &Notification) -> Result<(), Report<NotifyError>>;
}

/// Shows the notification through the desktop notification service.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), Report<NotifyError>> {
        let mut desktop = notify_rust::Notification::new();
        desktop
            .summary(&notification.title)
            .body(&notification.message);
        if let Some(icon) = &notification.icon {
            desktop.icon(&icon.to_string_lossy());
        }

        desktop
            .show()
            .change_context(NotifyError::DeliveryFailed {
                title: notification.title.clone(),
            })?;

        info!(title = %notification.title, "Desktop notification sent");
        Ok(())
    }
}

/// Writes the notification to the log instead of the desktop.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), Report<NotifyError>> {
        info!(
            title = %notification.title,
            icon = ?notification.icon,
            "{}",
            notification.message
        );
        Ok(())
    }
}
