//! Notification output for the terminal

use canopy_core::{Notification, NotificationSink};

/// Prints notifications to stderr, keeping stdout for command output
#[derive(Debug, Default)]
pub struct StderrSink;

impl StderrSink {
    /// Format one notification as a terminal line.
    pub fn format(notification: &Notification) -> String {
        let mark = if notification.is_error() { "x" } else { "ok" };
        format!("[{}] {}", mark, notification)
    }
}

impl NotificationSink for StderrSink {
    fn notify(&self, notification: Notification) {
        eprintln!("{}", Self::format(&notification));
    }
}
