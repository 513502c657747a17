//! User-visible notifications
//!
//! Actions report their outcome as short toast-like notifications. Where they
//! end up depends on the surface: the CLI prints them, the TUI queues them for
//! its status bar.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Visual weight of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    Default,
    /// Failure; shown in an error style
    Destructive,
}

/// A transient message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    /// Create a success/info notification
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Default,
        }
    }

    /// Create a failure notification
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Destructive,
        }
    }

    /// Whether this reports a failure
    pub fn is_error(&self) -> bool {
        self.variant == Variant::Destructive
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Destination for notifications
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification
    fn notify(&self, notification: Notification);
}

/// Sink that discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _notification: Notification) {}
}

/// Sink that keeps notifications in memory until drained
#[derive(Debug, Default)]
pub struct QueueSink {
    queue: Mutex<VecDeque<Notification>>,
}

impl QueueSink {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all pending notifications, oldest first
    pub fn drain(&self) -> Vec<Notification> {
        match self.queue.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        }
    }
}

impl NotificationSink for QueueSink {
    fn notify(&self, notification: Notification) {
        match self.queue.lock() {
            Ok(mut queue) => queue.push_back(notification),
            Err(poisoned) => poisoned.into_inner().push_back(notification),
        }
    }
}

/// Cloneable handle to the active sink
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}

impl Notifier {
    /// Wrap a sink
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// A notifier that drops every message
    pub fn silent() -> Self {
        Self::new(Arc::new(NullSink))
    }

    /// Send an info notification
    pub fn info(&self, title: &str, description: &str) {
        self.sink.notify(Notification::info(title, description));
    }

    /// Send a failure notification
    pub fn error(&self, title: &str, description: &str) {
        self.sink.notify(Notification::error(title, description));
    }
}
