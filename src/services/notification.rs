//! User notification service
//!
//! Separates user-facing messages (the transient "toast" a host shows when a
//! processor cannot be created) from the logic that produces them, so each
//! frontend can present them its own way.

use std::sync::{Arc, Mutex};
use tracing::warn;

/// Severity of a user notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Trait for showing transient messages to the user
pub trait Notifier: Send + Sync {
    /// Show a short-lived message
    ///
    /// # Arguments
    /// * `level` - Severity of the message
    /// * `message` - Text shown to the user
    fn notify(&self, level: NotificationLevel, message: &str);
}

/// No-op notifier that discards all messages
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn notify(&self, _level: NotificationLevel, _message: &str) {
        // Intentionally empty - discards notifications
    }
}

/// Notifier that emits messages as tracing events
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        match level {
            NotificationLevel::Info => tracing::info!(notification = %message, "💬 Notification"),
            NotificationLevel::Error => warn!(notification = %message, "⚠️  Notification"),
        }
    }
}

/// Notifier that keeps every message, for hosts that poll and for tests
#[derive(Debug, Clone, Default)]
pub struct CollectingNotifier {
    messages: Arc<Mutex<Vec<(NotificationLevel, String)>>>,
}

impl CollectingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages received so far, oldest first
    #[must_use]
    pub fn messages(&self) -> Vec<(NotificationLevel, String)> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    /// Remove and return all messages received so far
    pub fn drain(&self) -> Vec<(NotificationLevel, String)> {
        self.messages
            .lock()
            .map(|mut messages| std::mem::take(&mut *messages))
            .unwrap_or_default()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((level, message.to_string()));
        }
    }
}
