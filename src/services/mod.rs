//! Services that keep frontend concerns out of the pacing logic

pub mod notification;

pub use notification::{CollectingNotifier, LogNotifier, NoOpNotifier, NotificationLevel, Notifier};
