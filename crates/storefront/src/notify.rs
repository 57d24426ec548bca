//! Toast notifications.
//!
//! Notifications are fire-and-forget: the storefront never waits on them and
//! never learns whether they were shown.

use std::sync::Mutex;

use woala_core::NotificationKind;

/// Something that can show a short message to the shopper.
pub trait Notifier: Send + Sync {
    /// Show `message` styled as `kind`.
    fn notify(&self, message: &str, kind: NotificationKind);
}

/// Notifier that keeps every message, for assertions and replay.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(NotificationKind, String)>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<(NotificationKind, String)> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Messages of one kind, oldest first.
    #[must_use]
    pub fn of_kind(&self, kind: NotificationKind) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((kind, message.to_owned()));
        }
    }
}
