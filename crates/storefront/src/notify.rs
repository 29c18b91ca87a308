//! Transient user notifications.
//!
//! Synchronizers publish a short message for every failed remote call (and
//! for a few successes); front-ends subscribe and show them as toasts.
//! Nothing is stored: a notification with no subscriber is dropped.

use std::fmt;

use tokio::sync::broadcast;
use tracing::debug;

/// Notifications buffered per subscriber before the oldest are skipped.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One transient message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Fan-out channel for [`Notification`]s.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Level::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Level::Error, message.into());
    }

    fn publish(&self, level: Level, message: String) {
        if self.tx.send(Notification { level, message }).is_err() {
            debug!(%level, "Notification dropped, no subscribers");
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_receive_notifications() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.error("Failed to add product to cart");
        notifier.success("Product added to wishlist");

        let first = rx.try_recv().unwrap();
        assert_eq!(first.level, Level::Error);
        assert_eq!(first.message, "Failed to add product to cart");
        assert_eq!(rx.try_recv().unwrap().level, Level::Success);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        Notifier::new().error("nobody listening");
    }
}
