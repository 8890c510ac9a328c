//! User-facing notifications
//!
//! The core decides what to tell the user; the shell decides how to show it.

use shared::message::{NotificationLevel, NotificationPayload};
use tokio::sync::mpsc;

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: NotificationPayload);
}

/// Writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: NotificationPayload) {
        match n.level {
            NotificationLevel::Error => tracing::error!(title = %n.title, "{}", n.message),
            NotificationLevel::Warning => tracing::warn!(title = %n.title, "{}", n.message),
            NotificationLevel::Info | NotificationLevel::Success => {
                tracing::info!(title = %n.title, "{}", n.message)
            }
        }
    }
}

/// Forwards notifications to a UI task
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<NotificationPayload>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationPayload>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: NotificationPayload) {
        // dropped silently once the receiver is gone
        let _ = self.tx.send(notification);
    }
}
