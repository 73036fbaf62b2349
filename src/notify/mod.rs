//! Progress notifications
//!
//! The crawler reports batch boundaries, per-match outcomes, retries and
//! cancellation as short human-readable strings. Delivery is best-effort:
//! a notification nobody is listening to is simply dropped.

use std::io::Write;
use tokio::sync::broadcast;

/// Default capacity of the notification channel
pub const DEFAULT_CAPACITY: usize = 256;

/// One-way sink for progress messages
pub trait Notifier: Send + Sync {
    /// Publishes a message; never fails
    fn broadcast(&self, message: &str);
}

/// Notifier backed by a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<String>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribes to messages published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for ChannelNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Notifier for ChannelNotifier {
    fn broadcast(&self, message: &str) {
        // Err only means there are no subscribers right now
        let _ = self.tx.send(message.to_string());
    }
}

/// Writes every received message to `out`, one per line, until the channel closes
pub async fn forward_lines<W: Write>(mut rx: broadcast::Receiver<String>, mut out: W) {
    loop {
        match rx.recv().await {
            Ok(message) => {
                if writeln!(out, "{}", message).is_err() {
                    break;
                }
                let _ = out.flush();
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(dropped = n, "notification feed lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
