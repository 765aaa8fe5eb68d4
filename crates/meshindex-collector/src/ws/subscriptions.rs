//! Subscription bookkeeping for one WebSocket connection.
//!
//! Owned by the connection task; callers only ever hold the receiving end.
//! There is no re-subscription: when the connection ends, every
//! subscription ends with it.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

pub struct SubscriptionRegistry {
    buffer: usize,
    entries: HashMap<String, mpsc::Sender<Value>>,
}

impl SubscriptionRegistry {
    /// `buffer` is the per-subscription queue depth.
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer: buffer.max(1),
            entries: HashMap::new(),
        }
    }

    /// Register a new subscription and return its message queue.
    pub fn register(&mut self, id: String) -> mpsc::Receiver<Value> {
        let (tx, rx) = mpsc::channel(self.buffer);
        self.entries.insert(id, tx);
        rx
    }

    /// Forward a notification to its subscriber.
    ///
    /// Waits while the subscriber's queue is full, so a slow consumer stalls
    /// the socket reader instead of losing messages. A subscriber that has
    /// gone away is forgotten.
    pub async fn dispatch(&mut self, id: &str, message: Value) {
        let Some(tx) = self.entries.get(id) else {
            return;
        };
        if tx.send(message).await.is_err() {
            debug!(subscription = id, "subscriber gone");
            self.entries.remove(id);
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.entries.remove(id);
    }

    /// End every subscription.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
