//! WebSocket fan-out.
//!
//! The broadcaster owns the subscriber registry and pushes each tick's
//! payloads to every registered sink concurrently. A failed send drops that
//! subscriber; the remaining sends are unaffected. There is no per-subscriber
//! queueing or retry: a slow consumer misses ticks rather than backing up
//! the pipeline.

mod endpoint;

pub use endpoint::serve;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::future::join_all;
use tracing::{debug, info};

/// Which rendition of the tick a subscriber receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadProfile {
    /// The full flattened snapshot.
    Full,
    /// Control inputs only.
    Inputs,
}

/// Write half of one subscriber connection.
///
/// The transport layer wraps its socket in this; tests substitute mocks.
#[async_trait]
pub trait SubscriberSink: Send + Sync {
    /// Push one text frame. An error marks the subscriber dead.
    async fn send_text(&self, text: &str) -> Result<(), SinkError>;

    /// Best-effort close. Errors are ignored.
    async fn close(&self);
}

/// Opaque send failure reported by a sink.
#[derive(Debug, thiserror::Error)]
#[error("subscriber send failed: {0}")]
pub struct SinkError(pub String);

struct Subscriber {
    sink: Arc<dyn SubscriberSink>,
    profile: PayloadProfile,
}

/// Subscriber registry plus the per-tick fan-out.
#[derive(Default)]
pub struct Broadcaster {
    subscribers: DashMap<u64, Subscriber>,
    next_id: AtomicU64,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink; the returned id deregisters it later.
    pub fn add(&self, sink: Arc<dyn SubscriberSink>, profile: PayloadProfile) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.insert(id, Subscriber { sink, profile });
        info!(id, ?profile, total = self.subscribers.len(), "subscriber added");
        id
    }

    /// Deregister a subscriber. Unknown ids are a no-op.
    pub fn remove(&self, id: u64) {
        if self.subscribers.remove(&id).is_some() {
            info!(id, total = self.subscribers.len(), "subscriber removed");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Send the pre-serialized payloads to every subscriber concurrently.
    ///
    /// Each profile's text is serialized once by the caller and shared by
    /// all subscribers on that profile. Subscribers whose send fails are
    /// removed and closed.
    pub async fn broadcast(&self, full: &str, inputs: &str) {
        let targets: Vec<(u64, Arc<dyn SubscriberSink>, PayloadProfile)> = self
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(&entry.value().sink), entry.value().profile))
            .collect();
        if targets.is_empty() {
            return;
        }

        let sends = targets.into_iter().map(|(id, sink, profile)| async move {
            let text = match profile {
                PayloadProfile::Full => full,
                PayloadProfile::Inputs => inputs,
            };
            let result = sink.send_text(text).await;
            (id, sink, result)
        });

        for (id, sink, result) in join_all(sends).await {
            if let Err(err) = result {
                debug!(id, error = %err, "dropping failed subscriber");
                self.subscribers.remove(&id);
                sink.close().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct RecordingSink {
        received: Mutex<Vec<String>>,
        fail: bool,
        closed: Mutex<bool>,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                received: Mutex::new(Vec::new()),
                fail,
                closed: Mutex::new(false),
            })
        }
    }

    #[async_trait]
    impl SubscriberSink for RecordingSink {
        async fn send_text(&self, text: &str) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError("connection reset".to_string()));
            }
            self.received.lock().push(text.to_string());
            Ok(())
        }

        async fn close(&self) {
            *self.closed.lock() = true;
        }
    }

    #[tokio::test]
    async fn test_profiles_receive_their_payload() {
        let broadcaster = Broadcaster::new();
        let full_sink = RecordingSink::new(false);
        let inputs_sink = RecordingSink::new(false);
        broadcaster.add(full_sink.clone(), PayloadProfile::Full);
        broadcaster.add(inputs_sink.clone(), PayloadProfile::Inputs);

        broadcaster.broadcast("{\"full\":1}", "{\"inputs\":1}").await;

        assert_eq!(full_sink.received.lock().as_slice(), ["{\"full\":1}"]);
        assert_eq!(inputs_sink.received.lock().as_slice(), ["{\"inputs\":1}"]);
    }

    #[tokio::test]
    async fn test_failed_subscriber_is_dropped_others_unaffected() {
        let broadcaster = Broadcaster::new();
        let ok_a = RecordingSink::new(false);
        let bad = RecordingSink::new(true);
        let ok_b = RecordingSink::new(false);
        broadcaster.add(ok_a.clone(), PayloadProfile::Full);
        let bad_id = broadcaster.add(bad.clone(), PayloadProfile::Full);
        broadcaster.add(ok_b.clone(), PayloadProfile::Inputs);
        assert_eq!(broadcaster.subscriber_count(), 3);

        broadcaster.broadcast("full", "inputs").await;

        assert_eq!(broadcaster.subscriber_count(), 2);
        assert!(!broadcaster.subscribers.contains_key(&bad_id));
        assert!(*bad.closed.lock());
        assert_eq!(ok_a.received.lock().len(), 1);
        assert_eq!(ok_b.received.lock().len(), 1);

        // The survivors keep receiving on later ticks.
        broadcaster.broadcast("full2", "inputs2").await;
        assert_eq!(ok_a.received.lock().as_slice(), ["full", "full2"]);
        assert_eq!(ok_b.received.lock().as_slice(), ["inputs", "inputs2"]);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let broadcaster = Broadcaster::new();
        let id = broadcaster.add(RecordingSink::new(false), PayloadProfile::Full);
        broadcaster.remove(id);
        broadcaster.remove(id);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}
