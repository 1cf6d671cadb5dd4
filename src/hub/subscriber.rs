//! Subscriber registry and subscription handles
//!
//! The registry is the hub's only shared mutable structure. Registration and
//! removal take the write lock; the dispatch loop takes the read lock just long
//! enough to copy the current targets, and never holds it across an await.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use super::cancel::CancelSignal;
use crate::stats::HubStats;

/// Unique identifier for a registered subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Registry entry for one subscriber
struct SubscriberEntry<T> {
    /// Delivery endpoint; dropping the last sender closes the subscription
    tx: mpsc::Sender<T>,
    /// Fired exactly once, when the entry is removed
    cancel: Arc<CancelSignal>,
    registered_at: Instant,
}

/// Everything a worker needs to deliver to one subscriber
pub(super) struct DeliveryTarget<T> {
    pub id: SubscriberId,
    pub tx: mpsc::Sender<T>,
    pub cancel: Arc<CancelSignal>,
}

/// Shared subscriber map
pub(super) struct Subscribers<T> {
    entries: RwLock<HashMap<SubscriberId, SubscriberEntry<T>>>,
    next_id: AtomicU64,
    /// Capacity of each subscriber's endpoint
    buffer: usize,
    pub(super) stats: Arc<HubStats>,
}

impl<T> Subscribers<T> {
    pub(super) fn new(buffer: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
            stats: Arc::new(HubStats::new()),
        }
    }

    /// Add a subscriber with a fresh cancel signal
    pub(super) fn register(self: &Arc<Self>) -> Subscription<T> {
        let id = SubscriberId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.buffer);

        let count = {
            let mut entries = self.entries.write();
            entries.insert(
                id,
                SubscriberEntry {
                    tx,
                    cancel: Arc::new(CancelSignal::new()),
                    registered_at: Instant::now(),
                },
            );
            entries.len()
        };
        self.stats.set_subscribers(count);

        tracing::debug!(subscriber = %id, subscribers = count, "Subscriber registered");

        Subscription {
            id,
            rx,
            subscribers: Arc::downgrade(self),
        }
    }

    /// Remove a subscriber and fire its cancel signal
    ///
    /// Returns `false` if the id was not registered.
    pub(super) fn unregister(&self, id: SubscriberId) -> bool {
        let (removed, count) = {
            let mut entries = self.entries.write();
            let removed = entries.remove(&id);
            (removed, entries.len())
        };

        let Some(entry) = removed else {
            return false;
        };
        entry.cancel.cancel();
        self.stats.set_subscribers(count);

        tracing::debug!(
            subscriber = %id,
            subscribers = count,
            lifetime_ms = entry.registered_at.elapsed().as_millis() as u64,
            "Subscriber removed"
        );
        true
    }

    /// Copy the current delivery targets under the read lock
    pub(super) fn snapshot(&self) -> Vec<DeliveryTarget<T>> {
        self.entries
            .read()
            .iter()
            .map(|(id, entry)| DeliveryTarget {
                id: *id,
                tx: entry.tx.clone(),
                cancel: Arc::clone(&entry.cancel),
            })
            .collect()
    }

    /// Remove every subscriber, closing their endpoints
    pub(super) fn close_all(&self) -> usize {
        let drained: Vec<_> = self.entries.write().drain().collect();
        self.stats.set_subscribers(0);

        for (_, entry) in &drained {
            entry.cancel.cancel();
        }
        drained.len()
    }

    pub(super) fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub(super) fn contains(&self, id: SubscriberId) -> bool {
        self.entries.read().contains_key(&id)
    }
}

/// Receiving side of a hub registration
///
/// Yields every value broadcast after registration completed, in broadcast
/// order, minus any the hub had to drop. Dropping the subscription unregisters it.
pub struct Subscription<T> {
    id: SubscriberId,
    rx: mpsc::Receiver<T>,
    subscribers: Weak<Subscribers<T>>,
}

impl<T> Subscription<T> {
    /// Identifier to pass to [`BroadcastHub::unregister`](super::BroadcastHub::unregister)
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Receive the next delivered value
    ///
    /// Returns `None` once the subscription has been removed or the hub shut
    /// down and every already-accepted value has been read.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Unregister and drop the subscription
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.unregister(self.id);
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
