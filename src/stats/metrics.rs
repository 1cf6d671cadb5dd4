//! Delivery statistics for the broadcast hub

use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome of a single delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The subscriber accepted the value
    Delivered,
    /// The per-delivery timeout elapsed first
    TimedOut,
    /// The subscriber was unregistered while the delivery was pending
    Cancelled,
    /// The subscriber dropped its receiving end
    Closed,
}

/// Hub-wide counters
///
/// Updated concurrently by the dispatch loop and every worker, so all fields
/// are relaxed atomics. Use [`HubStats::snapshot`] to read a consistent-enough copy.
#[derive(Debug, Default)]
pub struct HubStats {
    messages: AtomicU64,
    delivered: AtomicU64,
    timed_out: AtomicU64,
    cancelled: AtomicU64,
    closed: AtomicU64,
    subscribers: AtomicU64,
}

impl HubStats {
    /// Create zeroed stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one transformed input message
    pub fn record_message(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Count the outcome of one delivery task
    pub fn record_outcome(&self, outcome: DeliveryOutcome) {
        let counter = match outcome {
            DeliveryOutcome::Delivered => &self.delivered,
            DeliveryOutcome::TimedOut => &self.timed_out,
            DeliveryOutcome::Cancelled => &self.cancelled,
            DeliveryOutcome::Closed => &self.closed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Set the current subscriber gauge
    pub fn set_subscribers(&self, count: usize) {
        self.subscribers.store(count as u64, Ordering::Relaxed);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> HubStatsSnapshot {
        HubStatsSnapshot {
            messages: self.messages.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            closed: self.closed.load(Ordering::Relaxed),
            subscribers: self.subscribers.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`HubStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStatsSnapshot {
    /// Input messages transformed and dispatched
    pub messages: u64,
    /// Deliveries accepted by a subscriber
    pub delivered: u64,
    /// Deliveries dropped on timeout
    pub timed_out: u64,
    /// Deliveries abandoned because the subscriber was removed
    pub cancelled: u64,
    /// Deliveries abandoned because the receiver was dropped
    pub closed: u64,
    /// Registered subscribers
    pub subscribers: u64,
}

impl HubStatsSnapshot {
    /// Total deliveries that did not reach their subscriber
    pub fn dropped(&self) -> u64 {
        self.timed_out + self.cancelled + self.closed
    }
}
