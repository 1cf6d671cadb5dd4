//! Broadcast hub implementation
//!
//! The hub reads one input queue, transforms each message once, and hands one
//! delivery task per current subscriber to the worker pool.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::error::BroadcastError;
use super::subscriber::{SubscriberId, Subscribers, Subscription};
use super::worker::{spawn_workers, DeliveryTask};
use crate::stats::HubStatsSnapshot;

/// Capacity of the dispatch-to-worker queue: a synchronous handoff
const TASK_QUEUE_CAPACITY: usize = 1;

/// Default capacity of each subscriber endpoint
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 1;

/// Fan-out hub from one input stream to many subscribers
///
/// Cloning is cheap and every clone shares the same subscriber set, so the
/// driver can run the loop while request handlers register and unregister.
pub struct BroadcastHub<In, Out> {
    subscribers: Arc<Subscribers<Out>>,
    transform: Arc<dyn Fn(In) -> Out + Send + Sync>,
    running: Arc<AtomicBool>,
}

impl<In, Out> Clone for BroadcastHub<In, Out> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
            transform: Arc::clone(&self.transform),
            running: Arc::clone(&self.running),
        }
    }
}

impl<In, Out> BroadcastHub<In, Out>
where
    In: Send + 'static,
    Out: Clone + Send + 'static,
{
    /// Create a hub applying `transform` once per input message
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(In) -> Out + Send + Sync + 'static,
    {
        Self::with_subscriber_buffer(transform, DEFAULT_SUBSCRIBER_BUFFER)
    }

    /// Create a hub whose subscriber endpoints hold up to `buffer` values
    pub fn with_subscriber_buffer<F>(transform: F, buffer: usize) -> Self
    where
        F: Fn(In) -> Out + Send + Sync + 'static,
    {
        Self {
            subscribers: Arc::new(Subscribers::new(buffer)),
            transform: Arc::new(transform),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register a new subscriber
    ///
    /// The subscriber only sees messages whose fan-out starts after this returns.
    pub fn register(&self) -> Subscription<Out> {
        self.subscribers.register()
    }

    /// Remove a subscriber, abandoning any delivery in flight to it
    ///
    /// Returns `false` if it was not registered (already removed, or dropped by
    /// hub shutdown).
    pub fn unregister(&self, id: SubscriberId) -> bool {
        self.subscribers.unregister(id)
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Check whether `id` is still registered
    pub fn is_registered(&self, id: SubscriberId) -> bool {
        self.subscribers.contains(id)
    }

    /// Current delivery counters
    pub fn stats(&self) -> HubStatsSnapshot {
        self.subscribers.stats.snapshot()
    }

    /// Check whether a fan-out loop is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run the fan-out loop until `input` is closed
    ///
    /// On return every worker has finished and every subscriber still
    /// registered has been removed, so their `recv` yields `None`. The input
    /// receiver is borrowed so a supervisor can call `run` again after a failure.
    pub async fn run(
        &self,
        input: &mut mpsc::Receiver<In>,
        worker_count: usize,
        delivery_timeout: Duration,
    ) -> Result<(), BroadcastError> {
        if worker_count == 0 {
            return Err(BroadcastError::NoWorkers);
        }
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(BroadcastError::AlreadyRunning);
        }
        let _running = RunningGuard(&self.running);

        let (queue_tx, queue_rx) = mpsc::channel(TASK_QUEUE_CAPACITY);
        let mut workers = spawn_workers(
            worker_count,
            queue_rx,
            delivery_timeout,
            Arc::clone(&self.subscribers.stats),
        );

        tracing::info!(
            workers = worker_count,
            delivery_timeout_ms = delivery_timeout.as_millis() as u64,
            "Broadcast loop started"
        );

        // Completion baton of the latest task per subscriber
        let mut turns: HashMap<SubscriberId, oneshot::Receiver<()>> = HashMap::new();

        'dispatch: while let Some(message) = input.recv().await {
            let value = (self.transform)(message);
            self.subscribers.stats.record_message();

            let targets = self.subscribers.snapshot();
            if turns.len() > targets.len() {
                let live: HashSet<SubscriberId> = targets.iter().map(|t| t.id).collect();
                turns.retain(|id, _| live.contains(id));
            }

            for target in targets {
                let (done, next) = oneshot::channel();
                let after = turns.insert(target.id, next);
                let task = DeliveryTask {
                    value: value.clone(),
                    target,
                    after,
                    done,
                };

                // Blocks until a worker is free
                if queue_tx.send(task).await.is_err() {
                    tracing::error!("Every delivery worker exited, stopping broadcast");
                    break 'dispatch;
                }
            }
        }

        drop(queue_tx);
        drop(turns);

        let mut failure = None;
        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                failure.get_or_insert(e);
            }
        }

        let closed = self.subscribers.close_all();
        tracing::info!(closed_subscribers = closed, "Broadcast loop stopped");

        match failure {
            Some(e) => Err(BroadcastError::WorkerPanicked(e)),
            None => Ok(()),
        }
    }
}

/// Clears the running flag however `run` exits
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
