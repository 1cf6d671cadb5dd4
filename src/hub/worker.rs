//! Delivery worker pool
//!
//! Workers pull delivery tasks from a shared queue of capacity one, so the
//! dispatch loop only advances once some worker has taken the previous task.
//! Each task races a fresh timeout, the subscriber's cancel signal and the
//! subscriber's endpoint; exactly one of the three resolves it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinSet;

use super::subscriber::DeliveryTarget;
use crate::stats::{DeliveryOutcome, HubStats};

/// One value bound for one subscriber
pub(super) struct DeliveryTask<T> {
    pub value: T,
    pub target: DeliveryTarget<T>,
    /// Resolves once the previous delivery to the same subscriber has resolved
    pub after: Option<oneshot::Receiver<()>>,
    /// Dropped once this delivery and every earlier one to the subscriber resolved
    pub done: oneshot::Sender<()>,
}

/// Spawn `count` workers draining `queue`
///
/// Workers exit when the sending half of the queue is dropped and the queue is empty.
pub(super) fn spawn_workers<T>(
    count: usize,
    queue: mpsc::Receiver<DeliveryTask<T>>,
    timeout: Duration,
    stats: Arc<HubStats>,
) -> JoinSet<()>
where
    T: Send + 'static,
{
    let queue = Arc::new(Mutex::new(queue));
    let mut workers = JoinSet::new();

    for _ in 0..count {
        let queue = Arc::clone(&queue);
        let stats = Arc::clone(&stats);
        workers.spawn(async move {
            loop {
                let task = queue.lock().await.recv().await;
                let Some(task) = task else {
                    break;
                };
                let outcome = deliver(task, timeout).await;
                stats.record_outcome(outcome);
            }
        });
    }

    workers
}

/// Resolve a single delivery task
async fn deliver<T>(task: DeliveryTask<T>, timeout: Duration) -> DeliveryOutcome {
    let DeliveryTask {
        value,
        target,
        mut after,
        done,
    } = task;

    let outcome = tokio::select! {
        _ = tokio::time::sleep(timeout) => DeliveryOutcome::TimedOut,
        _ = target.cancel.cancelled() => DeliveryOutcome::Cancelled,
        sent = send_in_turn(&mut after, &target.tx, value) => {
            if sent {
                DeliveryOutcome::Delivered
            } else {
                DeliveryOutcome::Closed
            }
        }
    };

    // A later message must not overtake an earlier one still in flight, so
    // the turn passes on only after the predecessor is settled too.
    if let Some(prev) = after {
        let _ = prev.await;
    }
    drop(done);

    tracing::trace!(subscriber = %target.id, outcome = ?outcome, "Delivery resolved");
    outcome
}

/// Wait for the predecessor, then offer the value to the endpoint
///
/// Returns `false` if the subscriber dropped its receiver.
async fn send_in_turn<T>(
    after: &mut Option<oneshot::Receiver<()>>,
    tx: &mpsc::Sender<T>,
    value: T,
) -> bool {
    if let Some(prev) = after.as_mut() {
        let _ = prev.await;
        *after = None;
    }
    tx.send(value).await.is_ok()
}
