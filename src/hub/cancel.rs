//! One-shot cancellation signal
//!
//! Each subscriber owns exactly one signal. It is created at registration and
//! fired at most once, when the subscriber is removed. Workers holding a
//! delivery for that subscriber race against it.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Idempotent, signal-once cancellation flag
#[derive(Debug, Default)]
pub struct CancelSignal {
    fired: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    /// Create an unfired signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal, waking every waiter
    ///
    /// Returns `true` only for the call that actually fired it.
    pub fn cancel(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.notify.notify_waiters();
        true
    }

    /// Check whether the signal has fired
    pub fn is_cancelled(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Wait until the signal fires
    ///
    /// Completes immediately if it already has.
    pub async fn cancelled(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);

        // Register interest before checking the flag so a concurrent
        // cancel() cannot slip between the check and the wait.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_test::task;
    use tokio_test::{assert_pending, assert_ready};

    use super::*;

    #[test]
    fn test_cancel_fires_once() {
        let signal = CancelSignal::new();
        assert!(!signal.is_cancelled());

        assert!(signal.cancel());
        assert!(signal.is_cancelled());

        // Second cancel is a no-op
        assert!(!signal.cancel());
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_cancelled_wakes_waiter() {
        let signal = CancelSignal::new();
        let mut waiter = task::spawn(signal.cancelled());

        assert_pending!(waiter.poll());

        signal.cancel();
        assert!(waiter.is_woken());
        assert_ready!(waiter.poll());
    }

    #[test]
    fn test_cancelled_after_fire_is_ready() {
        let signal = CancelSignal::new();
        signal.cancel();

        let mut waiter = task::spawn(signal.cancelled());
        assert_ready!(waiter.poll());
    }

    #[tokio::test]
    async fn test_cancel_from_other_task() {
        let signal = Arc::new(CancelSignal::new());

        let waiter = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.cancelled().await })
        };

        tokio::task::yield_now().await;
        signal.cancel();

        waiter.await.unwrap();
    }
}
