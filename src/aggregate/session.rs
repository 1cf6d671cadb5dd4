//! Windowed aggregation session
//!
//! A session owns one hub subscription and folds whatever arrives on it into
//! an [`AggregatorState`] until its observation window closes.

use std::time::Duration;

use tokio::time::Instant;

use super::error::AggregationError;
use super::event::SharedEvent;
use super::state::{AggregationSummary, AggregatorState};
use crate::hub::Subscription;

/// Deadline used when the window does not fit the clock
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// One analysis request bound to one subscriber endpoint
#[derive(Debug)]
pub struct AggregationSession {
    subscription: Subscription<SharedEvent>,
    state: AggregatorState,
}

impl AggregationSession {
    /// Start a session over `subscription`, averaging `dimension`
    pub fn new(subscription: Subscription<SharedEvent>, dimension: impl Into<String>) -> Self {
        Self {
            subscription,
            state: AggregatorState::new(dimension),
        }
    }

    /// Current state of the fold
    pub fn state(&self) -> &AggregatorState {
        &self.state
    }

    /// Aggregate events until `window` elapses
    ///
    /// The first malformed post aborts the session. If the hub closes the
    /// subscription before the window ends, the session finishes early with
    /// what it has seen. The subscription is released on return.
    pub async fn run(mut self, window: Duration) -> Result<AggregationSummary, AggregationError> {
        let started = Instant::now();
        let deadline = started
            .checked_add(window)
            .unwrap_or_else(|| started + FAR_FUTURE);
        let deadline = tokio::time::sleep_until(deadline);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                _ = &mut deadline => break,
                event = self.subscription.recv() => {
                    let Some(event) = event else {
                        tracing::debug!(
                            subscriber = %self.subscription.id(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Event stream ended before window closed"
                        );
                        break;
                    };

                    if let Err(e) = self.state.aggregate(&event) {
                        tracing::warn!(
                            subscriber = %self.subscription.id(),
                            error = %e,
                            event = ?event,
                            "Aggregation failed"
                        );
                        return Err(e);
                    }
                }
            }
        }

        tracing::debug!(
            subscriber = %self.subscription.id(),
            total_posts = self.state.total_posts,
            dimension = %self.state.dimension,
            "Aggregation window closed"
        );

        Ok(self.state.finalize())
    }
}
