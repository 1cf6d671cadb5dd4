//! Hub error types
//!
//! Only conditions that stop the fan-out loop itself are errors. A delivery
//! that times out, is cancelled or finds its endpoint closed is a normal
//! per-subscriber drop and is counted in [`HubStats`](crate::stats::HubStats).

use thiserror::Error;

/// Error type for the broadcast loop
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// A worker pool of size zero would never accept a delivery
    #[error("broadcast requires at least one worker")]
    NoWorkers,

    /// Another `run` is already fanning out on this hub
    #[error("broadcast loop already running on this hub")]
    AlreadyRunning,

    /// A delivery worker terminated abnormally
    #[error("delivery worker terminated abnormally: {0}")]
    WorkerPanicked(#[from] tokio::task::JoinError),
}
