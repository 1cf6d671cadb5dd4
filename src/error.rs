//! Error types
//!
//! Each subsystem defines its own error; [`Error`] unifies them for callers
//! that drive the whole pipeline.

use thiserror::Error;

pub use crate::aggregate::AggregationError;
pub use crate::hub::BroadcastError;
pub use crate::ingest::ConnectionError;

/// Result alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Debug, Error)]
pub enum Error {
    /// Upstream connection failure
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Fan-out loop failure
    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    /// Malformed post in an analysis session
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    /// Socket or other I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
