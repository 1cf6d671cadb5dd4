//! Ingestion error types

use thiserror::Error;

/// Transport-level failure of the event stream
///
/// Never fatal: the driver waits out its backoff and calls `listen` again.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The request could not be sent or the connection was refused
    #[error("failed to open event stream: {0}")]
    Request(#[source] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("event stream responded with status {0}")]
    Status(reqwest::StatusCode),

    /// Reading the response body failed mid-stream
    #[error("event stream read failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Nobody is consuming the raw message queue any more
    #[error("raw message queue closed")]
    OutputClosed,
}
