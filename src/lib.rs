//! Server-sent event fan-out and windowed aggregation
//!
//! Three stages connected by bounded queues:
//!
//! ```text
//!   upstream feed ──► StreamIngestor ──► raw queue ──► BroadcastHub ──┬──► Subscription ──► AggregationSession
//!                                                                    ├──► Subscription ──► ...
//!                                                                    └──► ...
//! ```
//!
//! - [`ingest`] reads the `data:` lines of a push-event stream.
//! - [`hub`] decodes each message once and delivers it to every registered
//!   subscriber through a bounded worker pool, giving up on a delivery after
//!   a fixed timeout.
//! - [`aggregate`] folds one subscriber's events into a summary over a time
//!   window.
//! - [`server`] wires the stages together and serves `GET /analysis`.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use sse_fanout::server::{Pipeline, PipelineConfig};
//!
//! # async fn example() -> sse_fanout::error::Result<()> {
//! let pipeline = Pipeline::new(PipelineConfig::default());
//! let handle = pipeline.spawn();
//!
//! let summary = pipeline.analyze("likes", Duration::from_secs(5)).await?;
//! println!("{} posts", summary.total_posts);
//!
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod error;
pub mod hub;
pub mod ingest;
pub mod server;
pub mod stats;

pub use aggregate::{AggregationSession, AggregationSummary, AggregatorState};
pub use error::{Error, Result};
pub use hub::{BroadcastHub, Subscription};
pub use ingest::StreamIngestor;
pub use server::{AnalysisServer, Pipeline, PipelineConfig};
