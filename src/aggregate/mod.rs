//! Streaming aggregation over a subscriber's events
//!
//! Each analysis request gets its own [`AggregationSession`], fed by its own
//! hub subscription for a bounded window. The fold keeps constant memory: a
//! post count, the timestamp range and an incremental mean of one dimension,
//! `avg ← avg + (value − avg) / n`.

pub mod error;
pub mod event;
pub mod session;
pub mod state;

pub use error::AggregationError;
pub use event::{decode_event, Event, SharedEvent};
pub use session::AggregationSession;
pub use state::{AggregationSummary, AggregatorState};
