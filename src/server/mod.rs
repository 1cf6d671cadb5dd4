//! Pipeline driver and analysis front end
//!
//! [`Pipeline`] owns the ingestor and the hub and keeps their loops running;
//! [`AnalysisServer`] exposes one aggregation session per HTTP request.

pub mod config;
pub mod duration;
pub mod http;
pub mod pipeline;

pub use config::{PipelineConfig, DEFAULT_FEED_URL};
pub use duration::{parse_duration, DurationParseError};
pub use http::{router, AnalysisParams, AnalysisRequestError, AnalysisServer};
pub use pipeline::{EventHub, Pipeline, PipelineHandle};
