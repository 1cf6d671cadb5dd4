//! Statistics for the fan-out pipeline

pub mod metrics;

pub use metrics::{DeliveryOutcome, HubStats, HubStatsSnapshot};
