//! Upstream event-stream ingestion
//!
//! [`StreamIngestor::listen`] holds one streaming HTTP connection open and
//! writes each `data:` payload, as raw bytes, onto an output queue:
//!
//! ```text
//!   GET feed ──► bytes_stream() ──► LineFramer ──► data_payload() ──► mpsc<Bytes>
//! ```
//!
//! Each received chunk is copied once into the framer's buffer. Lines and
//! payloads are then split off that buffer as `Bytes` without further copies.

pub mod client;
pub mod error;
pub mod frame;

pub use client::{forward_data_lines, StreamIngestor};
pub use error::ConnectionError;
pub use frame::{data_payload, LineFramer};
