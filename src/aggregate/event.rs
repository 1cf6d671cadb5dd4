//! Event decoding
//!
//! Upstream payloads are JSON envelopes of the form `{"<kind>": {...post...}}`.
//! Decoding happens once per message in the hub, before fan-out.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::{Map, Value};

/// A decoded envelope: the top-level JSON object
pub type Event = Map<String, Value>;

/// An event shared between every subscriber that receives it
pub type SharedEvent = Arc<Event>;

/// Decode a raw `data:` payload into an event
///
/// Anything that is not exactly one JSON object (trailing bytes and numbers
/// outside `f64` range included) is logged and replaced by an empty object,
/// which every session treats as a heartbeat.
pub fn decode_event(payload: Bytes) -> SharedEvent {
    match serde_json::from_slice::<Event>(&payload) {
        Ok(event) => Arc::new(event),
        Err(e) => {
            tracing::warn!(
                error = %e,
                payload = %String::from_utf8_lossy(&payload),
                "Error parsing json event"
            );
            Arc::new(Event::new())
        }
    }
}
