//! Broadcast hub for fan-out to many subscribers
//!
//! The hub consumes a single input queue, applies a transform once per
//! message, and replicates the result to every registered subscriber through
//! a bounded worker pool. A subscriber that stops reading only loses its own
//! messages: each delivery has its own timeout.
//!
//! # Architecture
//!
//! ```text
//!   input queue ──► run() ──transform──► snapshot(subscribers)
//!                                             │
//!                      ┌──────────────────────┼──────────────────────┐
//!                      ▼                      ▼                      ▼
//!               DeliveryTask           DeliveryTask           DeliveryTask
//!                      └───────► task queue (capacity 1) ◄───────────┘
//!                                             │
//!                     ┌───────────────────────┼───────────────────────┐
//!                     ▼                       ▼                       ▼
//!                 [worker]                [worker]                [worker]
//!          select { timeout | cancelled | endpoint.send(value) }
//!                     │                       │                       │
//!                     ▼                       ▼                       ▼
//!              Subscription::recv      Subscription::recv      Subscription::recv
//! ```
//!
//! # Ordering
//!
//! Deliveries to one subscriber complete in input order. Each task carries a
//! completion baton from the previous task for the same subscriber, and only
//! offers its value once that baton is released. Nothing is ordered across
//! subscribers.

pub mod cancel;
pub mod error;
pub mod store;
pub mod subscriber;
mod worker;

pub use cancel::CancelSignal;
pub use error::BroadcastError;
pub use store::{BroadcastHub, DEFAULT_SUBSCRIBER_BUFFER};
pub use subscriber::{SubscriberId, Subscription};
