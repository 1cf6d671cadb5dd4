//! Aggregation error types

use thiserror::Error;

/// A post that cannot be folded into the summary
///
/// Fatal to the session that saw it; other sessions and the hub are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    /// The envelope must carry exactly one post
    #[error("could not parse post: envelope has {0} top-level keys")]
    MultipleKeys(usize),

    /// The envelope's single value is not a keyed record
    #[error("could not parse post: payload is not an object")]
    NotARecord,

    /// The post has no `timestamp`
    #[error("could not read timestamp")]
    MissingTimestamp,

    /// The post's `timestamp` is not an integer
    #[error("could not parse timestamp")]
    InvalidTimestamp,

    /// The configured dimension is present but not numeric
    #[error("could not parse dimension `{0}`")]
    InvalidDimension(String),
}
