//! Aggregator state
//!
//! A constant-size fold over a stream of posts: count, timestamp range and a
//! running mean of one numeric dimension.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use super::error::AggregationError;
use super::event::Event;

/// Field every post must carry
const TIMESTAMP_FIELD: &str = "timestamp";

/// Running aggregation over the posts of one session
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorState {
    /// Posts seen, whether or not they carried the dimension
    pub total_posts: u64,

    /// Smallest timestamp seen (`i64::MAX` until the first post)
    pub min_timestamp: i64,

    /// Largest timestamp seen (`i64::MIN` until the first post)
    pub max_timestamp: i64,

    /// Name of the field being averaged
    pub dimension: String,

    /// Running mean of the dimension
    pub dimension_avg: f64,

    /// Posts that contributed to `dimension_avg`
    pub dimension_count: u64,
}

impl AggregatorState {
    /// Create the initial state for `dimension`
    pub fn new(dimension: impl Into<String>) -> Self {
        Self {
            total_posts: 0,
            min_timestamp: i64::MAX,
            max_timestamp: i64::MIN,
            dimension: dimension.into(),
            dimension_avg: 0.0,
            dimension_count: 0,
        }
    }

    /// Fold one event into the state
    ///
    /// An empty envelope is a heartbeat and changes nothing. A post without
    /// the dimension, or with the dimension set to `null`, still counts
    /// toward `total_posts` and the timestamp range.
    pub fn aggregate(&mut self, event: &Event) -> Result<(), AggregationError> {
        let mut values = event.values();
        let post = match (values.next(), event.len()) {
            (None, _) => return Ok(()),
            (Some(post), 1) => post,
            (Some(_), n) => return Err(AggregationError::MultipleKeys(n)),
        };
        let Value::Object(post) = post else {
            return Err(AggregationError::NotARecord);
        };

        self.total_posts += 1;

        let timestamp = match post.get(TIMESTAMP_FIELD) {
            None | Some(Value::Null) => return Err(AggregationError::MissingTimestamp),
            Some(Value::Number(n)) => n.as_i64().ok_or(AggregationError::InvalidTimestamp)?,
            Some(_) => return Err(AggregationError::InvalidTimestamp),
        };
        self.min_timestamp = self.min_timestamp.min(timestamp);
        self.max_timestamp = self.max_timestamp.max(timestamp);

        let value = match post.get(&self.dimension) {
            None | Some(Value::Null) => return Ok(()),
            Some(Value::Number(n)) => n.as_f64(),
            Some(_) => None,
        };
        let value =
            value.ok_or_else(|| AggregationError::InvalidDimension(self.dimension.clone()))?;

        self.dimension_count += 1;
        self.dimension_avg += (value - self.dimension_avg) / self.dimension_count as f64;

        Ok(())
    }

    /// Close the window and produce the reported summary
    pub fn finalize(self) -> AggregationSummary {
        let (minimum_timestamp, maximum_timestamp) = if self.total_posts == 0 {
            (0, 0)
        } else {
            (self.min_timestamp, self.max_timestamp)
        };

        AggregationSummary {
            total_posts: self.total_posts,
            minimum_timestamp,
            maximum_timestamp,
            dimension: self.dimension,
            average: self.dimension_avg,
        }
    }
}

/// Final result of one analysis window
///
/// Serializes as
/// `{"total_posts", "minimum_timestamp", "maximum_timestamp", "avg_<dimension>"}`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSummary {
    pub total_posts: u64,
    pub minimum_timestamp: i64,
    pub maximum_timestamp: i64,
    pub dimension: String,
    pub average: f64,
}

impl AggregationSummary {
    /// Name of the average field in the serialized form
    pub fn average_key(&self) -> String {
        format!("avg_{}", self.dimension)
    }
}

impl Serialize for AggregationSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("total_posts", &self.total_posts)?;
        map.serialize_entry("minimum_timestamp", &self.minimum_timestamp)?;
        map.serialize_entry("maximum_timestamp", &self.maximum_timestamp)?;
        map.serialize_entry(&self.average_key(), &self.average)?;
        map.end()
    }
}
