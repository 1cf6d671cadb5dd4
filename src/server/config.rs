//! Pipeline configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Default upstream event feed
pub const DEFAULT_FEED_URL: &str = "https://stream.upfluence.co/stream";

/// Pipeline configuration options
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upstream push-event endpoint
    pub feed_url: String,

    /// Address the analysis endpoint binds to
    pub bind_addr: SocketAddr,

    /// Number of delivery workers in the hub
    pub worker_count: usize,

    /// Longest a single delivery may wait for its subscriber
    pub delivery_timeout: Duration,

    /// Delay before reconnecting to the feed after it ends or fails
    pub reconnect_backoff: Duration,

    /// Delay before restarting a failed broadcast loop
    pub restart_delay: Duration,

    /// Capacity of the raw message queue between ingestor and hub
    pub ingest_buffer: usize,

    /// Capacity of each subscriber endpoint
    pub subscriber_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            worker_count: 10_000,
            delivery_timeout: Duration::from_secs(5),
            reconnect_backoff: Duration::from_secs(1),
            restart_delay: Duration::from_secs(1),
            ingest_buffer: 1,
            subscriber_buffer: 1,
        }
    }
}

impl PipelineConfig {
    /// Create a config reading from a custom feed
    pub fn with_feed(url: impl Into<String>) -> Self {
        Self {
            feed_url: url.into(),
            ..Default::default()
        }
    }

    /// Set the feed URL
    pub fn feed_url(mut self, url: impl Into<String>) -> Self {
        self.feed_url = url.into();
        self
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the worker count (at least one)
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    /// Set the per-delivery timeout
    pub fn delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Set the reconnect backoff
    pub fn reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    /// Set the broadcast restart delay
    pub fn restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// Set the raw message queue capacity (at least one)
    pub fn ingest_buffer(mut self, capacity: usize) -> Self {
        self.ingest_buffer = capacity.max(1);
        self
    }

    /// Set the subscriber endpoint capacity (at least one)
    pub fn subscriber_buffer(mut self, capacity: usize) -> Self {
        self.subscriber_buffer = capacity.max(1);
        self
    }
}
