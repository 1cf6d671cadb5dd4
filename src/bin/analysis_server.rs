//! Analysis server
//!
//! Follows the upstream feed, fans its events out to analysis sessions and
//! serves `GET /analysis?duration=<d>&dimension=<name>`.
//!
//! Run with: cargo run --bin analysis-server -- --bind 127.0.0.1:8080
//!
//! Then query:
//!   curl 'http://127.0.0.1:8080/analysis?duration=5s&dimension=likes'

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use sse_fanout::server::{
    parse_duration, AnalysisServer, Pipeline, PipelineConfig, DEFAULT_FEED_URL,
};

#[derive(Parser, Debug)]
#[command(name = "analysis-server")]
#[command(about = "Fan out a server-sent event feed and aggregate it on demand")]
struct Args {
    /// Upstream push-event endpoint
    #[arg(long, env = "SSE_FEED_URL", default_value = DEFAULT_FEED_URL)]
    feed_url: String,

    /// Address for the analysis endpoint
    #[arg(long = "bind", env = "SSE_BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind_addr: SocketAddr,

    /// Delivery workers in the hub
    #[arg(long, env = "SSE_WORKERS", default_value_t = 10_000)]
    workers: usize,

    /// Longest a delivery waits for its subscriber
    #[arg(long, env = "SSE_DELIVERY_TIMEOUT", default_value = "5s", value_parser = parse_duration)]
    delivery_timeout: Duration,

    /// Delay before reconnecting to the feed
    #[arg(long, env = "SSE_RECONNECT_BACKOFF", default_value = "1s", value_parser = parse_duration)]
    reconnect_backoff: Duration,

    /// Delay before restarting a failed broadcast loop
    #[arg(long, env = "SSE_RESTART_DELAY", default_value = "1s", value_parser = parse_duration)]
    restart_delay: Duration,

    /// Capacity of the raw message queue
    #[arg(long, env = "SSE_INGEST_BUFFER", default_value_t = 1)]
    ingest_buffer: usize,

    /// Capacity of each subscriber endpoint
    #[arg(long, env = "SSE_SUBSCRIBER_BUFFER", default_value_t = 1)]
    subscriber_buffer: usize,
}

impl Args {
    fn into_config(self) -> PipelineConfig {
        PipelineConfig::with_feed(self.feed_url)
            .bind(self.bind_addr)
            .worker_count(self.workers)
            .delivery_timeout(self.delivery_timeout)
            .reconnect_backoff(self.reconnect_backoff)
            .restart_delay(self.restart_delay)
            .ingest_buffer(self.ingest_buffer)
            .subscriber_buffer(self.subscriber_buffer)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = args.into_config();
    tracing::info!(
        feed = %config.feed_url,
        workers = config.worker_count,
        timeout_ms = config.delivery_timeout.as_millis() as u64,
        "Starting pipeline"
    );

    let pipeline = Pipeline::new(config);
    let handle = pipeline.spawn();
    let server = AnalysisServer::new(pipeline);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received");
    };

    let result = server.run_until(shutdown).await;
    handle.shutdown().await;

    result.map_err(Into::into)
}
