//! Pipeline driver
//!
//! Wires the ingestor's output into the hub's input and keeps both alive:
//! the ingestor is reconnected after a fixed backoff whenever its connection
//! ends, and the broadcast loop is restarted after a fixed delay if it fails.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::config::PipelineConfig;
use crate::aggregate::{
    decode_event, AggregationError, AggregationSession, AggregationSummary, SharedEvent,
};
use crate::hub::BroadcastHub;
use crate::ingest::{ConnectionError, StreamIngestor};

/// Hub carrying decoded events
pub type EventHub = BroadcastHub<Bytes, SharedEvent>;

/// Ingestor, hub and their configuration
#[derive(Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    hub: EventHub,
    ingestor: StreamIngestor,
}

impl Pipeline {
    /// Build a pipeline reading from `config.feed_url`
    pub fn new(config: PipelineConfig) -> Self {
        let ingestor = StreamIngestor::new(config.feed_url.clone());
        let hub = BroadcastHub::with_subscriber_buffer(decode_event, config.subscriber_buffer);

        Self {
            config,
            hub,
            ingestor,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get the event hub
    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    /// Spawn the ingestion and broadcast loops
    pub fn spawn(&self) -> PipelineHandle {
        let (tx, rx) = mpsc::channel(self.config.ingest_buffer);

        let ingest = tokio::spawn(supervise_ingest(
            self.ingestor.clone(),
            tx,
            self.config.reconnect_backoff,
        ));
        let broadcast = tokio::spawn(supervise_broadcast(
            self.hub.clone(),
            rx,
            self.config.worker_count,
            self.config.delivery_timeout,
            self.config.restart_delay,
        ));

        PipelineHandle { ingest, broadcast }
    }

    /// Run one analysis over the next `window` of events
    pub async fn analyze(
        &self,
        dimension: &str,
        window: Duration,
    ) -> Result<AggregationSummary, AggregationError> {
        AggregationSession::new(self.hub.register(), dimension)
            .run(window)
            .await
    }
}

/// Handles to the running pipeline loops
#[derive(Debug)]
pub struct PipelineHandle {
    ingest: JoinHandle<()>,
    broadcast: JoinHandle<()>,
}

impl PipelineHandle {
    /// Stop ingesting and let the hub drain and close every subscriber
    pub async fn shutdown(self) {
        self.ingest.abort();
        let _ = self.ingest.await;

        // With the ingest side gone the hub's input is closed
        let _ = self.broadcast.await;
        tracing::info!("Pipeline stopped");
    }

    /// Check whether both loops have exited
    pub fn is_finished(&self) -> bool {
        self.ingest.is_finished() && self.broadcast.is_finished()
    }
}

async fn supervise_ingest(ingestor: StreamIngestor, out: mpsc::Sender<Bytes>, backoff: Duration) {
    loop {
        match ingestor.listen(&out).await {
            Ok(()) => {
                tracing::warn!(url = %ingestor.url(), "Connection to event stream closed");
            }
            Err(ConnectionError::OutputClosed) => {
                tracing::info!("Raw message queue closed, stopping ingestion");
                return;
            }
            Err(e) => {
                tracing::error!(
                    url = %ingestor.url(),
                    error = %e,
                    "Event stream connection failed"
                );
            }
        }

        tokio::time::sleep(backoff).await;
    }
}

async fn supervise_broadcast(
    hub: EventHub,
    mut input: mpsc::Receiver<Bytes>,
    workers: usize,
    delivery_timeout: Duration,
    restart_delay: Duration,
) {
    loop {
        match hub.run(&mut input, workers, delivery_timeout).await {
            Ok(()) => {
                tracing::info!("Raw message queue closed, stopping broadcast");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Broadcast loop failed");
            }
        }

        tokio::time::sleep(restart_delay).await;
    }
}
