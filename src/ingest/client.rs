//! Push-event stream client
//!
//! Opens one long-lived GET to the upstream feed and forwards every `data:`
//! payload onto the raw message queue. `listen` returns when the connection
//! ends either way; reconnecting is the caller's job.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONNECTION};
use tokio::sync::mpsc;

use super::error::ConnectionError;
use super::frame::{data_payload, LineFramer};

/// Client for a single upstream event stream
#[derive(Debug, Clone)]
pub struct StreamIngestor {
    client: reqwest::Client,
    url: String,
}

impl StreamIngestor {
    /// Create an ingestor for `url` with a default HTTP client
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Create an ingestor using an existing HTTP client
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Upstream URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect and forward payloads until the stream ends
    ///
    /// Returns `Ok(())` when the server closes the stream cleanly. The output
    /// queue is never closed by this method, so it can be reused for the
    /// next connection.
    pub async fn listen(&self, out: &mpsc::Sender<Bytes>) -> Result<(), ConnectionError> {
        let response = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, "no-cache")
            .header(ACCEPT, "text/event-stream")
            .header(CONNECTION, "keep-alive")
            .send()
            .await
            .map_err(ConnectionError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectionError::Status(status));
        }

        tracing::info!(url = %self.url, "Connected to event stream");

        forward_data_lines(response.bytes_stream(), out).await
    }
}

/// Forward the `data:` payloads of a chunked body, in order
///
/// Lines split across chunks are reassembled, and an unterminated last line
/// is still honoured when the body ends.
pub async fn forward_data_lines<S, E>(
    body: S,
    out: &mpsc::Sender<Bytes>,
) -> Result<(), ConnectionError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    futures_util::pin_mut!(body);

    let mut framer = LineFramer::new();
    let mut forwarded: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| ConnectionError::Transport(Box::new(e)))?;
        framer.push(&chunk);

        while let Some(line) = framer.next_line() {
            if forward_line(&line, out).await? {
                forwarded += 1;
            }
        }
    }

    if let Some(line) = framer.finish() {
        if forward_line(&line, out).await? {
            forwarded += 1;
        }
    }

    tracing::debug!(forwarded = forwarded, "Event stream ended");
    Ok(())
}

async fn forward_line(line: &Bytes, out: &mpsc::Sender<Bytes>) -> Result<bool, ConnectionError> {
    let Some(payload) = data_payload(line) else {
        return Ok(false);
    };
    out.send(payload)
        .await
        .map_err(|_| ConnectionError::OutputClosed)?;
    Ok(true)
}
