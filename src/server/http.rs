//! Analysis HTTP endpoint
//!
//! `GET /analysis?duration=5s&dimension=likes` subscribes to the hub, folds
//! events for `duration` and answers with the summary as JSON.

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::{Query, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use thiserror::Error;
use tokio::net::TcpListener;

use super::duration::{parse_duration, DurationParseError};
use super::pipeline::Pipeline;
use crate::aggregate::AggregationError;
use crate::error::Result;

/// Query string of an analysis request
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisParams {
    pub duration: Option<String>,
    pub dimension: Option<String>,
}

/// Reasons an analysis request fails
#[derive(Debug, Error)]
pub enum AnalysisRequestError {
    #[error("missing query parameter `{0}`")]
    MissingParam(&'static str),

    #[error(transparent)]
    InvalidDuration(#[from] DurationParseError),

    #[error("aggregation failed: {0}")]
    Aggregation(#[from] AggregationError),
}

impl AnalysisRequestError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingParam(_) | Self::InvalidDuration(_) => StatusCode::BAD_REQUEST,
            Self::Aggregation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AnalysisRequestError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

fn required<'a>(
    value: &'a Option<String>,
    name: &'static str,
) -> std::result::Result<&'a str, AnalysisRequestError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AnalysisRequestError::MissingParam(name)),
    }
}

async fn analysis(
    State(pipeline): State<Pipeline>,
    Query(params): Query<AnalysisParams>,
) -> std::result::Result<Response, AnalysisRequestError> {
    let duration = required(&params.duration, "duration")?;
    let dimension = required(&params.dimension, "dimension")?;
    let window = parse_duration(duration)?;

    tracing::debug!(
        dimension = dimension,
        window_ms = window.as_millis() as u64,
        "Analysis requested"
    );

    let summary = pipeline.analyze(dimension, window).await.map_err(|e| {
        tracing::error!(dimension = dimension, error = %e, "Analysis failed");
        AnalysisRequestError::from(e)
    })?;

    Ok(([(CACHE_CONTROL, "no-cache")], Json(summary)).into_response())
}

/// Build the router for the analysis endpoint
pub fn router(pipeline: Pipeline) -> Router {
    Router::new()
        .route("/analysis", get(analysis))
        .with_state(pipeline)
}

/// HTTP front end over a [`Pipeline`]
pub struct AnalysisServer {
    pipeline: Pipeline,
}

impl AnalysisServer {
    /// Create a server answering from `pipeline`
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.pipeline.config().bind_addr
    }

    /// Serve on the configured address until the process ends
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve on the configured address until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.bind_addr()).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// Requests in flight are allowed to finish their window.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Analysis server listening");

        axum::serve(listener, router(self.pipeline.clone()))
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!(addr = %addr, "Analysis server stopped");
        Ok(())
    }
}
