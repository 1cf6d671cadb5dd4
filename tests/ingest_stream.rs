//! Ingestor against a local push-event server

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use futures_util::stream;
use sse_fanout::ingest::{ConnectionError, StreamIngestor};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const FEED: &str = "event: post\nid: 1\ndata: {\"pin\":{\"timestamp\":1}}\n\n\
                    : keep-alive\n\n\
                    event: post\nid: 2\ndata: {\"tweet\":{\"timestamp\":2}}\n\n\
                    data:{\"pin\":{\"timestamp\":3}}\n\n";

async fn feed(headers: HeaderMap) -> impl IntoResponse {
    if headers.get(ACCEPT).map(|v| v.as_bytes()) != Some(b"text/event-stream".as_slice())
        || headers.get(CACHE_CONTROL).map(|v| v.as_bytes()) != Some(b"no-cache".as_slice())
    {
        return StatusCode::BAD_REQUEST.into_response();
    }
    ([(CONTENT_TYPE, "text/event-stream")], FEED).into_response()
}

async fn chunked_feed() -> impl IntoResponse {
    let parts: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"id: 7\nda")),
        Ok(Bytes::from_static(b"ta: {\"pin\":{\"timest")),
        Ok(Bytes::from_static(b"amp\":7}}\n\ndata: tail")),
    ];
    (
        [(CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(stream::iter(parts)),
    )
}

async fn spawn_feed_server() -> SocketAddr {
    let app = Router::new()
        .route("/stream", get(feed))
        .route("/chunked", get(chunked_feed));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn drain(mut rx: mpsc::Receiver<Bytes>) -> Vec<Bytes> {
    let mut out = Vec::new();
    while let Some(b) = rx.recv().await {
        out.push(b);
    }
    out
}

#[tokio::test]
async fn test_listen_forwards_data_lines() {
    let addr = spawn_feed_server().await;
    let ingestor = StreamIngestor::new(format!("http://{addr}/stream"));

    let (tx, rx) = mpsc::channel(16);
    ingestor.listen(&tx).await.unwrap();
    drop(tx);

    assert_eq!(
        drain(rx).await,
        vec![
            r#"{"pin":{"timestamp":1}}"#,
            r#"{"tweet":{"timestamp":2}}"#,
            r#"{"pin":{"timestamp":3}}"#,
        ]
    );
}

#[tokio::test]
async fn test_listen_reassembles_chunked_body() {
    let addr = spawn_feed_server().await;
    let ingestor = StreamIngestor::new(format!("http://{addr}/chunked"));

    let (tx, rx) = mpsc::channel(16);
    ingestor.listen(&tx).await.unwrap();
    drop(tx);

    assert_eq!(drain(rx).await, vec![r#"{"pin":{"timestamp":7}}"#, "tail"]);
}

#[tokio::test]
async fn test_listen_can_be_called_again() {
    let addr = spawn_feed_server().await;
    let ingestor = StreamIngestor::new(format!("http://{addr}/stream"));

    let (tx, rx) = mpsc::channel(16);
    ingestor.listen(&tx).await.unwrap();
    ingestor.listen(&tx).await.unwrap();
    drop(tx);

    assert_eq!(drain(rx).await.len(), 6);
}

#[tokio::test]
async fn test_listen_rejects_error_status() {
    let addr = spawn_feed_server().await;
    let ingestor = StreamIngestor::new(format!("http://{addr}/missing"));

    let (tx, _rx) = mpsc::channel(1);
    let result = ingestor.listen(&tx).await;

    assert!(matches!(
        result,
        Err(ConnectionError::Status(status)) if status == reqwest::StatusCode::NOT_FOUND
    ));
}
