//! Feed → hub → aggregation, through the pipeline and the HTTP endpoint

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::routing::get;
use axum::Router;
use sse_fanout::server::{AnalysisServer, Pipeline, PipelineConfig};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

// Every post has 4 likes so partial replays still average to 4
const FEED: &str = "event: post\ndata: {\"pin\":{\"timestamp\":10,\"likes\":4}}\n\n\
                    event: post\ndata: {\"tweet\":{\"timestamp\":30,\"likes\":4}}\n\n\
                    event: post\ndata: {\"pin\":{\"timestamp\":20}}\n\n\
                    event: post\ndata: {\"instagram_media\":{\"timestamp\":15,\"likes\":4}}\n\n";

async fn spawn_feed_server() -> SocketAddr {
    let app = Router::new().route(
        "/stream",
        get(|| async { ([(CONTENT_TYPE, "text/event-stream")], FEED) }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn config(feed: SocketAddr) -> PipelineConfig {
    PipelineConfig::with_feed(format!("http://{feed}/stream"))
        .worker_count(8)
        .delivery_timeout(Duration::from_secs(1))
        .reconnect_backoff(Duration::from_millis(20))
}

#[tokio::test]
async fn test_pipeline_analyze_over_replayed_feed() {
    let feed = spawn_feed_server().await;
    let pipeline = Pipeline::new(config(feed));
    let handle = pipeline.spawn();

    let summary = pipeline
        .analyze("likes", Duration::from_millis(500))
        .await
        .unwrap();

    assert!(summary.total_posts > 0);
    assert!(summary.minimum_timestamp >= 10);
    assert!(summary.maximum_timestamp <= 30);
    assert!(summary.minimum_timestamp <= summary.maximum_timestamp);
    assert_eq!(summary.average, 4.0);
    assert_eq!(pipeline.hub().subscriber_count(), 0);

    let stats = pipeline.hub().stats();
    assert!(stats.messages >= summary.total_posts);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_sessions_see_same_feed() {
    let feed = spawn_feed_server().await;
    let pipeline = Pipeline::new(config(feed));
    let handle = pipeline.spawn();

    let (likes, comments) = tokio::join!(
        pipeline.analyze("likes", Duration::from_millis(400)),
        pipeline.analyze("comments", Duration::from_millis(400)),
    );
    let likes = likes.unwrap();
    let comments = comments.unwrap();

    assert!(likes.total_posts > 0);
    assert!(comments.total_posts > 0);
    assert_eq!(likes.average, 4.0);
    assert_eq!(comments.average, 0.0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_analysis_endpoint() {
    let feed = spawn_feed_server().await;
    let pipeline = Pipeline::new(config(feed));
    let handle = pipeline.spawn();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        AnalysisServer::new(pipeline)
            .serve(listener, async move {
                let _ = stop_rx.await;
            })
            .await
    });

    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{addr}/analysis?duration=300ms&dimension=likes"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(resp.headers()["cache-control"], "no-cache");
    assert_eq!(resp.headers()["content-type"], "application/json");

    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["total_posts"].as_u64().unwrap() > 0);
    assert_eq!(body["avg_likes"], 4.0);
    assert!(body.get("minimum_timestamp").is_some());
    assert!(body.get("maximum_timestamp").is_some());

    let resp = client
        .get(format!("http://{addr}/analysis?dimension=likes"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

    let resp = client
        .get(format!("http://{addr}/analysis?duration=often&dimension=likes"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

    drop(client);
    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
    handle.shutdown().await;
}
