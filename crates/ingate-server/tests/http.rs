// HTTP surface tests: admission responses, backpressure, probes.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use ingate_pipeline::{Pipeline, PipelineSettings};
use ingate_server::app;
use ingate_sink::FileSink;
use serde_json::{json, Value};
use tower::ServiceExt;

struct Gateway {
    router: Router,
    pipeline: Arc<Pipeline>,
    _dir: tempfile::TempDir,
    primary_path: std::path::PathBuf,
}

fn gateway(queue_capacity: usize, batch_size: usize, max_payload_bytes: usize) -> Gateway {
    let dir = tempfile::tempdir().unwrap();
    let primary_path = dir.path().join("primary.ndjson");
    let primary = Arc::new(FileSink::new(&primary_path));
    let dlq = Arc::new(FileSink::new(dir.path().join("dlq.ndjson")));

    let settings = PipelineSettings {
        queue_capacity,
        batch_size,
        flush_interval: Duration::from_secs(60),
        retry_max_attempts: 1,
        retry_base_delay: Duration::ZERO,
    };
    let pipeline = Arc::new(Pipeline::start(settings, primary, dlq));

    Gateway {
        router: app(Arc::clone(&pipeline), max_payload_bytes),
        pipeline,
        _dir: dir,
        primary_path,
    }
}

async fn post_ingest(router: &Router, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/ingest")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn ingest_accepts_a_list_of_records() {
    let gateway = gateway(100, 100, 1024);

    let body = json!({"payload": [{"a": 1}, {"a": 2}, {"a": 3}]}).to_string();
    let (status, response) = post_ingest(&gateway.router, body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["accepted_count"], json!(3));
}

#[tokio::test]
async fn ingest_normalizes_a_single_object() {
    let gateway = gateway(100, 100, 1024);

    let body = json!({"payload": {"event": "login"}}).to_string();
    let (status, response) = post_ingest(&gateway.router, body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["accepted_count"], json!(1));
}

#[tokio::test]
async fn empty_payload_is_rejected() {
    let gateway = gateway(100, 100, 1024);

    let (status, _) = post_ingest(&gateway.router, json!({"payload": []}).to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    let gateway = gateway(100, 100, 1024);

    let (status, _) = post_ingest(&gateway.router, "not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // payload must be an object or a list of objects
    let (status, _) = post_ingest(&gateway.router, json!({"payload": [1, 2]}).to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // missing payload field
    let (status, _) = post_ingest(&gateway.router, json!({"records": []}).to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_payload_is_rejected() {
    let gateway = gateway(100, 100, 32);

    let body = json!({"payload": [{"filler": "x".repeat(100)}]}).to_string();
    let (status, _) = post_ingest(&gateway.router, body).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn full_queue_returns_backpressure() {
    let gateway = gateway(1, 100, 1024);

    let body = json!({"payload": [{"a": 1}, {"a": 2}]}).to_string();
    let (status, response) = post_ingest(&gateway.router, body).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(response["error"].as_str().unwrap().contains("queue full"));
    assert_eq!(gateway.pipeline.queue_depth(), 0);
}

#[tokio::test]
async fn health_and_ready_probes() {
    let gateway = gateway(100, 100, 1024);

    let (status, response) = get(&gateway.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], json!("healthy"));

    let (status, response) = get(&gateway.router, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], json!("ready"));
    assert!(response["queue_depth"].is_number());
}

#[tokio::test]
async fn admitted_records_reach_the_primary_sink() {
    let gateway = gateway(100, 1, 1024);

    let body = json!({"payload": [{"n": 1}, {"n": 2}]}).to_string();
    let (status, _) = post_ingest(&gateway.router, body).await;
    assert_eq!(status, StatusCode::OK);

    // batch size 1: each record flushes as soon as the worker takes it.
    for _ in 0..200 {
        let lines = std::fs::read_to_string(&gateway.primary_path)
            .map(|c| c.lines().count())
            .unwrap_or(0);
        if lines == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let contents = std::fs::read_to_string(&gateway.primary_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines, vec!["{\"n\":1}", "{\"n\":2}"]);

    gateway.pipeline.shutdown().await.unwrap();
}
