// ingate-server - HTTP surface for the ingestion pipeline
//
// Axum server exposing record admission plus health and readiness probes.
// Producers see exactly two failure shapes: a 4xx rejection of the payload
// itself and 429 backpressure when the queue is full. Delivery failures
// never surface here; they are the pipeline's business.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ingate_config::GatewayConfig;
use ingate_core::QueueFullError;
use ingate_pipeline::{Pipeline, PipelineSettings};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

mod handlers;
mod init;

use handlers::{handle_ingest, health_check, ready_check};
use init::{build_dlq_sink, build_sink, init_tracing};

/// Per-request view of the gateway: the running pipeline plus the one
/// admission limit enforced at the HTTP edge.
#[derive(Clone)]
pub(crate) struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub max_payload_bytes: usize,
}

/// A request the gateway turned away, paired with the status that tells the
/// producer what to do about it. Renders as an `{"error": ...}` JSON body.
pub(crate) struct ApiError {
    status: StatusCode,
    cause: anyhow::Error,
}

impl ApiError {
    pub fn reject(status: StatusCode, cause: anyhow::Error) -> Self {
        Self { status, cause }
    }

    pub fn bad_request(cause: anyhow::Error) -> Self {
        Self::reject(StatusCode::BAD_REQUEST, cause)
    }

    /// The one failure producers are expected to retry: the queue is full.
    pub fn backpressure(cause: QueueFullError) -> Self {
        Self::reject(StatusCode::TOO_MANY_REQUESTS, cause.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Producer mistakes and backpressure are routine; only 5xx means
        // something is wrong on our side.
        if self.status.is_server_error() {
            error!(status = %self.status, "request failed: {:#}", self.cause);
        } else {
            warn!(status = %self.status, "request turned away: {:#}", self.cause);
        }
        (
            self.status,
            Json(json!({
                "error": self.cause.to_string(),
            })),
        )
            .into_response()
    }
}

/// Build the router for a running pipeline. Public so tests and embedders
/// can serve the same surface without binding a socket.
pub fn app(pipeline: Arc<Pipeline>, max_payload_bytes: usize) -> Router {
    let state = AppState {
        pipeline,
        max_payload_bytes,
    };

    Router::new()
        .route("/ingest", post(handle_ingest))
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve once the operator asks the gateway to stop: Ctrl+C anywhere,
/// SIGTERM on unix. Serving stops first; the pipeline drain follows.
async fn stop_requested() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("interrupt received, closing intake"),
            _ = sigterm.recv() => info!("SIGTERM received, closing intake"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("interrupt received, closing intake");
    }
}

/// Entry point: load config, start the pipeline, serve until a signal
/// arrives, then drain.
pub async fn run() -> Result<()> {
    let config = GatewayConfig::load().context("Failed to load configuration")?;
    init_tracing(&config);

    let sink = build_sink(&config.sink)?;
    let dlq_sink = build_dlq_sink(&config.sink);

    let settings = PipelineSettings {
        queue_capacity: config.queue.capacity,
        batch_size: config.batch.size,
        flush_interval: config.batch.flush_interval(),
        retry_max_attempts: config.retry.max_attempts,
        retry_base_delay: config.retry.base_delay(),
    };
    let pipeline = Arc::new(Pipeline::start(settings, sink, dlq_sink));

    let router = app(Arc::clone(&pipeline), config.server.max_payload_bytes);

    let addr = config.server.listen_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Ingestion endpoint listening on http://{addr}");
    info!("  POST http://{addr}/ingest - record admission");
    info!("  GET  http://{addr}/health - health check");
    info!("  GET  http://{addr}/ready  - readiness check");

    axum::serve(listener, router)
        .with_graceful_shutdown(stop_requested())
        .await
        .context("Server error")?;

    info!("Draining ingestion pipeline...");
    if let Err(err) = pipeline.shutdown().await {
        error!(error = %err, "pipeline stopped with a fatal delivery failure");
        return Err(err.into());
    }

    info!("Shutdown complete");
    Ok(())
}
