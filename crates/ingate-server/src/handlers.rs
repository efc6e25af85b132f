// HTTP request handlers
//
// Record admission plus health and readiness probes.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ingate_core::Record;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{ApiError, AppState};

/// Raw ingestion payload: one record or a list of records.
#[derive(Debug, Deserialize)]
struct IngestRequest {
    payload: Payload,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    One(Record),
    Many(Vec<Record>),
}

impl IngestRequest {
    /// Normalized, non-empty record list.
    fn into_records(self) -> Result<Vec<Record>, ApiError> {
        let records = match self.payload {
            Payload::One(record) => vec![record],
            Payload::Many(records) => records,
        };
        if records.is_empty() {
            return Err(ApiError::bad_request(anyhow::anyhow!(
                "payload must not be empty"
            )));
        }
        Ok(records)
    }
}

/// POST /ingest - admit records into the pipeline
pub(crate) async fn handle_ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    if body.len() > state.max_payload_bytes {
        return Err(ApiError::reject(
            StatusCode::PAYLOAD_TOO_LARGE,
            anyhow::anyhow!(
                "payload {} bytes exceeds limit {}",
                body.len(),
                state.max_payload_bytes
            ),
        ));
    }

    let request: IngestRequest = serde_json::from_slice(&body).map_err(|_| {
        ApiError::bad_request(anyhow::anyhow!(
            "payload must be a JSON object or a list of JSON objects"
        ))
    })?;
    let records = request.into_records()?;

    debug!(records = records.len(), "admitting records");
    let accepted = state
        .pipeline
        .admit(records)
        .map_err(ApiError::backpressure)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "accepted_count": accepted,
            "message": format!("successfully ingested {accepted} records"),
        })),
    )
        .into_response())
}

/// GET /health - Basic health check
pub(crate) async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "healthy"})))
}

/// GET /ready - Readiness check (reports queue depth and worker liveness)
pub(crate) async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.pipeline.is_running() {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "queue_depth": state.pipeline.queue_depth(),
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "not ready", "worker": "stopped"})),
        )
    }
}
