// HTTP request handlers
//
// Bizlog ingestion plus health, status and statistics endpoints

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::{counter, histogram};
use serde_json::json;
use tracekv_core::Batch;
use tracing::debug;

use crate::{AppError, AppState};

/// POST /v1/bizlog - enqueue one trace batch
///
/// Bodies over `max_payload_bytes` are refused with 413 by the router's body
/// limit before this runs.
pub(crate) async fn handle_bizlog(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    debug!("Received bizlog request ({} bytes)", body.len());

    counter!("tracekv.ingest.requests", 1);
    histogram!("tracekv.ingest.bytes", body.len() as f64);

    let batch = Batch::from_json(&body).map_err(|e| {
        counter!("tracekv.ingest.rejected", 1, "reason" => "malformed");
        AppError::bad_request(e)
    })?;

    let status = match batch {
        Some(batch) => {
            counter!("tracekv.ingest.records", batch.len() as u64);
            state.queue.submit(Some(batch));
            "queued"
        }
        None => "ignored",
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": status,
            "queue_depth": state.queue.len(),
        })),
    )
        .into_response())
}

/// GET /health - Basic health check
pub(crate) async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "healthy"})))
}

/// GET /status - queue depth and live storage shards
pub(crate) async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let shards: Vec<String> = state
        .store
        .shard_keys()
        .iter()
        .map(ToString::to_string)
        .collect();

    Json(json!({
        "queue_depth": state.queue.len(),
        "shards": shards,
    }))
}

/// GET /stats - alarm, API and SQL statistics
pub(crate) async fn stats(State(state): State<AppState>) -> Result<Response, AppError> {
    let snapshot = serde_json::to_value(state.stats.snapshot())?;
    Ok(Json(snapshot).into_response())
}
