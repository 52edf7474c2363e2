// HTTP server for tracekv
//
// Accepts trace batches over HTTP, queues them for the scheduled drain loop
// and exposes queue, shard and statistics introspection.
//
// Features:
// - Axum HTTP server (HTTP/1.1, HTTP/2) with gzip request decompression
// - Structured logging with tracing
// - Graceful shutdown that drains every accepted batch

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::signal;
use tower_http::decompression::RequestDecompressionLayer;
use tracekv_batch::{DrainScheduler, IntakeQueue};
use tracekv_config::RuntimeConfig;
use tracekv_stats::StatsHub;
use tracekv_storage::MemoryStore;
use tracing::{error, info};

mod handlers;
mod init;

use handlers::{handle_bizlog, health_check, stats, status};
pub use init::init_tracing;
use init::init_pipeline;

/// Application state shared across all requests
#[derive(Clone)]
pub(crate) struct AppState {
    pub queue: Arc<IntakeQueue>,
    pub store: Arc<MemoryStore>,
    pub stats: Arc<StatsHub>,
    pub max_payload_bytes: usize,
}

/// Error type that implements IntoResponse
pub(crate) struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request error: {:?}", self.error);
        (
            self.status,
            Json(json!({
                "error": self.error.to_string(),
            })),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: err.into(),
        }
    }
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::with_status(StatusCode::BAD_REQUEST, error.into())
    }
}

fn router(state: AppState) -> Router {
    let body_limit = state.max_payload_bytes;
    Router::new()
        .route("/v1/bizlog", post(handle_bizlog))
        .route("/health", get(health_check))
        .route("/status", get(status))
        .route("/stats", get(stats))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestDecompressionLayer::new().gzip(true))
        .with_state(state)
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

/// Entry point for server mode with a resolved configuration
pub async fn run_with_config(config: RuntimeConfig) -> Result<()> {
    init_tracing(&config);

    let addr = config.server.listen_addr.clone();
    let pipeline = init_pipeline(&config)?;
    info!(
        "Max payload size set to {} bytes",
        config.request.max_payload_bytes
    );

    let scheduler = DrainScheduler::new(pipeline.processor.clone())
        .with_interval(config.pipeline.tick_interval())
        .spawn();

    let app = router(pipeline.state.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to {}", addr))?;

    info!("tracekv HTTP endpoint listening on http://{}", addr);
    info!("Routes:");
    info!("  POST http://{}/v1/bizlog - Trace batch ingestion", addr);
    info!("  GET  http://{}/health    - Health check", addr);
    info!("  GET  http://{}/status    - Queue depth and shards", addr);
    info!("  GET  http://{}/stats     - Alarm, API and SQL statistics", addr);
    info!("Press Ctrl+C or send SIGTERM to stop");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    // Accepted batches are drained even when the server loop failed.
    let report = scheduler.shutdown().await;
    info!(
        drained_batches = report.batches,
        queue_depth = pipeline.state.queue.len(),
        "Server shutdown complete"
    );

    served
}
