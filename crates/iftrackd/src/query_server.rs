//! HTTP query surface for registry snapshots
//!
//! Read-only endpoints: `/interfaces` returns the line-oriented text
//! report, `/interfaces.json` the same snapshot as JSON, plus `/healthz`
//! and a Prometheus `/metrics` endpoint. Every response is rendered from
//! one fully-materialized snapshot; handlers never return registry
//! errors, only complete (possibly empty) listings.

use crate::error::{IftrackError, Result};
use crate::metrics::MetricsCollector;
use crate::registry::InterfaceRegistry;
use crate::report;
use crate::types::InterfaceRecord;
use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Default query server port
pub const DEFAULT_QUERY_PORT: u16 = 9893;

/// Shared handler state
#[derive(Clone)]
struct QueryServerState {
    registry: Arc<InterfaceRegistry>,
    metrics: MetricsCollector,
}

/// Handle to a running query server
pub struct QueryServerHandle {
    /// Address the listener actually bound to
    pub local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl QueryServerHandle {
    /// Signal the server to stop and wait for it to finish
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }
}

/// Build the query router
fn router(registry: Arc<InterfaceRegistry>, metrics: MetricsCollector) -> Router {
    let state = QueryServerState { registry, metrics };
    Router::new()
        .route("/interfaces", get(interfaces_text_handler))
        .route("/interfaces.json", get(interfaces_json_handler))
        .route("/healthz", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Start the query server
///
/// Binding the listener is part of startup: a bind failure is returned to
/// the caller, which treats it as fatal.
pub async fn start_query_server(
    addr: SocketAddr,
    registry: Arc<InterfaceRegistry>,
    metrics: MetricsCollector,
) -> Result<QueryServerHandle> {
    let app = router(registry, metrics);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| IftrackError::QuerySurface(format!("Failed to bind {}: {}", addr, e)))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| IftrackError::QuerySurface(format!("Failed to read local addr: {}", e)))?;

    info!("Query server listening on http://{}/interfaces", local_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(async move {
        let serve = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        if let Err(e) = serve.await {
            error!(error = %e, "Query server exited with error");
        }
    });

    Ok(QueryServerHandle {
        local_addr,
        shutdown: Some(shutdown_tx),
        task,
    })
}

/// Handle /interfaces - line-oriented text report
async fn interfaces_text_handler(State(state): State<QueryServerState>) -> impl IntoResponse {
    let snapshot = state.registry.snapshot();
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        report::render_snapshot(&snapshot),
    )
}

/// Handle /interfaces.json - snapshot as JSON
async fn interfaces_json_handler(
    State(state): State<QueryServerState>,
) -> Json<Vec<InterfaceRecord>> {
    Json(state.registry.snapshot())
}

/// Handle /healthz - simple liveness check
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Handle /metrics - Prometheus text format
async fn metrics_handler(State(state): State<QueryServerState>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", encoder.format_type())],
            buffer,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response()
        }
    }
}
