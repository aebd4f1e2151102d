//! HTTP exposition of [`MonitorState`].
//!
//! `/metrics` serves the Prometheus text format. `/health` serves the
//! [`HealthReport`] as JSON, with 503 once the loop is failing.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use thiserror::Error;
use tower_http::cors::CorsLayer;

use super::{HealthReport, HealthStatus, MonitorState};

/// Errors starting or running the exporter.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build exporter runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to bind metrics endpoint {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("metrics endpoint stopped: {0}")]
    Serve(#[source] std::io::Error),
}

/// Prometheus and health endpoints for one monitor.
pub struct MetricsServer {
    addr: SocketAddr,
    state: Arc<MonitorState>,
}

impl MetricsServer {
    /// Serves `state` on all interfaces at `port`.
    pub fn new(port: u16, state: Arc<MonitorState>) -> Self {
        Self {
            addr: ([0, 0, 0, 0], port).into(),
            state,
        }
    }

    /// Address the endpoints are bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn router(state: Arc<MonitorState>) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Binds and serves until the listener fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr,
                source,
            })?;
        tracing::info!(addr = %self.addr, "Metrics endpoint listening");

        axum::serve(listener, Self::router(self.state))
            .await
            .map_err(ServerError::Serve)
    }

    /// Serves on a dedicated thread with its own single-worker runtime.
    ///
    /// The poll loop stays blocking and keeps pushing snapshots into the
    /// shared state.
    pub fn spawn(self) -> Result<(), ServerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .map_err(ServerError::Runtime)?;

        std::thread::Builder::new()
            .name("metrics-server".to_string())
            .spawn(move || {
                if let Err(e) = runtime.block_on(self.serve()) {
                    tracing::error!(error = %e, "Metrics endpoint stopped");
                }
            })
            .map_err(ServerError::Runtime)?;
        Ok(())
    }
}

/// HTTP status for a health report.
fn health_status(report: &HealthReport) -> StatusCode {
    match report.status {
        HealthStatus::Starting | HealthStatus::Ok => StatusCode::OK,
        HealthStatus::Failing => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn metrics_handler(State(state): State<Arc<MonitorState>>) -> impl IntoResponse {
    match state.encode() {
        Ok(text) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            text,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("failed to encode metrics: {e}"),
        ),
    }
}

async fn health_handler(State(state): State<Arc<MonitorState>>) -> impl IntoResponse {
    let report = state.health();
    (health_status(&report), Json(report))
}
