//! Read-only HTTP surface over the published simulation state.

use std::net::SocketAddr;
use anyhow::Result;
use axum::{extract::State, http::{header, StatusCode}, response::{IntoResponse, Response}, routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::lifecycle::RunPhase;
use crate::metrics_ext::FEDERATION_METRICS;
use crate::state::{DashboardSnapshot, StateReader};

#[derive(Debug, Serialize, PartialEq)]
pub struct StatusBody {
    pub live: bool,
    pub ready: bool,
    #[serde(flatten)]
    pub phase: RunPhase,
    pub log_entries: usize,
}

pub fn router(reader: StateReader) -> Router {
    Router::new()
        .route("/metrics", get(dashboard))
        .route("/metrics/prometheus", get(prometheus_metrics))
        .route("/live", get(|| async { Json(serde_json::json!({"live": true})) }))
        .route("/ready", get(ready))
        .route("/status", get(status))
        .layer(CorsLayer::permissive())
        .with_state(reader)
}

pub async fn dashboard(State(reader): State<StateReader>) -> Json<DashboardSnapshot> { Json(reader.snapshot()) }

pub async fn ready(State(reader): State<StateReader>) -> Json<serde_json::Value> {
    Json(serde_json::json!({"ready": reader.phase().has_started()}))
}

pub async fn status(State(reader): State<StateReader>) -> Json<StatusBody> {
    let phase = reader.phase();
    Json(StatusBody { live: true, ready: phase.has_started(), phase, log_entries: reader.log_len() })
}

async fn prometheus_metrics() -> Response {
    match FEDERATION_METRICS.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("encode error: {e}")).into_response(),
    }
}

/// Binds and serves in the background; returns the bound address (useful with port 0).
pub async fn start_dashboard_server(port: u16, reader: StateReader) -> Result<SocketAddr> {
    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    let addr = listener.local_addr()?;
    tracing::info!(?addr, "dashboard_server_listening");
    let app = router(reader);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error=?e, "dashboard_server_failed");
        }
    });
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SharedState;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn dashboard_returns_snapshot() {
        let (w, r) = SharedState::new(0.6);
        w.begin_round(2, "--- Starting Round 2 ---");
        let Json(snap) = dashboard(State(r)).await;
        assert_eq!(snap.round, 2);
        assert_eq!(snap.logs.len(), 1);
    }

    #[tokio::test]
    async fn status_reflects_phase() {
        let (w, r) = SharedState::new(0.6);
        let Json(before) = status(State(r.clone())).await;
        assert!(!before.ready);
        w.set_phase(RunPhase::Running { round: 1 });
        let Json(after) = status(State(r)).await;
        assert!(after.ready);
        let v = serde_json::to_value(&after).unwrap();
        assert_eq!(v["phase"], "running");
        assert_eq!(v["round"], 1);
    }

    #[tokio::test]
    async fn serves_metrics_over_http() {
        let (w, r) = SharedState::new(0.6);
        w.append_log("System Initialized. Waiting for start...");
        let addr = start_dashboard_server(0, r).await.unwrap();
        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", addr.port())).await.unwrap();
        stream.write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        let text = String::from_utf8_lossy(&buf);
        assert!(text.starts_with("HTTP/1.1 200"));
        assert!(text.contains("\"accuracy\":0.6"));
        assert!(text.contains("System Initialized"));
    }
}
