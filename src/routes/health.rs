use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;

use crate::db;
use crate::models::SyncPhase;
use crate::AppState;

/// Root endpoint - basic status
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "TV Catalog Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "runtime": "rust"
    }))
}

/// Health check response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime: u64,
    postgres: bool,
    /// `None` when no Redis is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    redis: Option<bool>,
    sync_phase: SyncPhase,
}

/// Overall status: PostgreSQL is critical, Redis only guards cross-replica locking
fn overall_status(postgres_ok: bool, redis_ok: Option<bool>) -> &'static str {
    match (postgres_ok, redis_ok) {
        (false, _) => "unhealthy",
        (true, Some(false)) => "degraded",
        (true, _) => "ok",
    }
}

async fn redis_status(state: &AppState) -> Option<bool> {
    match &state.redis {
        Some(redis) => Some(redis.ping().await.unwrap_or(false)),
        None => None,
    }
}

/// GET /health - Advanced health check
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();
    let postgres_ok = db::health_check(&state.pool).await;
    let redis_ok = redis_status(&state).await;

    Json(HealthResponse {
        status: overall_status(postgres_ok, redis_ok),
        uptime,
        postgres: postgres_ok,
        redis: redis_ok,
        sync_phase: state.synchronizer.phase(),
    })
}

/// GET /metrics - Prometheus metrics
pub async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                b"Internal Server Error".to_vec(),
            )
        }
    }
}

/// Readiness probe (for Kubernetes)
pub async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let postgres_ok = db::health_check(&state.pool).await;
    let redis_ok = redis_status(&state).await;

    match overall_status(postgres_ok, redis_ok) {
        "ok" => (StatusCode::OK, "ready"),
        "degraded" => (StatusCode::OK, "ready (redis degraded)"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "not ready - postgres unavailable"),
    }
}

/// Liveness probe (for Kubernetes)
pub async fn live() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}
