//! Health and readiness endpoints.
//!
//! # Health vs Readiness
//!
//! - **Health** (`/health`): Returns 200 even if degraded, includes details
//! - **Readiness** (`/ready`): Returns 503 while the document store is unreachable

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::instrument;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint.
///
/// Reports the last known store reachability without touching the store.
///
/// ```json
/// {
///   "status": "healthy",
///   "database_connected": true,
///   "version": "0.2.0",
///   "uptime_seconds": 3600,
///   "timestamp": "2024-01-15T10:30:00Z"
/// }
/// ```
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_connected = state.db.is_connected();

    Json(HealthResponse {
        status: if database_connected {
            "healthy"
        } else {
            "degraded"
        }
        .to_string(),
        database_connected,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
    })
}

/// Readiness probe.
///
/// Pings the store; 200 when it answers, 503 otherwise.
///
/// ```yaml
/// readinessProbe:
///   httpGet:
///     path: /ready
///     port: 5000
///   periodSeconds: 10
/// ```
#[instrument(skip(state))]
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match state.db.ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
