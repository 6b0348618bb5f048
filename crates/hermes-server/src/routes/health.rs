//! Database health route.
//!
//! Reports connectivity, probe response time, and aggregate lead
//! statistics. Delivery trouble degrades the status; an unreachable
//! store makes it unhealthy with HTTP 503.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::warn;

use crate::models::{HealthResponse, classify_health};
use crate::repository;
use crate::state::AppState;

/// Build the health router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health/database", get(database_health))
}

/// `GET /api/health/database`
async fn database_health(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let started = Instant::now();

    if let Err(e) = repository::ping(&state.pool).await {
        warn!(error = %e, "database health probe failed");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                response_time_ms: elapsed_ms(started),
                stats: None,
                error: Some("database unreachable".to_owned()),
            }),
        );
    }

    match repository::stats(&state.pool).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: classify_health(&stats),
                response_time_ms: elapsed_ms(started),
                stats: Some(stats),
                error: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "lead statistics query failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    response_time_ms: elapsed_ms(started),
                    stats: None,
                    error: Some("statistics unavailable".to_owned()),
                }),
            )
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
