use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    workers: usize,
    degraded: bool,
}

/// Aggregate health, per §6: `status` stays `ok` for as long as the process
/// is alive — degradation is surfaced only through `/health/ready`, not here.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let snapshots = state.supervisor.snapshots().await;
    let degraded = state.supervisor.is_degraded();
    let body = HealthResponse {
        status: "ok",
        workers: snapshots.len(),
        degraded,
    };
    (StatusCode::OK, Json(body))
}

/// Kubernetes liveness probe: the process is up and serving HTTP.
pub async fn live() -> impl IntoResponse {
    StatusCode::OK
}

/// Kubernetes readiness probe: stop sending traffic once the supervisor has
/// given up on a worker (§4.E/§6).
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    if state.supervisor.is_degraded() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}
