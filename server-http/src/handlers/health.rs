use crate::models::HealthResponse;
use crate::state::AppState;
use axum::{extract::State, Json};

/// GET /_worker/health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "OK".into(),
        state: state.worker.state(),
        controlling: state.worker.is_controlling(),
        upstream: state.upstream.clone(),
    })
}
