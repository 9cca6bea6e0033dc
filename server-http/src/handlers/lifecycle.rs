use super::status_for;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use canna::planes::control::{ActivationReport, InstallReport};
use tracing::{info, warn};

/// POST /_worker/install
pub async fn install(
    State(state): State<AppState>,
) -> Result<Json<InstallReport>, StatusCode> {
    info!("INSTALL: requested");

    match state.worker.install().await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            warn!("INSTALL: failed: {}", e);
            Err(status_for(&e))
        }
    }
}

/// POST /_worker/activate
pub async fn activate(
    State(state): State<AppState>,
) -> Result<Json<ActivationReport>, StatusCode> {
    info!("ACTIVATE: requested");

    match state.worker.activate().await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            warn!("ACTIVATE: failed: {}", e);
            Err(status_for(&e))
        }
    }
}
