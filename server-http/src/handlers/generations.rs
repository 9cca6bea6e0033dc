use super::status_for;
use crate::models::{DropGenerationResponse, GenerationResponse, ListGenerationsResponse};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

/// GET /_worker/generations
pub async fn list_generations(
    State(state): State<AppState>,
) -> Result<Json<ListGenerationsResponse>, StatusCode> {
    let names = &state.worker.config().names;

    match state.worker.generations().list_generations().await {
        Ok(result) => Ok(Json(ListGenerationsResponse {
            generations: result
                .generations
                .into_iter()
                .map(|info| {
                    let current = names.is_current(&info.config.name);
                    GenerationResponse::from_info(info, current)
                })
                .collect(),
        })),
        Err(e) => Err(status_for(&e)),
    }
}

/// GET /_worker/generations/{name}
pub async fn describe_generation(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<GenerationResponse>, StatusCode> {
    let current = state.worker.config().names.is_current(&name);

    match state.worker.generations().describe_generation(&name).await {
        Ok(result) => Ok(Json(GenerationResponse::from_info(result.info, current))),
        Err(e) => Err(status_for(&e)),
    }
}

/// DELETE /_worker/generations/{name}
pub async fn drop_generation(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DropGenerationResponse>, StatusCode> {
    info!("DROP_GENERATION: name={}", name);

    match state.worker.generations().drop_generation(&name).await {
        Ok(result) => Ok(Json(DropGenerationResponse {
            dropped: result.dropped,
        })),
        Err(e) => Err(status_for(&e)),
    }
}
