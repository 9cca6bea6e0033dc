use super::status_for;
use crate::models::{QueuedResponse, SyncResponse};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use canna::sync::{SyncOutcome, SyncTag};
use serde_json::Value;
use tracing::{info, warn};

/// POST /_worker/sync/{tag}
pub async fn trigger_sync(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<SyncResponse>, StatusCode> {
    info!("SYNC: tag={}", tag);

    let tag: SyncTag = tag.parse().map_err(|e| {
        warn!("SYNC: {}", e);
        status_for(&e)
    })?;

    match state.worker.sync(tag).await {
        Ok(outcome) => Ok(Json(SyncResponse {
            tag: tag.to_string(),
            replayed: match outcome {
                SyncOutcome::Empty => 0,
                SyncOutcome::Replayed { items } => items,
            },
        })),
        Err(e) => Err(status_for(&e)),
    }
}

/// POST /_worker/queue/cart
pub async fn enqueue_cart_item(
    State(state): State<AppState>,
    Json(item): Json<Value>,
) -> Result<(StatusCode, Json<QueuedResponse>), StatusCode> {
    match state.worker.enqueue_cart_item(item).await {
        Ok(()) => Ok((StatusCode::ACCEPTED, Json(QueuedResponse { queued: true }))),
        Err(e) => Err(status_for(&e)),
    }
}

/// PUT /_worker/queue/order
pub async fn set_pending_order(
    State(state): State<AppState>,
    Json(order): Json<Value>,
) -> Result<(StatusCode, Json<QueuedResponse>), StatusCode> {
    match state.worker.set_pending_order(order).await {
        Ok(()) => Ok((StatusCode::ACCEPTED, Json(QueuedResponse { queued: true }))),
        Err(e) => Err(status_for(&e)),
    }
}
