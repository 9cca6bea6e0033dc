use super::status_for;
use crate::models::{ClickRequest, ClickResponse};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use canna::push::{ClickOutcome, Notification};
use tracing::info;

/// POST /_worker/push
/// The raw body is the push payload; an empty body means "no payload"
pub async fn push(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Notification>, StatusCode> {
    let raw = (!body.is_empty()).then_some(body.as_ref());

    match state.worker.push(raw).await {
        Ok(notification) => {
            info!("PUSH: shown notification id={}", notification.id);
            Ok(Json(notification))
        }
        Err(e) => Err(status_for(&e)),
    }
}

/// POST /_worker/notifications/{id}/click
pub async fn click_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ClickResponse>, StatusCode> {
    let request: ClickRequest = if body.is_empty() {
        ClickRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|_| StatusCode::BAD_REQUEST)?
    };

    match state
        .worker
        .click(&id, request.action.as_deref(), &request.data)
        .await
    {
        Ok(ClickOutcome::Dismissed) => Ok(Json(ClickResponse {
            dismissed: true,
            navigate: None,
        })),
        Ok(ClickOutcome::Navigate(url)) => Ok(Json(ClickResponse {
            dismissed: false,
            navigate: Some(url),
        })),
        Err(e) => Err(status_for(&e)),
    }
}
