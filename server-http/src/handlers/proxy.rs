use crate::models::ErrorResponse;
use crate::state::AppState;
use crate::upstream::is_hop_by_hop;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use canna::domain::request::FetchRequest;
use canna::domain::response::CachedResponse;
use tracing::{debug, warn};

/// Fallback route: every request not aimed at `/_worker` goes through the offline layer
pub async fn proxy(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let url = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let mut request = FetchRequest::new(method.as_str(), url).with_body(body);
    for (name, value) in headers.iter() {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }

    match state.worker.handle_fetch(&request).await {
        Ok(response) => {
            debug!(
                "FETCH: {} {} -> {}",
                request.method, request.url, response.status
            );
            into_response(response)
        }
        Err(e) => {
            warn!("FETCH: {} {} failed: {}", request.method, request.url, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("Bad Gateway", e.to_string())),
            )
                .into_response()
        }
    }
}

fn into_response(cached: CachedResponse) -> Response {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = Response::new(Body::from(cached.body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &cached.headers {
        if is_hop_by_hop(name) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.append(name, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_response_keeps_status_and_headers() {
        let cached = CachedResponse::new(
            503,
            vec![
                ("content-type".into(), "application/json".into()),
                ("transfer-encoding".into(), "chunked".into()),
            ],
            "{}",
        );
        let response = into_response(cached);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        assert!(response.headers().get("transfer-encoding").is_none());
    }
}
