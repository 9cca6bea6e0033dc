use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build and configure the application router.
/// Worker administration lives under `/_worker`; everything else is proxied.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/_worker/health", get(handlers::health_check))
        // SSE Events endpoint
        .route("/_worker/events", get(handlers::stream_events))
        // Lifecycle
        .route("/_worker/install", post(handlers::install))
        .route("/_worker/activate", post(handlers::activate))
        // Generations
        .route("/_worker/generations", get(handlers::list_generations))
        .route(
            "/_worker/generations/{name}",
            get(handlers::describe_generation).delete(handlers::drop_generation),
        )
        // Background sync
        .route("/_worker/sync/{tag}", post(handlers::trigger_sync))
        .route("/_worker/queue/cart", post(handlers::enqueue_cart_item))
        .route("/_worker/queue/order", put(handlers::set_pending_order))
        // Push
        .route("/_worker/push", post(handlers::push))
        .route(
            "/_worker/notifications/{id}/click",
            post(handlers::click_notification),
        )
        // Everything else goes through the offline layer
        .fallback(handlers::proxy)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
