pub mod events;
pub mod generations;
pub mod health;
pub mod lifecycle;
pub mod proxy;
pub mod push;
pub mod sync;

pub use events::stream_events;
pub use generations::{describe_generation, drop_generation, list_generations};
pub use health::health_check;
pub use lifecycle::{activate, install};
pub use proxy::proxy;
pub use push::{click_notification, push};
pub use sync::{enqueue_cart_item, set_pending_order, trigger_sync};

use axum::http::StatusCode;
use shared::Error;

/// HTTP status for a worker error surfaced by an admin endpoint
pub(crate) fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::NotFound | Error::GenerationNotFound(_) | Error::UnknownSyncTag(_) => {
            StatusCode::NOT_FOUND
        }
        Error::Network(_) | Error::Precache { .. } | Error::Sync { .. } => StatusCode::BAD_GATEWAY,
        Error::Lifecycle(_) => StatusCode::CONFLICT,
        Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
