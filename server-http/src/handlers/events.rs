use crate::state::AppState;
use axum::{
    extract::State,
    http::Uri,
    response::sse::{Event, KeepAlive, Sse},
};
use canna::events::WorkerEvent;
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;

#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    event_type: Vec<String>,
}

impl EventFilter {
    /// Parse query string with CSV support for multiple values
    /// Example: ?type=notification_shown,sync_replayed
    fn from_query_string(query: &str) -> Self {
        let mut event_type = Vec::new();

        for pair in query.split('&') {
            if let Some(("type", value)) = pair.split_once('=') {
                event_type.extend(
                    value
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty()),
                );
            }
        }

        Self { event_type }
    }

    fn allows(&self, event: &WorkerEvent) -> bool {
        self.event_type.is_empty() || self.event_type.iter().any(|t| t == event.kind())
    }
}

/// SSE endpoint that streams worker events to clients
pub async fn stream_events(
    State(state): State<AppState>,
    uri: Uri,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let filter = uri
        .query()
        .map(EventFilter::from_query_string)
        .unwrap_or_default();

    tracing::info!(
        "New SSE client connected. Filters: type={:?}",
        filter.event_type
    );

    let rx = state.event_channel.subscribe();
    let stream = BroadcastStream::new(rx);

    let filtered_stream = stream.filter_map(move |result| {
        let filter_clone = filter.clone();
        async move {
            match result {
                Ok(event) => {
                    let should_send = filter_clone.allows(&event);
                    tracing::debug!(
                        "Received event: type={}, should_send={}",
                        event.kind(),
                        should_send
                    );
                    if should_send {
                        to_sse_event(&event).map(Ok)
                    } else {
                        None
                    }
                }
                Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(n)) => {
                    Some(Ok(Event::default()
                        .event("error")
                        .data(format!("Lagged by {} events", n))))
                }
            }
        }
    });

    Sse::new(filtered_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Convert a WorkerEvent to an SSE Event named after its kind
fn to_sse_event(event: &WorkerEvent) -> Option<Event> {
    match Event::default().event(event.kind()).json_data(event) {
        Ok(sse) => Some(sse),
        Err(e) => {
            tracing::warn!("Failed to serialize {} event: {}", event.kind(), e);
            None
        }
    }
}
