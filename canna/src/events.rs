use crate::ports::NotificationSink;
use crate::push::Notification;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::Result;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerEvent {
    NotificationShown(Notification),
    NotificationClosed(NotificationClosedEvent),
    ClientNavigate(ClientNavigateEvent),
    GenerationDeleted(GenerationDeletedEvent),
    SyncReplayed(SyncReplayedEvent),
    ClientsClaimed(ClientsClaimedEvent),
}

impl WorkerEvent {
    /// Name used for SSE event types and filters
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerEvent::NotificationShown(_) => "notification_shown",
            WorkerEvent::NotificationClosed(_) => "notification_closed",
            WorkerEvent::ClientNavigate(_) => "client_navigate",
            WorkerEvent::GenerationDeleted(_) => "generation_deleted",
            WorkerEvent::SyncReplayed(_) => "sync_replayed",
            WorkerEvent::ClientsClaimed(_) => "clients_claimed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationClosedEvent {
    pub id: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientNavigateEvent {
    pub url: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationDeletedEvent {
    pub name: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReplayedEvent {
    pub tag: String,
    pub items: usize,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientsClaimedEvent {
    pub generation: String,
    pub timestamp: u64,
}

/// Helper to get current timestamp in seconds since UNIX epoch
pub fn now_timestamp() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Send an event if anybody is listening; a missing audience is not an error
pub fn publish(broadcaster: Option<&broadcast::Sender<WorkerEvent>>, event: WorkerEvent) {
    let Some(broadcaster) = broadcaster else {
        return;
    };
    let kind = event.kind();
    match broadcaster.send(event) {
        Ok(subscriber_count) => {
            tracing::debug!("Broadcasted {} event to {} subscriber(s)", kind, subscriber_count);
        }
        Err(_) => {
            tracing::debug!("No subscribers for {} event", kind);
        }
    }
}

/// Notification sink that fans notification activity out to event subscribers
#[derive(Clone, Debug)]
pub struct BroadcastNotificationSink {
    broadcaster: broadcast::Sender<WorkerEvent>,
}

impl BroadcastNotificationSink {
    pub fn new(broadcaster: broadcast::Sender<WorkerEvent>) -> Self {
        Self { broadcaster }
    }
}

#[async_trait]
impl NotificationSink for BroadcastNotificationSink {
    async fn show(&self, notification: &Notification) -> Result<()> {
        publish(
            Some(&self.broadcaster),
            WorkerEvent::NotificationShown(notification.clone()),
        );
        Ok(())
    }

    async fn close(&self, notification_id: &str) -> Result<()> {
        publish(
            Some(&self.broadcaster),
            WorkerEvent::NotificationClosed(NotificationClosedEvent {
                id: notification_id.to_string(),
                timestamp: now_timestamp(),
            }),
        );
        Ok(())
    }

    async fn open_client(&self, url: &str) -> Result<()> {
        publish(
            Some(&self.broadcaster),
            WorkerEvent::ClientNavigate(ClientNavigateEvent {
                url: url.to_string(),
                timestamp: now_timestamp(),
            }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::PushPayload;

    #[tokio::test]
    async fn sink_publishes_notification_events_in_order() {
        let (tx, mut rx) = broadcast::channel(16);
        let sink = BroadcastNotificationSink::new(tx);
        let notification = PushPayload::default().apply_defaults(chrono::Utc::now());

        sink.show(&notification).await.unwrap();
        sink.close(&notification.id).await.unwrap();
        sink.open_client("/orders").await.unwrap();

        assert_eq!(rx.recv().await.unwrap().kind(), "notification_shown");
        match rx.recv().await.unwrap() {
            WorkerEvent::NotificationClosed(e) => assert_eq!(e.id, notification.id),
            other => panic!("unexpected event {other:?}"),
        }
        match rx.recv().await.unwrap() {
            WorkerEvent::ClientNavigate(e) => assert_eq!(e.url, "/orders"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let (tx, rx) = broadcast::channel::<WorkerEvent>(4);
        drop(rx);
        publish(
            Some(&tx),
            WorkerEvent::ClientsClaimed(ClientsClaimedEvent {
                generation: "g".into(),
                timestamp: now_timestamp(),
            }),
        );
        publish(None, WorkerEvent::NotificationClosed(NotificationClosedEvent {
            id: "x".into(),
            timestamp: 0,
        }));
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = WorkerEvent::SyncReplayed(SyncReplayedEvent {
            tag: "cart-sync".into(),
            items: 2,
            timestamp: 1,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "sync_replayed");
        assert_eq!(json["tag"], "cart-sync");
    }
}
