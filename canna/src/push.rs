//! Push notifications.
//!
//! A push arrives as raw bytes. It is parsed leniently into a [`PushPayload`] in
//! which every field is optional, then [`PushPayload::apply_defaults`] produces a
//! fully populated [`Notification`]. A missing or malformed payload never stops a
//! notification from being shown.

use crate::ports::NotificationSink;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_TITLE: &str = "Canna Bomb";
pub const DEFAULT_BODY: &str = "New update from Canna Bomb";
pub const DEFAULT_ICON: &str = "/icons/icon-192x192.png";
pub const DEFAULT_BADGE: &str = "/icons/icon-72x72.png";
pub const DEFAULT_TAG: &str = "canna-bomb";
pub const DEFAULT_URL: &str = "/";
pub const DEFAULT_VIBRATE: [u32; 3] = [100, 50, 100];

/// Action id that dismisses a notification without navigating
pub const CLOSE_ACTION: &str = "close";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl NotificationAction {
    fn new(action: &str, title: &str) -> Self {
        Self {
            action: action.to_string(),
            title: title.to_string(),
            icon: Some(DEFAULT_ICON.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: Option<String>,
    pub vibrate: Option<Vec<u32>>,
    pub url: Option<String>,
    pub data: Option<Map<String, Value>>,
    pub actions: Option<Vec<NotificationAction>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub vibrate: Vec<u32>,
    pub data: Map<String, Value>,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    pub fn target_url(&self) -> Option<&str> {
        self.data.get("url").and_then(Value::as_str)
    }
}

impl PushPayload {
    /// Absent or empty input gives all defaults, a JSON object gives its fields,
    /// anything else becomes the body text. A mistyped field is dropped on its own.
    pub fn parse(raw: Option<&[u8]>) -> Self {
        let Some(raw) = raw.filter(|bytes| !bytes.is_empty()) else {
            return Self::default();
        };

        match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(fields)) => Self::from_fields(&fields),
            Ok(_) => {
                debug!("Push payload is not a JSON object, using it as text");
                Self::text(raw)
            }
            Err(e) => {
                debug!("Push payload is not JSON ({}), using it as text", e);
                Self::text(raw)
            }
        }
    }

    fn text(raw: &[u8]) -> Self {
        Self {
            body: Some(String::from_utf8_lossy(raw).into_owned()),
            ..Self::default()
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            title: field(fields, "title"),
            body: field(fields, "body"),
            icon: field(fields, "icon"),
            badge: field(fields, "badge"),
            tag: field(fields, "tag"),
            vibrate: field(fields, "vibrate"),
            url: field(fields, "url"),
            data: field(fields, "data"),
            actions: field(fields, "actions"),
        }
    }

    pub fn apply_defaults(self, now: DateTime<Utc>) -> Notification {
        let url = self.url.unwrap_or_else(|| DEFAULT_URL.to_string());

        let mut data = Map::new();
        data.insert("dateOfArrival".to_string(), Value::from(now.timestamp_millis()));
        data.insert("url".to_string(), Value::String(url));
        if let Some(extra) = self.data {
            data.extend(extra);
        }

        Notification {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: self.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            icon: self.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            badge: self.badge.unwrap_or_else(|| DEFAULT_BADGE.to_string()),
            tag: self.tag.unwrap_or_else(|| DEFAULT_TAG.to_string()),
            vibrate: self.vibrate.unwrap_or_else(|| DEFAULT_VIBRATE.to_vec()),
            data,
            actions: self.actions.unwrap_or_else(|| {
                vec![
                    NotificationAction::new("explore", "View"),
                    NotificationAction::new(CLOSE_ACTION, "Close"),
                ]
            }),
        }
    }
}

fn field<T: DeserializeOwned>(fields: &Map<String, Value>, key: &str) -> Option<T> {
    let value = fields.get(key).filter(|v| !v.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!("Ignoring push field '{}': {}", key, e);
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Dismissed,
    Navigate(String),
}

pub fn resolve_click(action: Option<&str>, data: &Map<String, Value>) -> ClickOutcome {
    if action == Some(CLOSE_ACTION) {
        return ClickOutcome::Dismissed;
    }
    let url = data
        .get("url")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .unwrap_or(DEFAULT_URL);
    ClickOutcome::Navigate(url.to_string())
}

pub struct PushHandler {
    sink: Arc<dyn NotificationSink>,
}

impl PushHandler {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub async fn on_push(&self, raw: Option<&[u8]>) -> Result<Notification> {
        let notification = PushPayload::parse(raw).apply_defaults(Utc::now());
        info!("Showing notification '{}'", notification.title);
        self.sink.show(&notification).await?;
        Ok(notification)
    }

    /// The notification is always closed first; navigation follows unless dismissed
    pub async fn on_click(
        &self,
        notification_id: &str,
        action: Option<&str>,
        data: &Map<String, Value>,
    ) -> Result<ClickOutcome> {
        self.sink.close(notification_id).await?;

        let outcome = resolve_click(action, data);
        if let ClickOutcome::Navigate(ref url) = outcome {
            debug!("Notification {} clicked, opening {}", notification_id, url);
            self.sink.open_client(url).await?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingSink;
    use serde_json::json;

    #[test]
    fn no_payload_uses_every_default() {
        let n = PushPayload::parse(None).apply_defaults(Utc::now());
        assert_eq!(n.title, "Canna Bomb");
        assert_eq!(n.body, DEFAULT_BODY);
        assert_eq!(n.icon, DEFAULT_ICON);
        assert_eq!(n.badge, DEFAULT_BADGE);
        assert_eq!(n.vibrate, vec![100, 50, 100]);
        assert_eq!(n.target_url(), Some("/"));
        assert_eq!(n.actions.len(), 2);
        assert!(n.data.contains_key("dateOfArrival"));
    }

    #[test]
    fn empty_payload_counts_as_absent() {
        assert_eq!(PushPayload::parse(Some(b"".as_slice())), PushPayload::default());
    }

    #[test]
    fn malformed_payload_becomes_body_text() {
        let n = PushPayload::parse(Some(b"Sale starts now".as_slice())).apply_defaults(Utc::now());
        assert_eq!(n.body, "Sale starts now");
        assert_eq!(n.title, "Canna Bomb");
    }

    #[test]
    fn json_that_is_not_an_object_becomes_body_text() {
        let n = PushPayload::parse(Some(b"42".as_slice())).apply_defaults(Utc::now());
        assert_eq!(n.body, "42");
    }

    #[test]
    fn provided_fields_override_defaults_independently() {
        let raw = json!({
            "title": "Order ready",
            "vibrate": [200],
            "url": "/orders/17",
            "data": { "orderId": 17 }
        })
        .to_string();
        let n = PushPayload::parse(Some(raw.as_bytes())).apply_defaults(Utc::now());
        assert_eq!(n.title, "Order ready");
        assert_eq!(n.body, DEFAULT_BODY);
        assert_eq!(n.vibrate, vec![200]);
        assert_eq!(n.target_url(), Some("/orders/17"));
        assert_eq!(n.data["orderId"], 17);
    }

    #[test]
    fn mistyped_field_only_loses_itself() {
        let raw = json!({
            "title": 5,
            "body": "Order ready",
            "vibrate": "buzz",
            "data": "not-an-object",
            "url": "/orders/9"
        })
        .to_string();
        let n = PushPayload::parse(Some(raw.as_bytes())).apply_defaults(Utc::now());
        assert_eq!(n.title, DEFAULT_TITLE);
        assert_eq!(n.body, "Order ready");
        assert_eq!(n.vibrate, DEFAULT_VIBRATE.to_vec());
        assert_eq!(n.target_url(), Some("/orders/9"));
        assert_eq!(n.actions.len(), 2);
    }

    #[test]
    fn data_url_wins_over_top_level_url() {
        let raw = json!({ "url": "/a", "data": { "url": "/b" } }).to_string();
        let n = PushPayload::parse(Some(raw.as_bytes())).apply_defaults(Utc::now());
        assert_eq!(n.target_url(), Some("/b"));
    }

    #[test]
    fn click_resolution() {
        let mut data = Map::new();
        assert_eq!(resolve_click(None, &data), ClickOutcome::Navigate("/".into()));
        data.insert("url".into(), json!("/products/9"));
        assert_eq!(
            resolve_click(Some("explore"), &data),
            ClickOutcome::Navigate("/products/9".into())
        );
        assert_eq!(resolve_click(Some("close"), &data), ClickOutcome::Dismissed);
    }

    #[tokio::test]
    async fn handler_shows_and_routes_clicks() {
        let sink = Arc::new(RecordingSink::default());
        let handler = PushHandler::new(sink.clone());

        let shown = handler.on_push(None).await.unwrap();
        assert_eq!(sink.shown().await, vec![shown.clone()]);

        let outcome = handler.on_click(&shown.id, None, &shown.data).await.unwrap();
        assert_eq!(outcome, ClickOutcome::Navigate("/".into()));
        assert_eq!(sink.closed().await, vec![shown.id.clone()]);
        assert_eq!(sink.opened().await, vec!["/".to_string()]);

        let outcome = handler
            .on_click(&shown.id, Some(CLOSE_ACTION), &shown.data)
            .await
            .unwrap();
        assert_eq!(outcome, ClickOutcome::Dismissed);
        assert_eq!(sink.opened().await.len(), 1);
    }
}
