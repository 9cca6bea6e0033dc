//! Background sync: replay queued mutations once connectivity returns.
//!
//! Replay is at-least-once. Only what was sent is removed, and only after the
//! replay request came back with a success status, so a crash between the two
//! can submit the same payload twice. No idempotency key is attached. Items
//! queued while a replay is in flight wait for the next trigger.

use crate::domain::request::FetchRequest;
use crate::events::{SyncReplayedEvent, WorkerEvent, now_timestamp, publish};
use crate::ports::{Fetcher, SyncQueue};
use serde_json::Value;
use shared::{Error, Result};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTag {
    Cart,
    Order,
}

impl SyncTag {
    pub const ALL: [SyncTag; 2] = [SyncTag::Cart, SyncTag::Order];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTag::Cart => "cart-sync",
            SyncTag::Order => "order-sync",
        }
    }
}

impl FromStr for SyncTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cart-sync" => Ok(SyncTag::Cart),
            "order-sync" => Ok(SyncTag::Order),
            other => Err(Error::UnknownSyncTag(other.to_string())),
        }
    }
}

impl std::fmt::Display for SyncTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing queued, no request sent
    Empty,
    Replayed { items: usize },
}

pub struct SyncReplayer {
    queue: Arc<dyn SyncQueue>,
    fetcher: Arc<dyn Fetcher>,
    cart_endpoint: String,
    order_endpoint: String,
    event_broadcaster: Option<broadcast::Sender<WorkerEvent>>,
    // One replay at a time, so two triggers never remove the same snapshot twice
    replay_lock: Mutex<()>,
}

impl SyncReplayer {
    pub fn new(
        queue: Arc<dyn SyncQueue>,
        fetcher: Arc<dyn Fetcher>,
        cart_endpoint: impl Into<String>,
        order_endpoint: impl Into<String>,
        event_broadcaster: Option<broadcast::Sender<WorkerEvent>>,
    ) -> Self {
        Self {
            queue,
            fetcher,
            cart_endpoint: cart_endpoint.into(),
            order_endpoint: order_endpoint.into(),
            event_broadcaster,
            replay_lock: Mutex::new(()),
        }
    }

    pub fn queue(&self) -> &Arc<dyn SyncQueue> {
        &self.queue
    }

    pub async fn replay(&self, tag: SyncTag) -> Result<SyncOutcome> {
        let _guard = self.replay_lock.lock().await;
        let outcome = match tag {
            SyncTag::Cart => self.replay_cart().await,
            SyncTag::Order => self.replay_order().await,
        };

        match outcome {
            Ok(SyncOutcome::Replayed { items }) => {
                info!("{} replayed {} item(s)", tag, items);
                publish(
                    self.event_broadcaster.as_ref(),
                    WorkerEvent::SyncReplayed(SyncReplayedEvent {
                        tag: tag.as_str().to_string(),
                        items,
                        timestamp: now_timestamp(),
                    }),
                );
            }
            Ok(SyncOutcome::Empty) => debug!("{}: nothing queued", tag),
            Err(ref e) => warn!("{} failed, queue kept for next trigger: {}", tag, e),
        }
        outcome
    }

    async fn replay_cart(&self) -> Result<SyncOutcome> {
        let items = self.queue.cart_items().await?;
        if items.is_empty() {
            return Ok(SyncOutcome::Empty);
        }

        let count = items.len();
        self.post(SyncTag::Cart, &self.cart_endpoint, &Value::Array(items))
            .await?;
        self.queue.remove_cart_items(count).await?;
        Ok(SyncOutcome::Replayed { items: count })
    }

    async fn replay_order(&self) -> Result<SyncOutcome> {
        let Some(order) = self.queue.pending_order().await? else {
            return Ok(SyncOutcome::Empty);
        };

        self.post(SyncTag::Order, &self.order_endpoint, &order).await?;
        if !self.queue.clear_order_if(&order).await? {
            debug!("Pending order changed during replay, keeping the newer one");
        }
        Ok(SyncOutcome::Replayed { items: 1 })
    }

    async fn post(&self, tag: SyncTag, endpoint: &str, payload: &Value) -> Result<()> {
        let request = FetchRequest::new("POST", endpoint)
            .with_header("content-type", "application/json")
            .with_body(payload.to_string());

        let response = self.fetcher.fetch(&request).await.map_err(|e| Error::Sync {
            tag: tag.as_str().to_string(),
            reason: e.to_string(),
        })?;

        if !response.is_success() {
            return Err(Error::Sync {
                tag: tag.as_str().to_string(),
                reason: format!("{} answered {}", endpoint, response.status),
            });
        }
        Ok(())
    }
}

/// Tracks reachability between probes and reports when it comes back
#[derive(Debug, Default)]
pub struct ConnectivityMonitor {
    last: Option<bool>,
}

impl ConnectivityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a probe result; true when this observation is an offline -> online
    /// transition (the very first online observation counts as one)
    pub fn observe(&mut self, online: bool) -> bool {
        let came_back = online && self.last != Some(true);
        if self.last != Some(online) {
            info!("Upstream is {}", if online { "reachable" } else { "unreachable" });
        }
        self.last = Some(online);
        came_back
    }

    pub fn is_online(&self) -> Option<bool> {
        self.last
    }
}
