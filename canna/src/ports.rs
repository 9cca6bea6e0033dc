#![deny(clippy::all)]

use crate::domain::GenerationConfig;
use crate::domain::request::FetchRequest;
use crate::domain::response::{CachedResponse, ExistsResponse};
use crate::domain::response::{DeleteResponse, GetResponse, PutResponse};
use crate::push::Notification;
use async_trait::async_trait;
use serde_json::Value;
use shared::Result;
use std::sync::Arc;

// Ports are the pluggable extension points the offline layer talks through

/// Port for creating one cache generation's storage from configuration
pub trait StorageFactory<K, V>: Send + Sync + 'static {
    fn create_from_config(&self, config: &GenerationConfig) -> Arc<dyn CacheStore<K, V>>;
}

/// Port for operations on a single cache generation (e.g., Moka, Foyer)
#[async_trait]
pub trait CacheStore<K, V>: Send + Sync + 'static {
    async fn exists(&self, key: &K) -> Result<ExistsResponse>;
    async fn put(&self, key: K, val: V) -> Result<PutResponse>;
    async fn get(&self, key: &K) -> Result<GetResponse<V>>;
    async fn delete(&self, key: &K) -> Result<DeleteResponse>;
    fn entry_count(&self) -> u64;
}

/// Port for the network. `Err(Error::Network)` means no response was obtained at all;
/// error statuses come back as `Ok`.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse>;
}

/// Port for the durable outbound queue replayed by background sync
#[async_trait]
pub trait SyncQueue: Send + Sync + 'static {
    async fn cart_items(&self) -> Result<Vec<Value>>;
    async fn push_cart_item(&self, item: Value) -> Result<()>;
    /// Drop the oldest `count` items; items queued after a snapshot survive
    async fn remove_cart_items(&self, count: usize) -> Result<()>;
    async fn pending_order(&self) -> Result<Option<Value>>;
    async fn set_pending_order(&self, order: Value) -> Result<()>;
    /// Clear the pending order only if it is still `sent`; returns whether it was cleared
    async fn clear_order_if(&self, sent: &Value) -> Result<bool>;
}

/// Port for surfacing notifications to connected clients
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn show(&self, notification: &Notification) -> Result<()>;
    async fn close(&self, notification_id: &str) -> Result<()>;
    async fn open_client(&self, url: &str) -> Result<()>;
}
