use crate::domain::GenerationConfig;
use crate::domain::request::FetchRequest;
use crate::domain::response::{
    CachedResponse, DeleteResponse, ExistsResponse, GetResponse, PutResponse,
};
use crate::ports::{CacheStore, Fetcher, NotificationSink, StorageFactory};
use crate::push::Notification;
use async_trait::async_trait;
use shared::{Error, Result};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// HashMap-backed generation store
#[derive(Debug)]
pub struct MemoryStore<K, V> {
    entries: tokio::sync::RwLock<HashMap<K, V>>,
}

impl<K, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self {
            entries: tokio::sync::RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<K, V> CacheStore<K, V> for MemoryStore<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn exists(&self, key: &K) -> Result<ExistsResponse> {
        Ok(ExistsResponse::new(self.entries.read().await.contains_key(key)))
    }

    async fn put(&self, key: K, val: V) -> Result<PutResponse> {
        let created = self.entries.write().await.insert(key, val).is_none();
        Ok(PutResponse::new(created))
    }

    async fn get(&self, key: &K) -> Result<GetResponse<V>> {
        match self.entries.read().await.get(key) {
            Some(value) => Ok(GetResponse::new(true, value.clone())),
            None => Err(Error::NotFound),
        }
    }

    async fn delete(&self, key: &K) -> Result<DeleteResponse> {
        Ok(DeleteResponse::new(
            self.entries.write().await.remove(key).is_some(),
        ))
    }

    fn entry_count(&self) -> u64 {
        self.entries.try_read().map(|e| e.len() as u64).unwrap_or(0)
    }
}

pub struct MemoryStorageFactory;

impl<K, V> StorageFactory<K, V> for MemoryStorageFactory
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn create_from_config(&self, _config: &GenerationConfig) -> Arc<dyn CacheStore<K, V>> {
        Arc::new(MemoryStore::<K, V>::default())
    }
}

/// Scripted network: fixed responses per URL, an online switch and a call log
#[derive(Default)]
pub struct FakeFetcher {
    responses: Mutex<HashMap<String, CachedResponse>>,
    requests: Mutex<Vec<FetchRequest>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn respond(&self, url: &str, response: CachedResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("connection refused".into()));
        }
        let response = self.responses.lock().unwrap().get(&request.url).cloned();
        Ok(response.unwrap_or_else(|| CachedResponse::text(404, "not found upstream")))
    }
}

/// Notification sink that remembers what it was asked to do
#[derive(Default)]
pub struct RecordingSink {
    shown: tokio::sync::Mutex<Vec<Notification>>,
    closed: tokio::sync::Mutex<Vec<String>>,
    opened: tokio::sync::Mutex<Vec<String>>,
}

impl RecordingSink {
    pub async fn shown(&self) -> Vec<Notification> {
        self.shown.lock().await.clone()
    }

    pub async fn closed(&self) -> Vec<String> {
        self.closed.lock().await.clone()
    }

    pub async fn opened(&self) -> Vec<String> {
        self.opened.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn show(&self, notification: &Notification) -> Result<()> {
        self.shown.lock().await.push(notification.clone());
        Ok(())
    }

    async fn close(&self, notification_id: &str) -> Result<()> {
        self.closed.lock().await.push(notification_id.to_string());
        Ok(())
    }

    async fn open_client(&self, url: &str) -> Result<()> {
        self.opened.lock().await.push(url.to_string());
        Ok(())
    }
}
