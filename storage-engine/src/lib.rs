mod moka_cache;

use async_trait::async_trait;
use canna::domain::response::{DeleteResponse, ExistsResponse, GetResponse, PutResponse};
use canna::domain::{GenerationConfig, StorageBackend};
use canna::ports::{CacheStore, StorageFactory};
use foyer::{Cache, CacheBuilder};
use shared::{Error, Result};
use std::sync::Arc;
use std::{fmt::Debug, hash::Hash};

pub use moka_cache::MokaCache;

/// Foyer-based in-memory cache generation
pub struct FoyerCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    cache: Arc<Cache<K, V>>,
}

impl<K, V> FoyerCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    /// Create a new Foyer in-memory cache; foyer weighs every entry as 1,
    /// so the capacity is an entry budget
    pub fn new(name: String, capacity: usize) -> Self {
        let cache = CacheBuilder::new(capacity).with_name(name).build();

        Self {
            cache: Arc::new(cache),
        }
    }
}

#[async_trait]
impl<K, V> CacheStore<K, V> for FoyerCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    async fn exists(&self, key: &K) -> Result<ExistsResponse> {
        Ok(ExistsResponse::new(self.cache.contains(key)))
    }

    async fn put(&self, key: K, val: V) -> Result<PutResponse> {
        let created = !self.cache.contains(&key);
        self.cache.insert(key, val);
        Ok(PutResponse::new(created))
    }

    async fn get(&self, key: &K) -> Result<GetResponse<V>> {
        match self.cache.get(key) {
            Some(entry) => {
                let value = entry.value();
                Ok(GetResponse::new(true, value.clone()))
            }
            None => Err(Error::NotFound),
        }
    }

    async fn delete(&self, key: &K) -> Result<DeleteResponse> {
        let existed = self.cache.remove(key).is_some();
        Ok(DeleteResponse::new(existed))
    }

    fn entry_count(&self) -> u64 {
        self.cache.usage() as u64
    }
}

impl<K, V> Debug for FoyerCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoyerCache")
            .field("cache", &"<foyer::Cache>")
            .finish()
    }
}

/// Builds each generation's store from its configured backend
#[derive(Debug, Default, Clone, Copy)]
pub struct UnifiedStorageFactory;

impl<K, V> StorageFactory<K, V> for UnifiedStorageFactory
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    fn create_from_config(&self, config: &GenerationConfig) -> Arc<dyn CacheStore<K, V>> {
        tracing::debug!(
            "Creating {:?} store for generation '{}'",
            config.backend,
            config.name
        );
        match config.backend {
            StorageBackend::Moka => {
                Arc::new(MokaCache::new(config.name.clone(), config.max_entries))
            }
            StorageBackend::Foyer => {
                Arc::new(FoyerCache::new(config.name.clone(), foyer_capacity(config)))
            }
        }
    }
}

/// Foyer always needs a bound: an explicit entry limit wins over the default budget
fn foyer_capacity(config: &GenerationConfig) -> usize {
    config
        .max_entries
        .unwrap_or(config.capacity)
        .try_into()
        .unwrap_or(usize::MAX)
}
