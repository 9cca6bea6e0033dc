use crate::domain::response::admin::{
    DescribeGenerationResponse, DropGenerationResponse, ListGenerationsResponse,
};
use crate::domain::{GenerationConfig, GenerationInfo};
use crate::planes::control::operation::GenerationOperations;
use crate::ports::{CacheStore, StorageFactory};
use async_trait::async_trait;
use shared::{Error, Result};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Entry containing both generation configuration and storage implementation
pub struct GenerationMetadata<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + 'static,
{
    pub config: GenerationConfig,
    pub store: Arc<dyn CacheStore<K, V>>,
    seq: u64,
}

/// CacheManager owns the named cache generations, each backed by an injected store
#[derive(Clone)]
pub struct CacheManager<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + 'static,
{
    // Maps generation name -> metadata (config + storage implementation)
    registry: Arc<RwLock<HashMap<String, GenerationMetadata<K, V>>>>,
    factory: Arc<dyn StorageFactory<K, V>>,
    template: GenerationConfig,
    next_seq: Arc<AtomicU64>,
}

impl<K, V> Debug for CacheManager<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("generations", &"<RwLock<HashMap>>")
            .field("template", &self.template)
            .finish()
    }
}

impl<K, V> CacheManager<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + Clone + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    /// New generations opened by name are built from `template` with the name swapped in
    pub fn new(factory: Arc<dyn StorageFactory<K, V>>, template: GenerationConfig) -> Self {
        Self {
            registry: Arc::new(RwLock::new(HashMap::new())),
            factory,
            template,
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stores of all generations, oldest first
    async fn ordered_stores(&self) -> Vec<Arc<dyn CacheStore<K, V>>> {
        let generations = self.registry.read().await;
        let mut entries: Vec<&GenerationMetadata<K, V>> = generations.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        let stores = entries.into_iter().map(|entry| entry.store.clone()).collect();
        stores
    }
}

#[async_trait]
impl<K, V> GenerationOperations<K, V> for CacheManager<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + Clone + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore<K, V>>> {
        if let Some(entry) = self.registry.read().await.get(name) {
            return Ok(entry.store.clone());
        }

        let mut generations = self.registry.write().await;
        // Another task may have created it between the two locks
        if let Some(entry) = generations.get(name) {
            return Ok(entry.store.clone());
        }

        let config = self.template.renamed(name);
        let store = self.factory.create_from_config(&config);
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        generations.insert(
            name.to_string(),
            GenerationMetadata {
                config,
                store: store.clone(),
                seq,
            },
        );
        tracing::debug!("Opened new cache generation '{}'", name);
        Ok(store)
    }

    async fn has(&self, name: &str) -> bool {
        self.registry.read().await.contains_key(name)
    }

    async fn drop_generation(&self, name: &str) -> Result<DropGenerationResponse> {
        let mut generations = self.registry.write().await;
        let dropped = generations.remove(name).is_some();
        Ok(DropGenerationResponse::new(dropped))
    }

    async fn list_generations(&self) -> Result<ListGenerationsResponse> {
        let generations = self.registry.read().await;
        let mut entries: Vec<&GenerationMetadata<K, V>> = generations.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        let infos = entries
            .into_iter()
            .map(|entry| GenerationInfo::new(entry.config.clone(), entry.store.entry_count()))
            .collect();
        Ok(ListGenerationsResponse::new(infos))
    }

    async fn describe_generation(&self, name: &str) -> Result<DescribeGenerationResponse> {
        let generations = self.registry.read().await;
        match generations.get(name) {
            Some(entry) => Ok(DescribeGenerationResponse::new(GenerationInfo::new(
                entry.config.clone(),
                entry.store.entry_count(),
            ))),
            None => Err(Error::GenerationNotFound(name.to_string())),
        }
    }

    async fn match_any(&self, key: &K) -> Result<Option<V>> {
        for store in self.ordered_stores().await {
            match store.get(key).await {
                Ok(hit) => return Ok(Some(hit.value)),
                Err(Error::NotFound) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}
