use std::sync::Arc;

use async_trait::async_trait;

use shared::Result;

use crate::{
    domain::response::admin::{
        DescribeGenerationResponse, DropGenerationResponse, ListGenerationsResponse,
    },
    ports::CacheStore,
};

/// Operations over the set of named cache generations
#[async_trait]
pub trait GenerationOperations<K, V>: Send + Sync + 'static {
    /// Open a generation, creating it if absent
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore<K, V>>>;
    async fn has(&self, name: &str) -> bool;
    async fn drop_generation(&self, name: &str) -> Result<DropGenerationResponse>;
    /// All generations, oldest first
    async fn list_generations(&self) -> Result<ListGenerationsResponse>;
    async fn describe_generation(&self, name: &str) -> Result<DescribeGenerationResponse>;
    /// Look a key up in every generation, oldest first; first hit wins
    async fn match_any(&self, key: &K) -> Result<Option<V>>;
}
