use async_trait::async_trait;
use canna::domain::response::{DeleteResponse, ExistsResponse, GetResponse, PutResponse};
use canna::ports::CacheStore;
use moka::future::Cache;
use shared::{Error, Result};
use std::fmt::Debug;
use std::hash::Hash;

/// Moka-backed cache generation.
/// Entries carry no TTL: they stay until overwritten, evicted by the optional
/// capacity bound, or dropped with the whole generation.
pub struct MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    cache: Cache<K, V>,
}

impl<K, V> MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    /// Create a Moka cache from name and optional capacity
    /// Used by the storage factory
    pub fn new(name: String, max_entries: Option<u64>) -> Self {
        let mut builder = Cache::builder().name(&name);

        if let Some(capacity) = max_entries {
            builder = builder.max_capacity(capacity);
        }

        Self {
            cache: builder.build(),
        }
    }
}

#[async_trait]
impl<K, V> CacheStore<K, V> for MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    async fn exists(&self, key: &K) -> Result<ExistsResponse> {
        Ok(ExistsResponse::new(self.cache.contains_key(key)))
    }

    async fn put(&self, key: K, val: V) -> Result<PutResponse> {
        let created = !self.cache.contains_key(&key);
        self.cache.insert(key, val).await;
        Ok(PutResponse::new(created))
    }

    async fn get(&self, key: &K) -> Result<GetResponse<V>> {
        match self.cache.get(key).await {
            Some(value) => Ok(GetResponse::new(true, value)),
            None => Err(Error::NotFound),
        }
    }

    async fn delete(&self, key: &K) -> Result<DeleteResponse> {
        let existed = self.cache.remove(key).await.is_some();
        Ok(DeleteResponse::new(existed))
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl<K, V> Debug for MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use canna::domain::response::CachedResponse;
    use tokio::time::{Duration, sleep};

    #[tokio::test]
    async fn test_moka_cache_put_and_get_response() {
        let cache = MokaCache::new("static-v1".to_string(), None);

        let key = "/static/js/bundle.js".to_string();
        let response = CachedResponse::text(200, "console.log('hi')");
        let put_response = cache.put(key.clone(), response.clone()).await.unwrap();
        assert!(put_response.created);

        let get_response = cache.get(&key).await.unwrap();
        assert!(get_response.found);
        assert_eq!(get_response.value, response);
        assert!(cache.exists(&key).await.unwrap().exists);
    }

    #[tokio::test]
    async fn test_moka_cache_delete() {
        let cache = MokaCache::new("test".to_string(), None);

        cache.put("test_key", "test_value").await.unwrap();

        let delete_response = cache.delete(&"test_key").await.unwrap();
        assert!(delete_response.deleted);

        let result = cache.get(&"test_key").await;
        assert!(matches!(result.unwrap_err(), Error::NotFound));
        assert!(!cache.delete(&"test_key").await.unwrap().deleted);
    }

    #[tokio::test]
    async fn test_moka_cache_get_nonexistent() {
        let cache: MokaCache<&str, &str> = MokaCache::new("test".to_string(), None);

        let result = cache.get(&"nonexistent").await;
        assert!(matches!(result.unwrap_err(), Error::NotFound));
        assert!(!cache.exists(&"nonexistent").await.unwrap().exists);
    }

    #[tokio::test]
    async fn test_moka_cache_overwrite_is_whole_entry() {
        let cache = MokaCache::new("dynamic-v1".to_string(), None);
        let key = "/api/products".to_string();

        let first = cache
            .put(key.clone(), CachedResponse::text(200, "v1"))
            .await
            .unwrap();
        assert!(first.created);
        let second = cache
            .put(key.clone(), CachedResponse::text(200, "v2"))
            .await
            .unwrap();
        assert!(!second.created);

        let get_response = cache.get(&key).await.unwrap();
        assert_eq!(get_response.value.body, Bytes::from("v2"));
    }

    #[tokio::test]
    async fn test_moka_cache_bounded() {
        let cache = MokaCache::new("bounded".to_string(), Some(2));

        cache.put("key1", "value1").await.unwrap();
        cache.put("key2", "value2").await.unwrap();
        cache.put("key3", "value3").await.unwrap();

        cache.cache.run_pending_tasks().await;
        sleep(Duration::from_millis(50)).await;
        cache.cache.run_pending_tasks().await;

        assert!(cache.entry_count() <= 2, "Cache should have at most 2 entries");
    }
}
