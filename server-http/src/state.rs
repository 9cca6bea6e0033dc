use canna::domain::response::CachedResponse;
use canna::domain::{CacheNames, GenerationConfig, StorageBackend, WorkerConfig};
use canna::events::{BroadcastNotificationSink, WorkerEvent};
use canna::persistence::{MemorySyncQueue, SledSyncQueue};
use canna::planes::control::CacheManager;
use canna::ports::{Fetcher, SyncQueue};
use canna::OfflineWorker;
use shared::config::Config;
use std::path::Path;
use std::sync::Arc;
use storage_engine::UnifiedStorageFactory;
use tokio::sync::broadcast;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub worker: Arc<OfflineWorker>,
    pub event_channel: broadcast::Sender<WorkerEvent>,
    pub upstream: String,
}

impl AppState {
    /// Build the state around an already configured upstream client
    pub fn with_fetcher(config: &Config, fetcher: Arc<dyn Fetcher>) -> Self {
        // Try to initialize with persistence, fall back to in-memory if it fails
        let queue: Arc<dyn SyncQueue> = match Self::init_with_persistence(config) {
            Ok(queue) => {
                tracing::info!("Sync queue initialized with persistence enabled");
                queue
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize persistence: {}. Queued mutations will not survive a restart.",
                    e
                );
                Arc::new(MemorySyncQueue::default())
            }
        };

        // Create broadcast channel for SSE events (1000 event buffer capacity)
        let (event_tx, _event_rx) = broadcast::channel(1000);

        let template = generation_template(config);
        let generations = Arc::new(CacheManager::<String, CachedResponse>::new(
            Arc::new(UnifiedStorageFactory),
            template.clone(),
        ));

        let worker_config = WorkerConfig::default()
            .with_names(CacheNames::for_version(
                &config.cache_prefix,
                &config.cache_version,
            ))
            .with_manifest(config.precache_manifest.clone())
            .with_offline_page(config.offline_page.clone())
            .with_generation_template(template);

        let worker = OfflineWorker::new(
            worker_config,
            generations,
            fetcher,
            queue,
            Arc::new(BroadcastNotificationSink::new(event_tx.clone())),
            Some(event_tx.clone()),
        );

        Self {
            worker: Arc::new(worker),
            event_channel: event_tx,
            upstream: config.upstream_url.clone(),
        }
    }

    fn init_with_persistence(config: &Config) -> shared::Result<Arc<dyn SyncQueue>> {
        let persistence_path = Path::new(&config.data_dir)
            .join(".canna")
            .join("sync.sled");

        Ok(Arc::new(SledSyncQueue::new(persistence_path)?))
    }
}

/// Settings every generation is created with
fn generation_template(config: &Config) -> GenerationConfig {
    let backend = StorageBackend::try_from(config.cache_backend.as_str()).unwrap_or_else(|e| {
        tracing::warn!("{}. Falling back to moka.", e);
        StorageBackend::Moka
    });
    GenerationConfig::new("", backend, config.cache_max_entries, config.cache_capacity)
}
