use crate::domain::WorkerConfig;
use crate::domain::request::FetchRequest;
use crate::domain::response::CachedResponse;
use crate::events::WorkerEvent;
use crate::planes::control::{
    ActivationReport, GenerationOperations, InstallReport, Lifecycle, WorkerState,
};
use crate::planes::data::{FetchHandler, RequestRouter, StrategyExecutor};
use crate::ports::{Fetcher, NotificationSink, SyncQueue};
use crate::push::{ClickOutcome, Notification, PushHandler};
use crate::sync::{SyncOutcome, SyncReplayer, SyncTag};
use serde_json::{Map, Value};
use shared::Result;
use std::sync::Arc;
use tokio::sync::broadcast;

/// The offline layer, assembled from one injected configuration.
/// Until activation it forwards every request untouched.
pub struct OfflineWorker {
    config: Arc<WorkerConfig>,
    generations: Arc<dyn GenerationOperations<String, CachedResponse>>,
    lifecycle: Lifecycle,
    fetch: FetchHandler,
    sync: SyncReplayer,
    push: PushHandler,
}

impl OfflineWorker {
    pub fn new(
        config: WorkerConfig,
        generations: Arc<dyn GenerationOperations<String, CachedResponse>>,
        fetcher: Arc<dyn Fetcher>,
        queue: Arc<dyn SyncQueue>,
        sink: Arc<dyn NotificationSink>,
        event_broadcaster: Option<broadcast::Sender<WorkerEvent>>,
    ) -> Self {
        let config = Arc::new(config);

        let lifecycle = Lifecycle::new(
            config.clone(),
            generations.clone(),
            fetcher.clone(),
            event_broadcaster.clone(),
        );
        let strategies = StrategyExecutor::new(
            generations.clone(),
            fetcher.clone(),
            config.names.clone(),
            config.offline_page.clone(),
        );
        let fetch = FetchHandler::new(
            RequestRouter::from_config(&config),
            strategies,
            fetcher.clone(),
        );
        let sync = SyncReplayer::new(
            queue,
            fetcher,
            config.cart_sync_endpoint.clone(),
            config.order_sync_endpoint.clone(),
            event_broadcaster,
        );

        Self {
            config,
            generations,
            lifecycle,
            fetch,
            sync,
            push: PushHandler::new(sink),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn generations(&self) -> &Arc<dyn GenerationOperations<String, CachedResponse>> {
        &self.generations
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle.state()
    }

    pub fn is_controlling(&self) -> bool {
        self.lifecycle.is_controlling()
    }

    /// Install and, skipping the waiting phase, activate right away
    pub async fn start(&self) -> Result<ActivationReport> {
        self.install().await?;
        self.activate().await
    }

    pub async fn install(&self) -> Result<InstallReport> {
        self.lifecycle.install().await
    }

    pub async fn activate(&self) -> Result<ActivationReport> {
        self.lifecycle.activate().await
    }

    pub fn retire(&self) {
        self.lifecycle.retire();
    }

    pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<CachedResponse> {
        if !self.lifecycle.is_controlling() {
            return self.fetch.passthrough(request).await;
        }
        self.fetch.handle(request).await
    }

    /// Wait for background cache writes started by earlier fetches
    pub async fn settle(&self) {
        self.fetch.settle().await;
    }

    pub async fn sync(&self, tag: SyncTag) -> Result<SyncOutcome> {
        self.sync.replay(tag).await
    }

    pub async fn enqueue_cart_item(&self, item: Value) -> Result<()> {
        self.sync.queue().push_cart_item(item).await
    }

    pub async fn set_pending_order(&self, order: Value) -> Result<()> {
        self.sync.queue().set_pending_order(order).await
    }

    pub async fn push(&self, raw: Option<&[u8]>) -> Result<Notification> {
        self.push.on_push(raw).await
    }

    pub async fn click(
        &self,
        notification_id: &str,
        action: Option<&str>,
        data: &Map<String, Value>,
    ) -> Result<ClickOutcome> {
        self.push.on_click(notification_id, action, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GenerationConfig;
    use crate::persistence::MemorySyncQueue;
    use crate::planes::control::CacheManager;
    use crate::test_support::{FakeFetcher, MemoryStorageFactory, RecordingSink};
    use serde_json::json;

    fn worker(fetcher: Arc<FakeFetcher>) -> OfflineWorker {
        let config = WorkerConfig::for_version("canna-bomb", "v9")
            .with_manifest(vec!["/".into(), "/offline.html".into()]);
        OfflineWorker::new(
            config,
            Arc::new(CacheManager::new(
                Arc::new(MemoryStorageFactory),
                GenerationConfig::default(),
            )),
            fetcher,
            Arc::new(MemorySyncQueue::default()),
            Arc::new(RecordingSink::default()),
            None,
        )
    }

    fn shell(fetcher: &FakeFetcher) {
        fetcher.respond("/", CachedResponse::text(200, "<html>home</html>"));
        fetcher.respond("/offline.html", CachedResponse::text(200, "<html>offline</html>"));
    }

    #[tokio::test]
    async fn not_intercepting_before_activation() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.set_online(false);
        let worker = worker(fetcher);

        // Without control, an offline GET fails like a plain network request
        assert!(worker.handle_fetch(&FetchRequest::get("/api/products")).await.is_err());
    }

    #[tokio::test]
    async fn start_then_serve_offline_page() {
        let fetcher = Arc::new(FakeFetcher::default());
        shell(&fetcher);
        let worker = worker(fetcher.clone());

        let report = worker.start().await.unwrap();
        assert!(report.deleted.is_empty());
        assert_eq!(worker.state(), WorkerState::Activated);

        fetcher.set_online(false);
        let response = worker
            .handle_fetch(&FetchRequest::get("/strains/kush").with_header("accept", "text/html"))
            .await
            .unwrap();
        assert_eq!(response.body, "<html>offline</html>");
    }

    #[tokio::test]
    async fn queued_cart_is_replayed() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.respond("/api/cart/sync", CachedResponse::text(200, "ok"));
        let worker = worker(fetcher.clone());

        worker.enqueue_cart_item(json!({"sku": "GG4"})).await.unwrap();
        assert_eq!(
            worker.sync(SyncTag::Cart).await.unwrap(),
            SyncOutcome::Replayed { items: 1 }
        );
        assert_eq!(worker.sync(SyncTag::Cart).await.unwrap(), SyncOutcome::Empty);
    }

    #[tokio::test]
    async fn push_without_payload_uses_defaults() {
        let worker = worker(Arc::new(FakeFetcher::default()));
        let notification = worker.push(None).await.unwrap();
        assert_eq!(notification.title, "Canna Bomb");

        let outcome = worker
            .click(&notification.id, None, &notification.data)
            .await
            .unwrap();
        assert_eq!(outcome, ClickOutcome::Navigate("/".into()));
    }
}
