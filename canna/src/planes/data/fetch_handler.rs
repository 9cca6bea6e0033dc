use crate::domain::request::FetchRequest;
use crate::domain::response::CachedResponse;
use crate::planes::data::router::{RequestRouter, Route};
use crate::planes::data::strategies::StrategyExecutor;
use crate::ports::Fetcher;
use shared::Result;
use std::sync::Arc;
use tracing::debug;

/// Routes each request to its strategy
pub struct FetchHandler {
    router: RequestRouter,
    strategies: StrategyExecutor,
    fetcher: Arc<dyn Fetcher>,
}

impl FetchHandler {
    pub fn new(router: RequestRouter, strategies: StrategyExecutor, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            router,
            strategies,
            fetcher,
        }
    }

    /// Only pass-through requests can fail; every intercepted route recovers locally
    pub async fn handle(&self, request: &FetchRequest) -> Result<CachedResponse> {
        let route = self.router.classify(request);
        debug!("{} {} -> {:?}", request.method, request.url, route);

        match route {
            Route::Passthrough => self.passthrough(request).await,
            Route::Api => Ok(self.strategies.network_first_api(request).await),
            Route::StaticAsset => Ok(self.strategies.cache_first_static(request).await),
            Route::Page => Ok(self.strategies.network_first_page(request).await),
        }
    }

    pub async fn passthrough(&self, request: &FetchRequest) -> Result<CachedResponse> {
        self.fetcher.fetch(request).await
    }

    pub async fn settle(&self) {
        self.strategies.settle().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CacheNames, GenerationConfig};
    use crate::planes::control::CacheManager;
    use crate::test_support::{FakeFetcher, MemoryStorageFactory};
    use shared::Error;

    fn handler(fetcher: Arc<FakeFetcher>) -> FetchHandler {
        let generations = Arc::new(CacheManager::new(
            Arc::new(MemoryStorageFactory),
            GenerationConfig::default(),
        ));
        let strategies = StrategyExecutor::new(
            generations,
            fetcher.clone(),
            CacheNames::for_version("test", "v1"),
            "/offline.html",
        );
        FetchHandler::new(RequestRouter::default(), strategies, fetcher)
    }

    #[tokio::test]
    async fn post_goes_straight_to_network() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.respond("/api/orders", CachedResponse::text(201, "created"));
        let handler = handler(fetcher.clone());

        let response = handler
            .handle(&FetchRequest::new("POST", "/api/orders").with_body("{}"))
            .await
            .unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(fetcher.requests()[0].method, "POST");
    }

    #[tokio::test]
    async fn post_offline_is_an_error_not_a_synthesized_response() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.set_online(false);
        let handler = handler(fetcher);

        let result = handler.handle(&FetchRequest::new("POST", "/api/orders")).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn get_routes_never_fail() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.set_online(false);
        let handler = handler(fetcher);

        for (url, status) in [("/api/x", 503), ("/static/x.png", 404), ("/x", 404)] {
            let response = handler.handle(&FetchRequest::get(url)).await.unwrap();
            assert_eq!(response.status, status, "{url}");
        }
    }
}
