//! Per-route fetch strategies.
//!
//! - API: network first, write back in the background, cache then a 503 JSON body on failure.
//! - Static assets: cache first, network on miss, 404 text if both fail.
//! - Pages: network first, cache on failure, then the precached offline page for
//!   HTML navigations or a 404 text body otherwise.
//!
//! Network failures never escape these functions.

use crate::domain::CacheNames;
use crate::domain::request::FetchRequest;
use crate::domain::response::CachedResponse;
use crate::planes::control::GenerationOperations;
use crate::ports::Fetcher;
use serde_json::json;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

pub const OFFLINE_API_ERROR: &str = "Offline";
pub const OFFLINE_API_MESSAGE: &str =
    "You are offline and no cached data is available for this request";
pub const OFFLINE_ASSET_BODY: &str = "Asset not available offline";
pub const OFFLINE_PAGE_BODY: &str = "Page not available offline";

pub struct StrategyExecutor {
    generations: Arc<dyn GenerationOperations<String, CachedResponse>>,
    fetcher: Arc<dyn Fetcher>,
    names: CacheNames,
    offline_page: String,
    background: TaskTracker,
}

impl StrategyExecutor {
    pub fn new(
        generations: Arc<dyn GenerationOperations<String, CachedResponse>>,
        fetcher: Arc<dyn Fetcher>,
        names: CacheNames,
        offline_page: impl Into<String>,
    ) -> Self {
        Self {
            generations,
            fetcher,
            names,
            offline_page: offline_page.into(),
            background: TaskTracker::new(),
        }
    }

    pub async fn network_first_api(&self, request: &FetchRequest) -> CachedResponse {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.write_back_detached(&self.names.dynamic, &request.url, &response);
                }
                response
            }
            Err(e) => {
                debug!("API fetch for {} failed ({}), trying cache", request.url, e);
                match self.lookup(&request.url).await {
                    Some(cached) => cached,
                    None => CachedResponse::json(
                        503,
                        &json!({
                            "error": OFFLINE_API_ERROR,
                            "message": OFFLINE_API_MESSAGE,
                        }),
                    ),
                }
            }
        }
    }

    pub async fn cache_first_static(&self, request: &FetchRequest) -> CachedResponse {
        if let Some(cached) = self.lookup(&request.url).await {
            debug!("Static cache hit for {}", request.url);
            return cached;
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.write_back(&self.names.static_assets, &request.url, &response)
                        .await;
                }
                response
            }
            Err(e) => {
                debug!("Static fetch for {} failed: {}", request.url, e);
                CachedResponse::text(404, OFFLINE_ASSET_BODY)
            }
        }
    }

    pub async fn network_first_page(&self, request: &FetchRequest) -> CachedResponse {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.write_back(&self.names.dynamic, &request.url, &response)
                        .await;
                }
                response
            }
            Err(e) => {
                debug!("Page fetch for {} failed ({}), trying cache", request.url, e);
                if let Some(cached) = self.lookup(&request.url).await {
                    return cached;
                }
                if request.accepts_html() {
                    if let Some(offline) = self.lookup(&self.offline_page).await {
                        return offline;
                    }
                    warn!("Offline page '{}' is not precached", self.offline_page);
                }
                CachedResponse::text(404, OFFLINE_PAGE_BODY)
            }
        }
    }

    /// Wait until every background cache write has landed
    pub async fn settle(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }

    async fn lookup(&self, url: &str) -> Option<CachedResponse> {
        match self.generations.match_any(&url.to_string()).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache lookup for {} failed, treating as miss: {}", url, e);
                None
            }
        }
    }

    async fn write_back(&self, generation: &str, url: &str, response: &CachedResponse) {
        store_copy(
            self.generations.clone(),
            generation.to_string(),
            url.to_string(),
            response.clone(),
        )
        .await;
    }

    /// Cache write that does not hold up the response
    fn write_back_detached(&self, generation: &str, url: &str, response: &CachedResponse) {
        self.background.spawn(store_copy(
            self.generations.clone(),
            generation.to_string(),
            url.to_string(),
            response.clone(),
        ));
    }
}

async fn store_copy(
    generations: Arc<dyn GenerationOperations<String, CachedResponse>>,
    generation: String,
    url: String,
    response: CachedResponse,
) {
    let result = match generations.open(&generation).await {
        Ok(store) => store.put(url.clone(), response).await.map(|_| ()),
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => debug!("Cached {} in '{}'", url, generation),
        Err(e) => warn!("Failed to cache {} in '{}': {}", url, generation, e),
    }
}
