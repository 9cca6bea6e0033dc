use crate::domain::WorkerConfig;
use crate::domain::request::FetchRequest;
use crate::domain::response::CachedResponse;
use crate::events::{
    ClientsClaimedEvent, GenerationDeletedEvent, WorkerEvent, now_timestamp, publish,
};
use crate::planes::control::operation::GenerationOperations;
use crate::ports::Fetcher;
use futures::future::try_join_all;
use serde::Serialize;
use shared::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, broadcast};
use tracing::{error, info, warn};

/// Worker lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Nothing installed yet, or the last install failed
    Parsed,
    Installing,
    Installed,
    Activating,
    /// Active and intercepting requests
    Activated,
    /// Superseded by a newer deployment
    Redundant,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerState::Parsed => write!(f, "parsed"),
            WorkerState::Installing => write!(f, "installing"),
            WorkerState::Installed => write!(f, "installed"),
            WorkerState::Activating => write!(f, "activating"),
            WorkerState::Activated => write!(f, "activated"),
            WorkerState::Redundant => write!(f, "redundant"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub generation: String,
    pub precached: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivationReport {
    pub retained: Vec<String>,
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

/// Creates and retires cache generations across deployments
pub struct Lifecycle {
    config: Arc<WorkerConfig>,
    generations: Arc<dyn GenerationOperations<String, CachedResponse>>,
    fetcher: Arc<dyn Fetcher>,
    state: RwLock<WorkerState>,
    controlling: AtomicBool,
    // Serializes install/activate against each other
    transition: Mutex<()>,
    event_broadcaster: Option<broadcast::Sender<WorkerEvent>>,
}

impl Lifecycle {
    pub fn new(
        config: Arc<WorkerConfig>,
        generations: Arc<dyn GenerationOperations<String, CachedResponse>>,
        fetcher: Arc<dyn Fetcher>,
        event_broadcaster: Option<broadcast::Sender<WorkerEvent>>,
    ) -> Self {
        Self {
            config,
            generations,
            fetcher,
            state: RwLock::new(WorkerState::Parsed),
            controlling: AtomicBool::new(false),
            transition: Mutex::new(()),
            event_broadcaster,
        }
    }

    pub fn state(&self) -> WorkerState {
        match self.state.read() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_state(&self, new_state: WorkerState) {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *state != new_state {
            tracing::debug!("Worker state {} -> {}", *state, new_state);
            *state = new_state;
        }
    }

    /// True once activation has claimed clients
    pub fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::Acquire)
    }

    /// Precache the manifest into the static generation. Nothing is committed unless
    /// every manifest URL fetched successfully.
    pub async fn install(&self) -> Result<InstallReport> {
        let _guard = self.transition.lock().await;

        match self.state() {
            WorkerState::Parsed | WorkerState::Installed | WorkerState::Activated => {}
            other => {
                return Err(Error::Lifecycle(format!("cannot install while {other}")));
            }
        }
        let previous = self.state();
        self.set_state(WorkerState::Installing);

        let generation = self.config.names.static_assets.clone();
        info!(
            "Installing: precaching {} URL(s) into '{}'",
            self.config.precache_manifest.len(),
            generation
        );

        let fetched = match try_join_all(
            self.config
                .precache_manifest
                .iter()
                .map(|url| self.precache_one(url)),
        )
        .await
        {
            Ok(fetched) => fetched,
            Err(e) => {
                error!("Install failed, nothing precached: {}", e);
                self.set_state(previous);
                return Err(e);
            }
        };

        let store = match self.generations.open(&generation).await {
            Ok(store) => store,
            Err(e) => {
                error!("Install failed opening '{}': {}", generation, e);
                self.set_state(previous);
                return Err(e);
            }
        };
        let precached = fetched.len();
        for (url, response) in fetched {
            if let Err(e) = store.put(url.clone(), response).await {
                error!("Install failed storing '{}': {}", url, e);
                self.set_state(previous);
                return Err(e);
            }
        }

        // Skip waiting: an installed worker becomes eligible for activation at once
        self.set_state(if previous == WorkerState::Activated {
            WorkerState::Activated
        } else {
            WorkerState::Installed
        });
        info!("Installed: {} URL(s) precached into '{}'", precached, generation);

        Ok(InstallReport {
            generation,
            precached,
        })
    }

    async fn precache_one(&self, url: &str) -> Result<(String, CachedResponse)> {
        let response = self
            .fetcher
            .fetch(&FetchRequest::get(url))
            .await
            .map_err(|e| Error::Precache {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(Error::Precache {
                url: url.to_string(),
                reason: format!("status {}", response.status),
            });
        }
        Ok((url.to_string(), response))
    }

    /// Delete every stale generation, then claim clients. Deletion is best-effort:
    /// one failure does not stop the others.
    pub async fn activate(&self) -> Result<ActivationReport> {
        let _guard = self.transition.lock().await;

        if self.state() != WorkerState::Installed {
            return Err(Error::Lifecycle(format!(
                "cannot activate while {}",
                self.state()
            )));
        }
        self.set_state(WorkerState::Activating);

        let mut report = ActivationReport::default();
        let listing = match self.generations.list_generations().await {
            Ok(listing) => listing,
            Err(e) => {
                self.set_state(WorkerState::Installed);
                return Err(e);
            }
        };

        for info in listing.generations {
            let name = info.config.name;
            if self.config.names.is_current(&name) {
                report.retained.push(name);
                continue;
            }

            match self.generations.drop_generation(&name).await {
                Ok(_) => {
                    info!("Deleted stale cache generation '{}'", name);
                    publish(
                        self.event_broadcaster.as_ref(),
                        WorkerEvent::GenerationDeleted(GenerationDeletedEvent {
                            name: name.clone(),
                            timestamp: now_timestamp(),
                        }),
                    );
                    report.deleted.push(name);
                }
                Err(e) => {
                    warn!("Failed to delete stale generation '{}': {}", name, e);
                    report.failed.push(name);
                }
            }
        }

        self.set_state(WorkerState::Activated);
        self.controlling.store(true, Ordering::Release);
        info!(
            "Activated: {} generation(s) deleted, now controlling clients",
            report.deleted.len()
        );
        publish(
            self.event_broadcaster.as_ref(),
            WorkerEvent::ClientsClaimed(ClientsClaimedEvent {
                generation: self.config.names.static_assets.clone(),
                timestamp: now_timestamp(),
            }),
        );

        Ok(report)
    }

    /// Stop intercepting; a newer deployment has taken over
    pub fn retire(&self) {
        self.controlling.store(false, Ordering::Release);
        self.set_state(WorkerState::Redundant);
        info!("Worker retired");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::response::admin::{
        DescribeGenerationResponse, DropGenerationResponse, ListGenerationsResponse,
    };
    use crate::domain::{CacheNames, GenerationConfig};
    use crate::planes::control::CacheManager;
    use crate::ports::CacheStore;
    use crate::test_support::{FakeFetcher, MemoryStorageFactory};
    use async_trait::async_trait;

    fn manager() -> Arc<CacheManager<String, CachedResponse>> {
        Arc::new(CacheManager::new(
            Arc::new(MemoryStorageFactory),
            GenerationConfig::default(),
        ))
    }

    fn config(manifest: &[&str]) -> Arc<WorkerConfig> {
        Arc::new(
            WorkerConfig::default()
                .with_names(CacheNames::new("general-v2", "static-v2", "dynamic-v2"))
                .with_manifest(manifest.iter().map(|s| s.to_string()).collect()),
        )
    }

    #[tokio::test]
    async fn install_precaches_every_manifest_url() {
        let manifest = ["/", "/static/js/bundle.js", "/manifest.json", "/offline.html"];
        let fetcher = Arc::new(FakeFetcher::default());
        for url in manifest {
            fetcher.respond(url, CachedResponse::text(200, format!("body of {url}")));
        }
        let generations = manager();
        let lifecycle = Lifecycle::new(config(&manifest), generations.clone(), fetcher, None);

        let report = lifecycle.install().await.unwrap();
        assert_eq!(report.precached, manifest.len());
        assert_eq!(lifecycle.state(), WorkerState::Installed);

        let store = generations.open("static-v2").await.unwrap();
        for url in manifest {
            let hit = store.get(&url.to_string()).await.unwrap();
            assert!(!hit.value.body.is_empty());
        }
    }

    #[tokio::test]
    async fn install_commits_nothing_when_one_url_fails() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.respond("/", CachedResponse::text(200, "home"));
        fetcher.respond("/missing.png", CachedResponse::text(404, "nope"));
        let generations = manager();
        let lifecycle = Lifecycle::new(
            config(&["/", "/missing.png"]),
            generations.clone(),
            fetcher,
            None,
        );

        let err = lifecycle.install().await.unwrap_err();
        assert!(matches!(err, Error::Precache { ref url, .. } if url == "/missing.png"));
        assert_eq!(lifecycle.state(), WorkerState::Parsed);
        assert!(!generations.has("static-v2").await);
    }

    #[tokio::test]
    async fn install_fails_when_network_is_down() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.respond("/", CachedResponse::text(200, "home"));
        fetcher.set_online(false);
        let lifecycle = Lifecycle::new(config(&["/"]), manager(), fetcher.clone(), None);

        assert!(matches!(
            lifecycle.install().await,
            Err(Error::Precache { .. })
        ));

        // A later attempt can succeed
        fetcher.set_online(true);
        assert!(lifecycle.install().await.is_ok());
    }

    #[tokio::test]
    async fn activate_requires_install() {
        let lifecycle = Lifecycle::new(config(&[]), manager(), Arc::new(FakeFetcher::default()), None);
        assert!(matches!(lifecycle.activate().await, Err(Error::Lifecycle(_))));
        assert!(!lifecycle.is_controlling());
    }

    #[tokio::test]
    async fn activate_deletes_stale_generations() {
        let generations = manager();
        for name in ["old-v1", "static-v2", "dynamic-v2"] {
            generations.open(name).await.unwrap();
        }
        let (tx, mut rx) = broadcast::channel(16);
        let lifecycle = Lifecycle::new(
            config(&[]),
            generations.clone(),
            Arc::new(FakeFetcher::default()),
            Some(tx),
        );
        lifecycle.install().await.unwrap();

        let report = lifecycle.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["old-v1"]);
        assert!(!generations.has("old-v1").await);
        assert!(generations.has("static-v2").await);
        assert!(generations.has("dynamic-v2").await);
        assert!(lifecycle.is_controlling());
        assert_eq!(lifecycle.state(), WorkerState::Activated);

        assert_eq!(rx.recv().await.unwrap().kind(), "generation_deleted");
        assert_eq!(rx.recv().await.unwrap().kind(), "clients_claimed");
    }

    #[tokio::test]
    async fn general_purpose_generation_is_not_retained() {
        let generations = manager();
        generations.open("general-v2").await.unwrap();
        let lifecycle = Lifecycle::new(
            config(&[]),
            generations.clone(),
            Arc::new(FakeFetcher::default()),
            None,
        );
        lifecycle.install().await.unwrap();
        let report = lifecycle.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["general-v2"]);
    }

    /// Refuses to delete one particular generation
    struct StubbornGenerations {
        inner: Arc<CacheManager<String, CachedResponse>>,
        stuck: &'static str,
    }

    #[async_trait]
    impl GenerationOperations<String, CachedResponse> for StubbornGenerations {
        async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore<String, CachedResponse>>> {
            self.inner.open(name).await
        }
        async fn has(&self, name: &str) -> bool {
            self.inner.has(name).await
        }
        async fn drop_generation(&self, name: &str) -> Result<DropGenerationResponse> {
            if name == self.stuck {
                return Err(Error::Internal("disk busy".into()));
            }
            self.inner.drop_generation(name).await
        }
        async fn list_generations(&self) -> Result<ListGenerationsResponse> {
            self.inner.list_generations().await
        }
        async fn describe_generation(&self, name: &str) -> Result<DescribeGenerationResponse> {
            self.inner.describe_generation(name).await
        }
        async fn match_any(&self, key: &String) -> Result<Option<CachedResponse>> {
            self.inner.match_any(key).await
        }
    }

    #[tokio::test]
    async fn one_failed_delete_does_not_block_the_rest() {
        let inner = manager();
        for name in ["old-v0", "old-v1", "static-v2"] {
            inner.open(name).await.unwrap();
        }
        let generations = Arc::new(StubbornGenerations {
            inner: inner.clone(),
            stuck: "old-v0",
        });
        let lifecycle = Lifecycle::new(
            config(&[]),
            generations,
            Arc::new(FakeFetcher::default()),
            None,
        );
        lifecycle.install().await.unwrap();

        let report = lifecycle.activate().await.unwrap();
        assert_eq!(report.failed, vec!["old-v0"]);
        assert_eq!(report.deleted, vec!["old-v1"]);
        assert!(!inner.has("old-v1").await);
        assert!(lifecycle.is_controlling());
    }

    #[tokio::test]
    async fn retire_stops_controlling() {
        let lifecycle = Lifecycle::new(config(&[]), manager(), Arc::new(FakeFetcher::default()), None);
        lifecycle.install().await.unwrap();
        lifecycle.activate().await.unwrap();
        lifecycle.retire();
        assert_eq!(lifecycle.state(), WorkerState::Redundant);
        assert!(!lifecycle.is_controlling());
    }
}
