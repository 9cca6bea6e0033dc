pub mod request {
    use bytes::Bytes;

    /// A request as seen by the offline layer: method, path-and-query, headers, body
    #[derive(Clone, Debug)]
    pub struct FetchRequest {
        pub method: String,
        pub url: String,
        pub headers: Vec<(String, String)>,
        pub body: Bytes,
    }

    impl FetchRequest {
        pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
            Self {
                method: method.into(),
                url: url.into(),
                headers: Vec::new(),
                body: Bytes::new(),
            }
        }

        pub fn get(url: impl Into<String>) -> Self {
            Self::new("GET", url)
        }

        pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
            self.headers.push((name.into(), value.into()));
            self
        }

        pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
            self.body = body.into();
            self
        }

        pub fn is_get(&self) -> bool {
            self.method.eq_ignore_ascii_case("GET")
        }

        /// Path component only, without query string or fragment
        pub fn path(&self) -> &str {
            let end = self.url.find(['?', '#']).unwrap_or(self.url.len());
            &self.url[..end]
        }

        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn accepts_html(&self) -> bool {
            self.header("accept")
                .is_some_and(|accept| accept.contains("text/html"))
        }
    }
}

pub mod response {
    use bytes::Bytes;

    pub mod admin {
        use crate::domain::GenerationInfo;

        #[derive(Clone, Debug)]
        pub struct DropGenerationResponse {
            pub dropped: bool,
        }

        impl DropGenerationResponse {
            pub fn new(dropped: bool) -> Self {
                Self { dropped }
            }
        }

        #[derive(Clone, Debug)]
        pub struct ListGenerationsResponse {
            pub generations: Vec<GenerationInfo>,
        }

        impl ListGenerationsResponse {
            pub fn new(generations: Vec<GenerationInfo>) -> Self {
                Self { generations }
            }

            pub fn names(&self) -> Vec<&str> {
                self.generations
                    .iter()
                    .map(|g| g.config.name.as_str())
                    .collect()
            }
        }

        #[derive(Clone, Debug)]
        pub struct DescribeGenerationResponse {
            pub info: GenerationInfo,
        }

        impl DescribeGenerationResponse {
            pub fn new(info: GenerationInfo) -> Self {
                Self { info }
            }
        }
    }

    /// Full response snapshot; this is what a cache entry holds
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct CachedResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: Bytes,
    }

    impl CachedResponse {
        pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
            Self {
                status,
                headers,
                body: body.into(),
            }
        }

        pub fn json(status: u16, value: &serde_json::Value) -> Self {
            Self::new(
                status,
                vec![("content-type".to_string(), "application/json".to_string())],
                value.to_string(),
            )
        }

        pub fn text(status: u16, body: impl Into<String>) -> Self {
            Self::new(
                status,
                vec![(
                    "content-type".to_string(),
                    "text/plain; charset=utf-8".to_string(),
                )],
                body.into(),
            )
        }

        pub fn is_success(&self) -> bool {
            (200..=299).contains(&self.status)
        }

        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    #[derive(Clone, Debug)]
    pub struct PutResponse {
        pub created: bool,
    }

    impl PutResponse {
        pub fn new(created: bool) -> Self {
            Self { created }
        }
    }

    #[derive(Clone, Debug)]
    pub struct GetResponse<V> {
        pub found: bool,
        pub value: V,
    }

    impl<V> GetResponse<V> {
        pub fn new(found: bool, value: V) -> Self {
            Self { found, value }
        }
    }

    #[derive(Clone, Debug)]
    pub struct DeleteResponse {
        pub deleted: bool,
    }

    impl DeleteResponse {
        pub fn new(deleted: bool) -> Self {
            Self { deleted }
        }
    }

    #[derive(Clone, Debug)]
    pub struct ExistsResponse {
        pub exists: bool,
    }

    impl ExistsResponse {
        pub fn new(exists: bool) -> Self {
            Self { exists }
        }
    }
}

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct GenerationInfo {
    pub config: GenerationConfig,
    pub entry_count: u64,
}

impl GenerationInfo {
    pub fn new(config: GenerationConfig, entry_count: u64) -> Self {
        Self {
            config,
            entry_count,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub name: String,             // version-qualified generation name
    pub backend: StorageBackend,  // which store implementation backs it
    pub max_entries: Option<u64>, // None = unbounded (moka)
    pub capacity: u64,            // entry budget when max_entries is unset (foyer)
}

impl GenerationConfig {
    pub fn new(
        name: impl Into<String>,
        backend: StorageBackend,
        max_entries: Option<u64>,
        capacity: u64,
    ) -> Self {
        Self {
            name: name.into(),
            backend,
            max_entries,
            capacity,
        }
    }

    /// Same settings under another generation name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new("", StorageBackend::Moka, None, 10_000)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Moka,
    Foyer,
}

impl TryFrom<&str> for StorageBackend {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "moka" => Ok(StorageBackend::Moka),
            "foyer" => Ok(StorageBackend::Foyer),
            other => Err(format!(
                "Invalid storage backend '{}'. Must be 'moka' or 'foyer'",
                other
            )),
        }
    }
}

/// Names of the three cache generations for one deployment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheNames {
    pub general: String,
    pub static_assets: String,
    pub dynamic: String,
}

impl CacheNames {
    pub fn new(
        general: impl Into<String>,
        static_assets: impl Into<String>,
        dynamic: impl Into<String>,
    ) -> Self {
        Self {
            general: general.into(),
            static_assets: static_assets.into(),
            dynamic: dynamic.into(),
        }
    }

    pub fn for_version(prefix: &str, version: &str) -> Self {
        Self::new(
            format!("{prefix}-{version}"),
            format!("{prefix}-static-{version}"),
            format!("{prefix}-dynamic-{version}"),
        )
    }

    /// Generations that survive activation. The general-purpose name is not among them.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_assets || name == self.dynamic
    }
}

/// Everything the offline layer needs, injected once at startup
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub names: CacheNames,
    pub api_prefix: String,
    pub static_prefix: String,
    pub static_extensions: Vec<String>,
    pub precache_manifest: Vec<String>,
    pub offline_page: String,
    pub cart_sync_endpoint: String,
    pub order_sync_endpoint: String,
    pub generation_template: GenerationConfig,
}

impl WorkerConfig {
    pub fn for_version(prefix: &str, version: &str) -> Self {
        Self {
            names: CacheNames::for_version(prefix, version),
            api_prefix: "/api/".to_string(),
            static_prefix: "/static/".to_string(),
            static_extensions: vec![".js".to_string(), ".css".to_string()],
            precache_manifest: vec![
                "/".to_string(),
                "/static/js/bundle.js".to_string(),
                "/static/css/main.css".to_string(),
                "/manifest.json".to_string(),
                "/icons/icon-192x192.png".to_string(),
                "/icons/icon-512x512.png".to_string(),
                "/offline.html".to_string(),
            ],
            offline_page: "/offline.html".to_string(),
            cart_sync_endpoint: "/api/cart/sync".to_string(),
            order_sync_endpoint: "/api/orders/sync".to_string(),
            generation_template: GenerationConfig::default(),
        }
    }

    pub fn with_names(mut self, names: CacheNames) -> Self {
        self.names = names;
        self
    }

    pub fn with_manifest(mut self, manifest: Vec<String>) -> Self {
        self.precache_manifest = manifest;
        self
    }

    pub fn with_offline_page(mut self, offline_page: impl Into<String>) -> Self {
        self.offline_page = offline_page.into();
        self
    }

    pub fn with_generation_template(mut self, template: GenerationConfig) -> Self {
        self.generation_template = template;
        self
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::for_version("canna-bomb", "v1")
    }
}
