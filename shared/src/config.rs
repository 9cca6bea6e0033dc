use tracing::warn;

pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub upstream_url: String,
    pub cache_prefix: String,
    pub cache_version: String,
    pub cache_backend: String,
    pub cache_max_entries: Option<u64>,
    pub cache_capacity: u64,
    pub data_dir: String,
    pub precache_manifest: Vec<String>,
    pub offline_page: String,
    pub probe_interval_secs: u64,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_UPSTREAM_URL: &str = "http://localhost:3000";
    const DEFAULT_CACHE_PREFIX: &str = "canna-bomb";
    const DEFAULT_CACHE_VERSION: &str = "v1";
    const DEFAULT_CACHE_BACKEND: &str = "moka";
    const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
    const DEFAULT_DATA_DIR: &str = "./data";
    const DEFAULT_OFFLINE_PAGE: &str = "/offline.html";
    const DEFAULT_PROBE_INTERVAL_SECS: u64 = 30;

    /// App shell fetched at install time
    pub const DEFAULT_PRECACHE: [&str; 7] = [
        "/",
        "/static/js/bundle.js",
        "/static/css/main.css",
        "/manifest.json",
        "/icons/icon-192x192.png",
        "/icons/icon-512x512.png",
        "/offline.html",
    ];

    pub fn from_env() -> Self {
        let host = std::env::var("CANNA_HOST").unwrap_or_else(|_| Self::DEFAULT_HOST.to_string());
        let http_port = std::env::var("CANNA_HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .unwrap_or(8080);
        let upstream_url = std::env::var("CANNA_UPSTREAM_URL").unwrap_or_else(|_| {
            warn!(
                "CANNA_UPSTREAM_URL not set, proxying to {}",
                Self::DEFAULT_UPSTREAM_URL
            );
            Self::DEFAULT_UPSTREAM_URL.to_string()
        });
        let cache_max_entries = std::env::var("CANNA_CACHE_MAX_ENTRIES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());
        let cache_capacity = std::env::var("CANNA_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(Self::DEFAULT_CACHE_CAPACITY);
        let probe_interval_secs = std::env::var("CANNA_PROBE_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(Self::DEFAULT_PROBE_INTERVAL_SECS);
        let offline_page = std::env::var("CANNA_OFFLINE_PAGE")
            .unwrap_or_else(|_| Self::DEFAULT_OFFLINE_PAGE.to_string());
        let precache_manifest = match std::env::var("CANNA_PRECACHE") {
            Ok(list) => parse_manifest(&list, &offline_page),
            Err(_) => parse_manifest(&Self::DEFAULT_PRECACHE.join(","), &offline_page),
        };

        Self {
            host,
            http_port,
            upstream_url,
            cache_prefix: std::env::var("CANNA_CACHE_PREFIX")
                .unwrap_or_else(|_| Self::DEFAULT_CACHE_PREFIX.to_string()),
            cache_version: std::env::var("CANNA_CACHE_VERSION")
                .unwrap_or_else(|_| Self::DEFAULT_CACHE_VERSION.to_string()),
            cache_backend: std::env::var("CANNA_CACHE_BACKEND")
                .unwrap_or_else(|_| Self::DEFAULT_CACHE_BACKEND.to_string()),
            cache_max_entries,
            cache_capacity,
            data_dir: std::env::var("CANNA_DATA_DIR")
                .unwrap_or_else(|_| Self::DEFAULT_DATA_DIR.to_string()),
            precache_manifest,
            offline_page,
            probe_interval_secs,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

/// Split a comma separated manifest, dropping blanks and duplicates.
/// The offline page is always precached.
pub fn parse_manifest(list: &str, offline_page: &str) -> Vec<String> {
    let mut manifest: Vec<String> = Vec::new();
    for url in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !manifest.iter().any(|u| u == url) {
            manifest.push(url.to_string());
        }
    }
    if !manifest.iter().any(|u| u == offline_page) {
        manifest.push(offline_page.to_string());
    }
    manifest
}
