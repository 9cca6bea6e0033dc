use crate::domain::WorkerConfig;
use crate::domain::request::FetchRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted; goes straight to the network
    Passthrough,
    Api,
    StaticAsset,
    Page,
}

/// Classifies requests by method and path. Pure, no side effects.
#[derive(Debug, Clone)]
pub struct RequestRouter {
    api_prefix: String,
    static_prefix: String,
    static_extensions: Vec<String>,
}

impl RequestRouter {
    pub fn new(
        api_prefix: impl Into<String>,
        static_prefix: impl Into<String>,
        static_extensions: Vec<String>,
    ) -> Self {
        Self {
            api_prefix: api_prefix.into(),
            static_prefix: static_prefix.into(),
            static_extensions,
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(
            config.api_prefix.clone(),
            config.static_prefix.clone(),
            config.static_extensions.clone(),
        )
    }

    pub fn classify(&self, request: &FetchRequest) -> Route {
        if !request.is_get() {
            return Route::Passthrough;
        }

        let path = request.path();
        if path.starts_with(&self.api_prefix) {
            Route::Api
        } else if path.starts_with(&self.static_prefix)
            || self.static_extensions.iter().any(|ext| path.ends_with(ext.as_str()))
        {
            Route::StaticAsset
        } else {
            Route::Page
        }
    }
}

impl Default for RequestRouter {
    fn default() -> Self {
        Self::from_config(&WorkerConfig::default())
    }
}
