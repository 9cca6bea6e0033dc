// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not found")]
    NotFound,
    #[error("cache generation not found: {0}")]
    GenerationNotFound(String),
    #[error("network: {0}")]
    Network(String),
    #[error("precache failed for {url}: {reason}")]
    Precache { url: String, reason: String },
    #[error("lifecycle: {0}")]
    Lifecycle(String),
    #[error("unknown sync tag: {0}")]
    UnknownSyncTag(String),
    #[error("sync '{tag}' failed: {reason}")]
    Sync { tag: String, reason: String },
    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
