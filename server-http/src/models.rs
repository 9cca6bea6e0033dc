use canna::domain::GenerationInfo;
use canna::planes::control::WorkerState;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// === Worker Models ===

#[derive(Serialize)]
pub struct HealthResponse {
    pub message: String,
    pub state: WorkerState,
    pub controlling: bool,
    pub upstream: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

// === Generation Models ===

#[derive(Serialize)]
pub struct GenerationResponse {
    pub name: String,
    pub backend: String,
    pub max_entries: Option<u64>,
    pub capacity: u64,
    pub entry_count: u64,
    pub current: bool,
}

impl GenerationResponse {
    pub fn from_info(info: GenerationInfo, current: bool) -> Self {
        Self {
            backend: format!("{:?}", info.config.backend).to_lowercase(),
            name: info.config.name,
            max_entries: info.config.max_entries,
            capacity: info.config.capacity,
            entry_count: info.entry_count,
            current,
        }
    }
}

#[derive(Serialize)]
pub struct ListGenerationsResponse {
    pub generations: Vec<GenerationResponse>,
}

#[derive(Serialize)]
pub struct DropGenerationResponse {
    pub dropped: bool,
}

// === Sync Models ===

#[derive(Serialize)]
pub struct SyncResponse {
    pub tag: String,
    pub replayed: usize,
}

#[derive(Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

// === Push Models ===

#[derive(Deserialize, Default)]
pub struct ClickRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Serialize)]
pub struct ClickResponse {
    pub dismissed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigate: Option<String>,
}
