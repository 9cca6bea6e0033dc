pub mod generation_manager;
pub mod lifecycle;
pub mod operation;

pub use generation_manager::{CacheManager, GenerationMetadata};
pub use lifecycle::{ActivationReport, InstallReport, Lifecycle, WorkerState};
pub use operation::GenerationOperations;
