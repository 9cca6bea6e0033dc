mod memory_queue;
mod sled_queue;

pub use memory_queue::MemorySyncQueue;
pub use sled_queue::SledSyncQueue;
