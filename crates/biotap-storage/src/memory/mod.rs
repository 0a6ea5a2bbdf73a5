//! In-memory implementations

mod backend;
mod shared;
mod visibility;

pub use backend::MemoryQueryStore;
pub use shared::{SharedStorage, StorageConfig, TabStorage};
pub use visibility::PageVisibility;
