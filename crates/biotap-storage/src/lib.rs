//! biotap-storage: In-memory stores and browsing-context primitives for biotap

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::{MemoryQueryStore, PageVisibility, SharedStorage, StorageConfig, TabStorage};
