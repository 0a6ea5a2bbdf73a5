//! In-memory query store using DashMap

use dashmap::DashMap;
use std::sync::Arc;

use biotap_core::{QueryEntry, QueryKey, QueryStore};

/// In-memory query store
///
/// Uses `DashMap` for concurrent access.
/// Cloning creates a new handle to the SAME underlying store.
#[derive(Clone, Default)]
pub struct MemoryQueryStore {
    data: Arc<DashMap<QueryKey, QueryEntry<Vec<u8>>>>,
}

impl MemoryQueryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get approximate memory usage of stored values
    pub fn memory_usage(&self) -> usize {
        self.data
            .iter()
            .map(|entry| entry.value.len() + entry.key().to_string().len())
            .sum()
    }
}

impl QueryStore for MemoryQueryStore {
    fn get(&self, key: &QueryKey) -> Option<QueryEntry<Vec<u8>>> {
        self.data.get(key).map(|entry| entry.clone())
    }

    fn insert(&self, key: QueryKey, entry: QueryEntry<Vec<u8>>) {
        self.data.insert(key, entry);
    }

    fn update(&self, key: &QueryKey, f: &mut dyn FnMut(&mut QueryEntry<Vec<u8>>)) -> bool {
        match self.data.get_mut(key) {
            Some(mut entry) => {
                f(&mut entry);
                true
            }
            None => false,
        }
    }

    fn remove(&self, key: &QueryKey) -> bool {
        self.data.remove(key).is_some()
    }

    fn keys_matching(&self, prefix: &QueryKey) -> Vec<QueryKey> {
        self.data
            .iter()
            .filter(|entry| prefix.matches(entry.key()))
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn clear(&self) {
        self.data.clear();
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
