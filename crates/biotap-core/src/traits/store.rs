//! Query store trait

use crate::{QueryEntry, QueryKey};

/// Storage behind the query cache
///
/// Every operation is synchronous so that optimistic updates are
/// visible before the caller performs any I/O.
pub trait QueryStore: Send + Sync + 'static {
    /// Get an entry
    fn get(&self, key: &QueryKey) -> Option<QueryEntry<Vec<u8>>>;

    /// Insert or replace an entry
    fn insert(&self, key: QueryKey, entry: QueryEntry<Vec<u8>>);

    /// Mutate an entry in place
    ///
    /// Returns `false` without calling `f` if the key is absent.
    fn update(&self, key: &QueryKey, f: &mut dyn FnMut(&mut QueryEntry<Vec<u8>>)) -> bool;

    /// Remove an entry, returning `true` if it existed
    fn remove(&self, key: &QueryKey) -> bool;

    /// All keys selected by a prefix filter
    fn keys_matching(&self, prefix: &QueryKey) -> Vec<QueryKey>;

    /// Remove every entry
    fn clear(&self);

    /// Number of entries
    fn len(&self) -> usize;

    /// Check if the store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a key exists
    fn contains(&self, key: &QueryKey) -> bool {
        self.get(key).is_some()
    }
}
