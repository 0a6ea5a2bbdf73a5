use dashmap::DashMap;
use futures_util::future::BoxFuture;
use std::sync::Arc;

use biotap_core::{QueryKey, QueryOptions, Result};

/// Type-erased fetcher producing serialized query data
pub(crate) type FetchFn = Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<u8>>> + Send + Sync>;

/// Fetch policy registered by mounted consumers of a key
pub(crate) struct Mounted {
    pub(crate) fetcher: FetchFn,
    pub(crate) options: QueryOptions,
    pub(crate) mounts: usize,
}

pub(crate) type ObserverMap = DashMap<QueryKey, Mounted>;

/// A mounted consumer of a query
///
/// While at least one observer for a key is alive, invalidating that key
/// triggers a background refetch. Dropping the observer unmounts it.
#[must_use = "dropping the observer unmounts the query immediately"]
pub struct QueryObserver {
    key: QueryKey,
    observers: Arc<ObserverMap>,
}

impl QueryObserver {
    pub(crate) fn new(key: QueryKey, observers: Arc<ObserverMap>) -> Self {
        Self { key, observers }
    }

    /// Key this observer is mounted on
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

impl std::fmt::Debug for QueryObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryObserver").field("key", &self.key).finish()
    }
}

impl Drop for QueryObserver {
    fn drop(&mut self) {
        self.observers
            .remove_if_mut(&self.key, |_, mounted| {
                mounted.mounts = mounted.mounts.saturating_sub(1);
                mounted.mounts == 0
            });
    }
}
