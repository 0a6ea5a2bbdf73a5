//! Query cache client

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use biotap_core::{
    InvalidationSource, JsonSerializer, NoopMetrics, QueryEntry, QueryKey, QueryOptions,
    QueryStore, Result, Serializer, SyncError, SyncMetrics, SyncStats,
};
use biotap_storage::MemoryQueryStore;

mod coalescer;
use coalescer::Coalescer;

mod observer;
use observer::{FetchFn, Mounted, ObserverMap};
pub use observer::QueryObserver;

/// Default retention for unobserved entries
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(300);

/// Configuration for QueryClient
#[derive(Debug, Clone)]
pub struct QueryClientConfig {
    /// Options used for keys written without a mounted observer
    pub default_options: QueryOptions,
    /// How long an unobserved entry is retained
    pub gc_time: Duration,
}

impl Default for QueryClientConfig {
    fn default() -> Self {
        Self {
            default_options: QueryOptions::default(),
            gc_time: DEFAULT_GC_TIME,
        }
    }
}

impl QueryClientConfig {
    /// Create config with specific default options
    pub fn with_options(options: impl Into<QueryOptions>) -> Self {
        Self {
            default_options: options.into(),
            ..Default::default()
        }
    }

    /// Set the garbage collection window
    pub fn gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }
}

/// Client-side query cache
///
/// Holds server-derived data keyed by [`QueryKey`], lets callers read and
/// update it synchronously, and refetches mounted queries when they are
/// invalidated.
///
/// Generic over:
/// - `B`: The entry store
/// - `S`: The serializer used for stored values
/// - `M`: The metrics collector
///
/// Cloning creates a new handle to the SAME cache.
pub struct QueryClient<B = MemoryQueryStore, S = JsonSerializer, M = NoopMetrics>
where
    B: QueryStore,
    S: Serializer,
    M: SyncMetrics,
{
    store: Arc<B>,
    serializer: Arc<S>,
    metrics: Arc<M>,
    config: QueryClientConfig,
    observers: Arc<ObserverMap>,
    coalescer: Coalescer,
    stats: Arc<RwLock<SyncStats>>,
}

// Constructors for default store/serializer/metrics
impl QueryClient<MemoryQueryStore, JsonSerializer, NoopMetrics> {
    /// Create a new in-memory QueryClient with JSON values and no metrics
    pub fn new() -> Self {
        Self::with_config(QueryClientConfig::default())
    }

    /// Create with custom config
    pub fn with_config(config: QueryClientConfig) -> Self {
        Self::with_store(MemoryQueryStore::new(), JsonSerializer, NoopMetrics, config)
    }
}

impl Default for QueryClient<MemoryQueryStore, JsonSerializer, NoopMetrics> {
    fn default() -> Self {
        Self::new()
    }
}

// Full generic implementation
impl<B, S, M> QueryClient<B, S, M>
where
    B: QueryStore,
    S: Serializer,
    M: SyncMetrics,
{
    /// Create a QueryClient with a custom store, serializer and metrics
    pub fn with_store(store: B, serializer: S, metrics: M, config: QueryClientConfig) -> Self {
        Self {
            store: Arc::new(store),
            serializer: Arc::new(serializer),
            metrics: Arc::new(metrics),
            config,
            observers: Arc::new(ObserverMap::new()),
            coalescer: Coalescer::new(),
            stats: Arc::new(RwLock::new(SyncStats::default())),
        }
    }

    pub fn config(&self) -> &QueryClientConfig {
        &self.config
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Read cached data for a key
    pub fn get_query_data<T>(&self, key: impl Into<QueryKey>) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        Ok(self.get_query_entry(key)?.map(|entry| entry.value))
    }

    /// Read cached data with its freshness metadata
    pub fn get_query_entry<T>(&self, key: impl Into<QueryKey>) -> Result<Option<QueryEntry<T>>>
    where
        T: DeserializeOwned,
    {
        match self.store.get(&key.into()) {
            Some(entry) => {
                let value = self.serializer.deserialize(&entry.value)?;
                Ok(Some(entry.map(|_| value)))
            }
            None => Ok(None),
        }
    }

    /// Update cached data for a single key
    ///
    /// `updater` receives the current value, if any. Returning `None` leaves
    /// the cache untouched, so an absent entry is never created by accident.
    /// Returns `true` if a value was written.
    pub fn set_query_data<T, F>(&self, key: impl Into<QueryKey>, updater: F) -> Result<bool>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> Option<T>,
    {
        let key = key.into();
        let current = self.get_query_data::<T>(&key)?;
        let Some(next) = updater(current) else {
            return Ok(false);
        };
        let bytes = self.serializer.serialize(&next)?;

        let mut bytes = Some(bytes);
        let existed = self.store.update(&key, &mut |entry| {
            if let Some(bytes) = bytes.take() {
                entry.replace(bytes);
            }
        });
        if !existed {
            if let Some(bytes) = bytes {
                let stale_time = self.options_for(&key).stale_time;
                self.store.insert(key.clone(), QueryEntry::new(bytes, stale_time));
            }
        }

        self.metrics.record_optimistic_update(&key);
        self.stats.write().optimistic_updates += 1;
        Ok(true)
    }

    /// Update every cached entry selected by `prefix`
    ///
    /// Entries whose value does not decode as `T`, or that `updater` leaves
    /// unchanged, are not touched. No entry is ever created. Returns the
    /// number of entries changed.
    pub fn set_queries_data<T, F>(&self, prefix: impl Into<QueryKey>, mut updater: F) -> usize
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(T) -> T,
    {
        let prefix = prefix.into();
        let mut changed = 0;

        for key in self.store.keys_matching(&prefix) {
            let Some(entry) = self.store.get(&key) else {
                continue;
            };
            let value: T = match self.serializer.deserialize(&entry.value) {
                Ok(value) => value,
                Err(e) => {
                    trace!(target: "biotap", key = %key, error = %e, "skipping entry of another shape");
                    continue;
                }
            };
            let bytes = match self.serializer.serialize(&updater(value)) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(target: "biotap", key = %key, error = %e, "failed to encode updated entry");
                    continue;
                }
            };
            if bytes == entry.value {
                continue;
            }

            let mut bytes = Some(bytes);
            let written = self.store.update(&key, &mut |entry| {
                if let Some(bytes) = bytes.take() {
                    entry.replace(bytes);
                }
            });
            if written {
                self.metrics.record_optimistic_update(&key);
                changed += 1;
            }
        }

        self.stats.write().optimistic_updates += changed as u64;
        changed
    }

    /// Mark every entry selected by `prefix` as stale and refetch the
    /// mounted ones in the background
    ///
    /// Returns the number of entries marked.
    ///
    /// # Panics
    ///
    /// Panics outside a Tokio runtime when a mounted key matches.
    pub fn invalidate(&self, prefix: impl Into<QueryKey>) -> usize {
        self.invalidate_from(prefix, InvalidationSource::Manual)
    }

    /// [`QueryClient::invalidate`] with an explicit cause for metrics
    pub fn invalidate_from(&self, prefix: impl Into<QueryKey>, source: InvalidationSource) -> usize {
        let prefix = prefix.into();
        let mut marked = 0;

        for key in self.store.keys_matching(&prefix) {
            if self.store.update(&key, &mut |entry| entry.invalidated = true) {
                self.metrics.record_invalidation(&key, source);
                marked += 1;
            }
        }
        self.stats.write().invalidations += marked as u64;

        // Mounted queries refetch even when they hold no data yet
        let mounted: Vec<QueryKey> = self
            .observers
            .iter()
            .filter(|m| prefix.matches(m.key()))
            .map(|m| m.key().clone())
            .collect();
        for key in mounted {
            self.spawn_fetch(key);
        }

        debug!(target: "biotap", prefix = %prefix, source = source.as_str(), marked, "invalidated");
        marked
    }

    /// Mount a consumer of `key`
    ///
    /// The fetcher is used for every refetch of the key while the returned
    /// observer is alive. When `options.refetch_on_mount` is set and the
    /// cached value is absent or stale, a fetch starts immediately.
    pub fn observe<T, F, Fut>(
        &self,
        key: impl Into<QueryKey>,
        options: impl Into<QueryOptions>,
        fetcher: F,
    ) -> QueryObserver
    where
        T: Serialize + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let key = key.into();
        let options = options.into();
        let fetcher = self.erase(fetcher);

        self.observers
            .entry(key.clone())
            .and_modify(|mounted| {
                mounted.fetcher = fetcher.clone();
                mounted.options = options.clone();
                mounted.mounts += 1;
            })
            .or_insert_with(|| Mounted {
                fetcher: fetcher.clone(),
                options: options.clone(),
                mounts: 1,
            });

        let needs_fetch = match self.store.get(&key) {
            Some(entry) => entry.is_stale(),
            None => true,
        };
        if options.refetch_on_mount && needs_fetch {
            self.spawn_fetch(key.clone());
        }

        QueryObserver::new(key, self.observers.clone())
    }

    /// Whether any consumer is mounted on `key`
    pub fn is_observed(&self, key: impl Into<QueryKey>) -> bool {
        self.observers.contains_key(&key.into())
    }

    /// Whether a fetch for `key` is running
    pub fn is_fetching(&self, key: impl Into<QueryKey>) -> bool {
        self.coalescer.is_inflight(&key.into())
    }

    /// Fetch a mounted query now
    ///
    /// Concurrent calls for the same key share one request. On failure the
    /// previously cached value is kept.
    pub async fn fetch(&self, key: impl Into<QueryKey>) -> Result<()> {
        let key = key.into();
        let (fetcher, options) = match self.observers.get(&key) {
            Some(mounted) => (mounted.fetcher.clone(), mounted.options.clone()),
            None => return Err(SyncError::NotMounted(key.to_string())),
        };
        self.coalescer
            .do_request(&key, || self.run_fetch(&key, fetcher, options))
            .await
    }

    /// Return fresh cached data for `key`, fetching it if absent or stale
    pub async fn fetch_query<T, F, Fut>(
        &self,
        key: impl Into<QueryKey>,
        options: impl Into<QueryOptions>,
        fetcher: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let key = key.into();
        if let Some(entry) = self.get_query_entry::<T>(&key)? {
            if !entry.is_stale() {
                return Ok(entry.value);
            }
        }

        let fetcher = self.erase(fetcher);
        let options = options.into();
        self.coalescer
            .do_request(&key, || self.run_fetch(&key, fetcher, options))
            .await?;

        self.get_query_data(&key)?
            .ok_or_else(|| SyncError::Internal(format!("fetched data for {} vanished", key)))
    }

    /// Remove a single entry
    pub fn remove(&self, key: impl Into<QueryKey>) -> bool {
        self.store.remove(&key.into())
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get sync statistics
    pub fn stats(&self) -> SyncStats {
        let mut stats = self.stats.read().clone();
        stats.coalesced_fetches = self.coalescer.joined();
        stats.size = self.store.len();
        stats
    }

    /// Drop unobserved entries older than the configured gc time
    ///
    /// Returns the number of entries removed.
    pub fn collect_garbage(&self) -> usize {
        let mut removed = 0;
        for key in self.store.keys_matching(&QueryKey::new()) {
            if self.observers.contains_key(&key) {
                continue;
            }
            let expired = self
                .store
                .get(&key)
                .is_some_and(|entry| entry.age() > self.config.gc_time);
            if expired && self.store.remove(&key) {
                removed += 1;
            }
        }

        self.stats.write().collected += removed as u64;
        self.metrics.record_size(self.store.len());
        removed
    }

    fn options_for(&self, key: &QueryKey) -> QueryOptions {
        self.observers
            .get(key)
            .map(|m| m.options.clone())
            .unwrap_or_else(|| self.config.default_options.clone())
    }

    fn erase<T, F, Fut>(&self, fetcher: F) -> FetchFn
    where
        T: Serialize + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let serializer = self.serializer.clone();
        Arc::new(move || {
            let fut = fetcher();
            let serializer = serializer.clone();
            Box::pin(async move {
                let value = fut.await?;
                serializer.serialize(&value)
            })
        })
    }

    fn spawn_fetch(&self, key: QueryKey) {
        let client = self.clone();
        tokio::spawn(async move {
            // Failures are recorded on the entry; stale data stays visible
            if let Err(e) = client.fetch(key.clone()).await {
                debug!(target: "biotap", key = %key, error = %e, "background fetch failed");
            }
        });
    }

    async fn run_fetch(&self, key: &QueryKey, fetcher: FetchFn, options: QueryOptions) -> Result<()> {
        let mut attempt = 0;
        loop {
            let start = Instant::now();
            let generation = self.store.get(key).map(|entry| entry.data_update_count);
            match fetcher().await {
                Ok(bytes) => {
                    self.metrics.record_fetch(key, start.elapsed(), true);
                    self.store_fetched(key, bytes, options.stale_time, generation);
                    self.stats.write().fetches += 1;
                    return Ok(());
                }
                Err(e) if attempt < options.retry => {
                    self.metrics.record_fetch(key, start.elapsed(), false);
                    debug!(target: "biotap", key = %key, attempt, error = %e, "fetch failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(options.retry_delay).await;
                }
                Err(e) => {
                    self.metrics.record_fetch(key, start.elapsed(), false);
                    warn!(target: "biotap", key = %key, error = %e, "fetch failed, keeping cached data");
                    let mut error = Some(e.clone());
                    self.store.update(key, &mut |entry| {
                        if let Some(error) = error.take() {
                            entry.record_error(error);
                        }
                    });
                    self.stats.write().fetch_failures += 1;
                    return Err(e);
                }
            }
        }
    }

    /// Write a fetch result unless the entry was written locally since the
    /// fetch started
    ///
    /// `generation` is the entry's `data_update_count` when the request went
    /// out. A result that predates a local write is dropped and the entry
    /// stays invalidated, so the next invalidation refetches it.
    fn store_fetched(
        &self,
        key: &QueryKey,
        bytes: Vec<u8>,
        stale_time: Duration,
        generation: Option<u64>,
    ) {
        let mut bytes = Some(bytes);
        let mut superseded = false;
        let existed = self.store.update(key, &mut |entry| {
            if generation != Some(entry.data_update_count) {
                superseded = true;
                entry.invalidated = true;
                bytes = None;
                return;
            }
            if let Some(bytes) = bytes.take() {
                entry.confirm(bytes);
                entry.stale_time = stale_time;
            }
        });
        if superseded {
            debug!(target: "biotap", key = %key, "dropping fetch result older than a local write");
            return;
        }
        if !existed {
            if let Some(bytes) = bytes {
                self.store.insert(key.clone(), QueryEntry::new(bytes, stale_time));
            }
        }
        self.metrics.record_size(self.store.len());
    }
}

impl<B, S, M> Clone for QueryClient<B, S, M>
where
    B: QueryStore,
    S: Serializer,
    M: SyncMetrics,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            serializer: self.serializer.clone(),
            metrics: self.metrics.clone(),
            config: self.config.clone(),
            observers: self.observers.clone(),
            coalescer: self.coalescer.clone(),
            stats: self.stats.clone(),
        }
    }
}
