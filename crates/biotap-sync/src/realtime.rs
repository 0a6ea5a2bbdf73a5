//! Periodic, visibility-aware invalidation of one query

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use biotap_core::{
    InvalidationSource, QueryKey, QueryStore, Result, Serializer, SyncError, SyncMetrics,
    VisibilitySource,
};

use crate::QueryClient;

/// Default poll interval
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for RealtimeSync
#[derive(Debug, Clone)]
pub struct RealtimeSyncConfig {
    /// Key (or prefix) invalidated on every tick
    pub query_key: QueryKey,
    /// Whether polling runs at all
    pub enabled: bool,
    /// Time between ticks
    pub interval: Duration,
    /// Skip ticks while the page is hidden
    pub only_when_visible: bool,
}

impl RealtimeSyncConfig {
    /// Poll `query_key` with default settings
    pub fn new(query_key: impl Into<QueryKey>) -> Self {
        Self {
            query_key: query_key.into(),
            enabled: true,
            interval: DEFAULT_SYNC_INTERVAL,
            only_when_visible: true,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the poll interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the poll interval in milliseconds
    pub fn interval_ms(self, millis: u64) -> Self {
        self.interval(Duration::from_millis(millis))
    }

    pub fn only_when_visible(mut self, only_when_visible: bool) -> Self {
        self.only_when_visible = only_when_visible;
        self
    }
}

/// Background synchronizer
///
/// Invalidates a query on a fixed interval, skipping ticks while the page
/// is hidden, and once immediately whenever the page becomes visible again.
pub struct RealtimeSync;

impl RealtimeSync {
    /// Start polling
    ///
    /// The timer and the visibility listener live in one task owned by the
    /// returned handle. A disabled config yields an inert handle.
    ///
    /// # Panics
    ///
    /// Panics if an enabled sync is started outside a Tokio runtime.
    pub fn start<B, S, M, V>(
        client: &QueryClient<B, S, M>,
        visibility: &V,
        config: RealtimeSyncConfig,
    ) -> Result<SyncHandle>
    where
        B: QueryStore,
        S: Serializer,
        M: SyncMetrics,
        V: VisibilitySource + ?Sized,
    {
        if !config.enabled {
            return Ok(SyncHandle { task: None });
        }
        if config.interval.is_zero() {
            return Err(SyncError::Config(
                "realtime sync interval must be non-zero".to_string(),
            ));
        }

        let client = client.clone();
        let mut visibility_rx = visibility.watch();
        drop(visibility_rx.borrow_and_update());
        let mut ticker = tokio::time::interval_at(Instant::now() + config.interval, config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(
            target: "biotap",
            key = %config.query_key,
            interval_ms = config.interval.as_millis() as u64,
            "starting realtime sync"
        );

        let task = tokio::spawn(async move {
            let key = config.query_key;
            let mut listening = true;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if config.only_when_visible && *visibility_rx.borrow() {
                            trace!(target: "biotap", key = %key, "page hidden, skipping tick");
                            continue;
                        }
                        client.invalidate_from(&key, InvalidationSource::Poll);
                    }
                    changed = visibility_rx.changed(), if listening => {
                        if changed.is_err() {
                            // Visibility source is gone; keep polling
                            listening = false;
                            continue;
                        }
                        // A hide and show between polls coalesce into one
                        // notice that ends visible
                        if !*visibility_rx.borrow_and_update() {
                            client.invalidate_from(&key, InvalidationSource::Visibility);
                        }
                    }
                }
            }
        });

        Ok(SyncHandle { task: Some(task) })
    }
}

/// Running synchronizer; dropping it stops the timer and the listener
#[must_use = "dropping the handle stops the synchronizer immediately"]
pub struct SyncHandle {
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Stop the synchronizer
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether the synchronizer is running
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
