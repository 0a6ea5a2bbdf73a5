//! Cross-tab invalidation over a shared key-value store
//!
//! Each tab holds its own [`QueryClient`]. A tab that changed server state
//! writes a [`SyncSignal`] under a well-known key; every other tab of the
//! origin sees the write and invalidates its subscribed keys.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use biotap_core::{
    InvalidationSource, NoopMetrics, QueryKey, QueryStore, Result, SYNC_SIGNAL_KEY, Serializer,
    SignalDirection, SignalStore, StorageChange, SyncMetrics, SyncSignal, SyncType,
};

use crate::QueryClient;

/// Default delay before a written signal is cleared
pub const DEFAULT_CLEAR_AFTER: Duration = Duration::from_millis(100);

/// Configuration for CrossTabSync
#[derive(Debug, Clone)]
pub struct CrossTabConfig {
    /// Storage key used as the signalling channel
    pub key: String,
    /// Delay before the written signal is removed again
    pub clear_after: Duration,
}

impl Default for CrossTabConfig {
    fn default() -> Self {
        Self {
            key: SYNC_SIGNAL_KEY.to_string(),
            clear_after: DEFAULT_CLEAR_AFTER,
        }
    }
}

/// Broadcasts and receives change signals for one tab
///
/// Cloning creates a new handle sharing the same sequence counter.
#[derive(Clone)]
pub struct CrossTabSync {
    store: Arc<dyn SignalStore>,
    seq: Arc<AtomicU64>,
    config: CrossTabConfig,
    metrics: Arc<dyn SyncMetrics>,
}

impl CrossTabSync {
    /// Create over this tab's handle of the shared store
    pub fn new(store: impl SignalStore) -> Self {
        Self::with_config(store, CrossTabConfig::default())
    }

    /// Create with custom config
    pub fn with_config(store: impl SignalStore, config: CrossTabConfig) -> Self {
        Self {
            store: Arc::new(store),
            seq: Arc::new(AtomicU64::new(0)),
            config,
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Report sent and received signals to `metrics`
    pub fn with_metrics(mut self, metrics: impl SyncMetrics) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    pub fn config(&self) -> &CrossTabConfig {
        &self.config
    }

    /// Tell every other tab that something of `kind` changed
    ///
    /// The signal is removed again after `clear_after`, unless another
    /// signal replaced it in the meantime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the removal runs on
    /// a spawned task.
    pub fn trigger(&self, kind: SyncType) -> Result<()> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let payload = SyncSignal::new(kind, seq).to_payload()?;
        self.store.set_item(&self.config.key, &payload)?;
        self.metrics.record_signal(Some(kind), SignalDirection::Sent);
        debug!(target: "biotap", kind = kind.as_str(), seq, "sent cross-tab signal");

        let store = self.store.clone();
        let key = self.config.key.clone();
        let clear_after = self.config.clear_after;
        tokio::spawn(async move {
            tokio::time::sleep(clear_after).await;
            if let Err(e) = store.remove_item_if(&key, &payload) {
                debug!(target: "biotap", error = %e, "failed to clear cross-tab signal");
            }
        });
        Ok(())
    }

    /// Invalidate `keys` in `client` whenever another tab signals a
    /// `click` or `all` change
    ///
    /// The listener is registered before this returns and removed when the
    /// subscription is dropped. A listener that falls behind and misses
    /// signals invalidates `keys` as if it had received one.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn subscribe<B, S, M>(
        &self,
        client: &QueryClient<B, S, M>,
        keys: Vec<QueryKey>,
    ) -> CrossTabSubscription
    where
        B: QueryStore,
        S: Serializer,
        M: SyncMetrics,
    {
        let mut events = self.store.subscribe();
        let client = client.clone();
        let signal_key = self.config.key.clone();
        let metrics = self.metrics.clone();

        let task = tokio::spawn(async move {
            while let Some(change) = events.recv().await {
                let event = match change {
                    StorageChange::Event(event) => event,
                    StorageChange::Missed(missed) => {
                        warn!(target: "biotap", missed, "cross-tab listener fell behind, invalidating");
                        for key in &keys {
                            client.invalidate_from(key, InvalidationSource::CrossTab);
                        }
                        continue;
                    }
                };
                if event.key != signal_key {
                    continue;
                }
                // Removal of the signal
                let Some(payload) = event.new_value else {
                    continue;
                };

                match SyncSignal::from_payload(&payload) {
                    Ok(signal) if signal.invalidates_subscribers() => {
                        metrics.record_signal(Some(signal.kind), SignalDirection::Received);
                        debug!(target: "biotap", kind = signal.kind.as_str(), seq = signal.seq, "received cross-tab signal");
                        for key in &keys {
                            client.invalidate_from(key, InvalidationSource::CrossTab);
                        }
                    }
                    Ok(signal) => {
                        metrics.record_signal(Some(signal.kind), SignalDirection::Ignored);
                        debug!(target: "biotap", kind = signal.kind.as_str(), "ignoring cross-tab signal");
                    }
                    Err(e) => {
                        metrics.record_signal(None, SignalDirection::Malformed);
                        debug!(target: "biotap", error = %e, "ignoring malformed cross-tab signal");
                    }
                }
            }
        });

        CrossTabSubscription { task }
    }
}

/// Live cross-tab listener; dropping it removes the listener
#[must_use = "dropping the subscription removes the listener immediately"]
pub struct CrossTabSubscription {
    task: JoinHandle<()>,
}

impl CrossTabSubscription {
    /// Whether the listener is still running
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for CrossTabSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
