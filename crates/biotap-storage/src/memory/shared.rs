//! Origin-wide persistent key-value store with cross-context change notifications
//!
//! Mirrors the semantics of browser local storage: every tab of an origin
//! reads and writes the same map, and each change is announced to every
//! *other* tab. A write that leaves the value unchanged announces nothing.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

use biotap_core::{Result, SignalStore, StorageEvent, StorageEvents, StorageNotice, TabId};

/// Configuration for the shared store
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Buffered notifications per subscriber before it starts lagging
    pub channel_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

impl StorageConfig {
    /// Create config with specific channel capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channel_capacity: capacity.max(1),
        }
    }
}

#[derive(Debug, Default)]
struct StorageStats {
    writes: u64,
    removals: u64,
    notifications: u64,
}

struct Inner {
    data: DashMap<String, String>,
    tx: broadcast::Sender<StorageNotice>,
    next_tab: AtomicU64,
    stats: RwLock<StorageStats>,
}

/// Shared store for one origin
///
/// Cloning creates a new handle to the SAME underlying store.
#[derive(Clone)]
pub struct SharedStorage {
    inner: Arc<Inner>,
}

impl SharedStorage {
    /// Create a new shared store
    pub fn new(config: StorageConfig) -> Self {
        let (tx, _rx) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                data: DashMap::new(),
                tx,
                next_tab: AtomicU64::new(1),
                stats: RwLock::new(StorageStats::default()),
            }),
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(StorageConfig::default())
    }

    /// Open a handle for a new browsing context
    pub fn open_tab(&self) -> TabStorage {
        let id = self.inner.next_tab.fetch_add(1, Ordering::Relaxed);
        TabStorage {
            tab: TabId(id),
            inner: self.inner.clone(),
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.inner.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.data.is_empty()
    }

    /// Number of change notifications emitted so far
    pub fn notifications(&self) -> u64 {
        self.inner.stats.read().notifications
    }
}

impl Default for SharedStorage {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// One browsing context's view of a [`SharedStorage`]
#[derive(Clone)]
pub struct TabStorage {
    tab: TabId,
    inner: Arc<Inner>,
}

impl TabStorage {
    /// Identifier of this context
    pub fn tab(&self) -> TabId {
        self.tab
    }

    fn notify(&self, key: &str, new_value: Option<String>) {
        let notice = StorageNotice {
            origin: self.tab,
            event: StorageEvent {
                key: key.to_string(),
                new_value,
            },
        };
        // No subscribers is fine; nobody else is listening.
        let _ = self.inner.tx.send(notice);
        self.inner.stats.write().notifications += 1;
    }
}

impl SignalStore for TabStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.inner.data.get(key).map(|v| v.clone())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let previous = self.inner.data.insert(key.to_string(), value.to_string());
        self.inner.stats.write().writes += 1;
        if previous.as_deref() != Some(value) {
            self.notify(key, Some(value.to_string()));
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        if self.inner.data.remove(key).is_some() {
            self.inner.stats.write().removals += 1;
            self.notify(key, None);
        }
        Ok(())
    }

    fn remove_item_if(&self, key: &str, expected: &str) -> Result<bool> {
        if self.inner.data.remove_if(key, |_, v| v == expected).is_none() {
            return Ok(false);
        }
        self.inner.stats.write().removals += 1;
        self.notify(key, None);
        Ok(true)
    }

    fn subscribe(&self) -> StorageEvents {
        StorageEvents::new(self.inner.tx.subscribe(), self.tab)
    }
}
