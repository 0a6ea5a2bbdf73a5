//! Shared storage change notifications

use tokio::sync::broadcast;

/// Identifies one browsing context (tab) sharing a storage origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub u64);

/// A change observed on the shared store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// `None` when the key was removed
    pub new_value: Option<String>,
}

/// A change tagged with the context that made it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNotice {
    pub origin: TabId,
    pub event: StorageEvent,
}

/// What a subscriber receives next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageChange {
    /// A change made by another context
    Event(StorageEvent),
    /// This many changes were dropped because the subscriber fell behind
    Missed(u64),
}

/// Subscriber for changes made by *other* contexts
pub struct StorageEvents {
    rx: broadcast::Receiver<StorageNotice>,
    tab: TabId,
}

impl StorageEvents {
    pub fn new(rx: broadcast::Receiver<StorageNotice>, tab: TabId) -> Self {
        Self { rx, tab }
    }

    /// Receive the next change made elsewhere
    ///
    /// Returns `None` once the store is gone. A subscriber that fell
    /// behind gets [`StorageChange::Missed`] before the oldest change still
    /// buffered.
    pub async fn recv(&mut self) -> Option<StorageChange> {
        loop {
            match self.rx.recv().await {
                Ok(notice) if notice.origin == self.tab => continue,
                Ok(notice) => return Some(StorageChange::Event(notice.event)),
                Err(broadcast::error::RecvError::Lagged(n)) => return Some(StorageChange::Missed(n)),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// The context this subscriber belongs to
    pub fn tab(&self) -> TabId {
        self.tab
    }
}
