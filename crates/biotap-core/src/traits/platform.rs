//! Browsing-context collaborators: shared storage, page visibility, navigation

use tokio::sync::watch;

use crate::{Result, StorageEvents};

/// Persistent key-value store shared by every context of one origin
///
/// Writes notify the *other* contexts through [`SignalStore::subscribe`];
/// the writing context never sees its own changes.
pub trait SignalStore: Send + Sync + 'static {
    /// Read a value
    fn get_item(&self, key: &str) -> Option<String>;

    /// Write a value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Remove `key` only while it still holds `expected`
    ///
    /// Returns `true` if the value was removed. The default reads and then
    /// removes, so a write landing in between is lost; stores that can
    /// compare and remove in one step should override it.
    fn remove_item_if(&self, key: &str, expected: &str) -> Result<bool> {
        if self.get_item(key).as_deref() != Some(expected) {
            return Ok(false);
        }
        self.remove_item(key)?;
        Ok(true)
    }

    /// Listen for changes made by other contexts
    fn subscribe(&self) -> StorageEvents;
}

/// Page visibility signal
pub trait VisibilitySource: Send + Sync + 'static {
    /// Whether the document is currently hidden
    fn is_hidden(&self) -> bool;

    /// Receiver that observes every change of the hidden flag
    ///
    /// Implementations notify only when the flag actually changes.
    fn watch(&self) -> watch::Receiver<bool>;
}

/// Opens URLs in a new browsing context
pub trait Navigator: Send + Sync + 'static {
    /// Open `url` without waiting for it to load
    fn open(&self, url: &str) -> Result<()>;
}

/// Navigator that opens nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    #[inline]
    fn open(&self, _url: &str) -> Result<()> {
        Ok(())
    }
}
