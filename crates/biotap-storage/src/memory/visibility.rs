//! Page visibility state

use std::sync::Arc;
use tokio::sync::watch;

use biotap_core::VisibilitySource;

/// Hidden/visible flag of a document, observable by listeners
///
/// Cloning creates a new handle to the SAME flag.
#[derive(Clone)]
pub struct PageVisibility {
    tx: Arc<watch::Sender<bool>>,
}

impl PageVisibility {
    /// Create a visible page
    pub fn new() -> Self {
        Self::with_hidden(false)
    }

    /// Create with an explicit initial state
    pub fn with_hidden(hidden: bool) -> Self {
        let (tx, _rx) = watch::channel(hidden);
        Self { tx: Arc::new(tx) }
    }

    /// Update the hidden flag
    ///
    /// Listeners are woken only when the flag actually changes.
    pub fn set_hidden(&self, hidden: bool) {
        self.tx.send_if_modified(|current| {
            if *current == hidden {
                false
            } else {
                *current = hidden;
                true
            }
        });
    }

    pub fn hide(&self) {
        self.set_hidden(true);
    }

    pub fn show(&self) {
        self.set_hidden(false);
    }
}

impl Default for PageVisibility {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilitySource for PageVisibility {
    fn is_hidden(&self) -> bool {
        *self.tx.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
