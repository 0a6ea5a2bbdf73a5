//! Authentication session

use parking_lot::RwLock;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;

/// Holder of the current access token
///
/// Constructed once by the application and handed to every client that
/// issues requests. Cloning creates a new handle to the SAME session.
#[derive(Clone, Default)]
pub struct ApiSession {
    token: Arc<RwLock<Option<Secret<String>>>>,
}

impl ApiSession {
    /// Create a signed-out session
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session from a previously issued token
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.set_token(token);
        session
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(Secret::new(token.into()));
    }

    /// Sign out
    pub fn clear(&self) {
        *self.token.write() = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    pub(crate) fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .as_ref()
            .map(|token| token.expose_secret().clone())
    }
}

impl std::fmt::Debug for ApiSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSession")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
