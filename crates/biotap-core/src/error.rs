//! Error types for sync operations

use thiserror::Error;

/// Main error type for all sync operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// No consumer is mounted for the query key
    #[error("no query mounted for key: {0}")]
    NotMounted(String),

    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Transport failure talking to the API
    #[error("network error: {0}")]
    Network(String),

    /// API returned a non-success status
    #[error("api error [{status}]: {message}")]
    Api { status: u16, message: String },

    /// Session token rejected by the API
    #[error("unauthorized, please login again")]
    Unauthorized,

    /// API rate limit hit
    #[error("rate limited, retry in {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Shared storage operation failed
    #[error("storage error: {0}")]
    Storage(String),

    /// Cross-tab payload could not be parsed
    #[error("malformed sync signal: {0}")]
    MalformedSignal(String),

    /// Opening a browsing context failed
    #[error("navigation error: {0}")]
    Navigation(String),

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),

    /// Timeout
    #[error("operation timed out")]
    Timeout,
}

impl SyncError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::Network(_) | SyncError::Timeout | SyncError::RateLimited { .. }
        ) || matches!(self, SyncError::Api { status, .. } if *status >= 500)
    }
}

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::NotMounted("links:7".to_string());
        assert_eq!(err.to_string(), "no query mounted for key: links:7");

        let err = SyncError::Api {
            status: 404,
            message: "Link not found".to_string(),
        };
        assert_eq!(err.to_string(), "api error [404]: Link not found");

        let err = SyncError::RateLimited {
            retry_after_secs: 60,
        };
        assert_eq!(err.to_string(), "rate limited, retry in 60 seconds");
    }

    #[test]
    fn test_error_clone() {
        let err = SyncError::Timeout;
        let cloned = err.clone();
        assert_eq!(err, cloned);
    }

    #[test]
    fn test_transient() {
        assert!(SyncError::Network("reset".into()).is_transient());
        assert!(SyncError::Api {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!SyncError::Api {
            status: 400,
            message: String::new()
        }
        .is_transient());
        assert!(!SyncError::Unauthorized.is_transient());
    }
}
