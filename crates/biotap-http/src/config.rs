//! API client configuration

use std::time::Duration;
use url::Url;

use biotap_core::{Result, SyncError};

/// Environment variable holding the API base URL
pub const BASE_URL_ENV: &str = "BIOTAP_API_BASE_URL";
/// Base URL used when the environment does not provide one
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for HttpLinkApi
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Root of the REST API
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiConfig {
    /// Create config for an explicit base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SyncError::Config(format!("invalid base url {:?}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::Config(format!(
                "base url {} cannot have a path",
                base_url
            )));
        }
        Ok(Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read the base URL from `BIOTAP_API_BASE_URL`, falling back to
    /// the local development server
    pub fn from_env() -> Result<Self> {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::new(DEFAULT_BASE_URL),
        }
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_url() {
        let config = ApiConfig::new("https://api.example.com").unwrap();
        assert_eq!(config.base_url.as_str(), "https://api.example.com/");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);

        assert!(matches!(ApiConfig::new("not a url"), Err(SyncError::Config(_))));
        assert!(matches!(ApiConfig::new("mailto:me@example.com"), Err(SyncError::Config(_))));
    }

    #[test]
    fn test_timeout_builder() {
        let config = ApiConfig::new(DEFAULT_BASE_URL)
            .unwrap()
            .timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
