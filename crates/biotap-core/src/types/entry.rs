//! Query cache entry type

use std::time::Duration;
use tokio::time::Instant;

use crate::SyncError;

/// A cached query result with freshness metadata
#[derive(Debug, Clone)]
pub struct QueryEntry<T> {
    /// The cached value
    pub value: T,
    /// When the value was last written (fetch or local update)
    pub updated_at: Instant,
    /// How long the value counts as fresh
    pub stale_time: Duration,
    /// Explicitly marked stale by an invalidation
    pub invalidated: bool,
    /// Number of times the value was replaced
    pub data_update_count: u64,
    /// Consecutive failed fetches since the last success
    pub error_count: u32,
    /// Last fetch error, cleared on success
    pub last_error: Option<SyncError>,
}

impl<T> QueryEntry<T> {
    /// Create a new fresh entry
    pub fn new(value: T, stale_time: Duration) -> Self {
        Self {
            value,
            updated_at: Instant::now(),
            stale_time,
            invalidated: false,
            data_update_count: 1,
            error_count: 0,
            last_error: None,
        }
    }

    /// Replace the value, keeping the staleness flag untouched
    pub fn replace(&mut self, value: T) {
        self.value = value;
        self.updated_at = Instant::now();
        self.data_update_count += 1;
    }

    /// Replace the value with a server-confirmed one
    pub fn confirm(&mut self, value: T) {
        self.replace(value);
        self.invalidated = false;
        self.error_count = 0;
        self.last_error = None;
    }

    /// Record a failed fetch; the value is kept
    pub fn record_error(&mut self, error: SyncError) {
        self.error_count += 1;
        self.last_error = Some(error);
    }

    /// Check if the value should be refetched
    pub fn is_stale(&self) -> bool {
        self.invalidated || self.age() > self.stale_time
    }

    /// Get age of the entry
    pub fn age(&self) -> Duration {
        self.updated_at.elapsed()
    }

    /// Map the value, keeping metadata
    pub fn map<U, F>(self, f: F) -> QueryEntry<U>
    where
        F: FnOnce(T) -> U,
    {
        QueryEntry {
            value: f(self.value),
            updated_at: self.updated_at,
            stale_time: self.stale_time,
            invalidated: self.invalidated,
            data_update_count: self.data_update_count,
            error_count: self.error_count,
            last_error: self.last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry() {
        let entry = QueryEntry::new("test".to_string(), Duration::from_secs(60));
        assert_eq!(entry.value, "test");
        assert_eq!(entry.data_update_count, 1);
        assert!(!entry.is_stale());
    }

    #[tokio::test(start_paused = true)]
    async fn test_goes_stale_after_window() {
        let entry = QueryEntry::new(1, Duration::from_secs(30));
        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(!entry.is_stale());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(entry.is_stale());
    }

    #[test]
    fn test_invalidated_is_stale() {
        let mut entry = QueryEntry::new(1, Duration::from_secs(60));
        entry.invalidated = true;
        assert!(entry.is_stale());

        entry.confirm(2);
        assert!(!entry.is_stale());
        assert_eq!(entry.data_update_count, 2);
    }

    #[test]
    fn test_error_keeps_value() {
        let mut entry = QueryEntry::new(5, Duration::from_secs(60));
        entry.record_error(SyncError::Timeout);
        assert_eq!(entry.value, 5);
        assert_eq!(entry.error_count, 1);

        entry.confirm(6);
        assert_eq!(entry.error_count, 0);
        assert!(entry.last_error.is_none());
    }
}
