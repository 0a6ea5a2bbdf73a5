//! Query options and builder

use std::time::Duration;

/// Default freshness window for query results
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);
/// Default delay between fetch retries
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Per-query fetch policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a fetched value counts as fresh
    pub stale_time: Duration,
    /// Extra attempts after a failed fetch
    pub retry: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
    /// Fetch on mount when the cached value is stale or absent
    pub refetch_on_mount: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            retry: 1,
            retry_delay: DEFAULT_RETRY_DELAY,
            refetch_on_mount: true,
        }
    }
}

/// Builder for QueryOptions with fluent API
#[derive(Debug, Clone, Default)]
pub struct QueryOpts(QueryOptions);

impl QueryOpts {
    /// Create new options builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set stale time
    pub fn stale_time(mut self, duration: Duration) -> Self {
        self.0.stale_time = duration;
        self
    }

    /// Set stale time in seconds
    pub fn stale_secs(self, seconds: u64) -> Self {
        self.stale_time(Duration::from_secs(seconds))
    }

    /// Set stale time in minutes
    pub fn stale_mins(self, minutes: u64) -> Self {
        self.stale_time(Duration::from_secs(minutes * 60))
    }

    /// Set retry count
    pub fn retry(mut self, retries: u32) -> Self {
        self.0.retry = retries;
        self
    }

    /// Disable retries
    pub fn no_retry(self) -> Self {
        self.retry(0)
    }

    /// Set the delay between retries
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.0.retry_delay = delay;
        self
    }

    /// Do not fetch when a consumer mounts
    pub fn skip_mount_fetch(mut self) -> Self {
        self.0.refetch_on_mount = false;
        self
    }

    /// Build the options
    pub fn build(self) -> QueryOptions {
        self.0
    }
}

impl From<QueryOpts> for QueryOptions {
    fn from(opts: QueryOpts) -> Self {
        opts.0
    }
}

impl From<Duration> for QueryOptions {
    fn from(stale_time: Duration) -> Self {
        QueryOptions {
            stale_time,
            ..Default::default()
        }
    }
}
