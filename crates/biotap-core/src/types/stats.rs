//! Sync statistics

/// Counters for query cache and sync activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Entries changed by optimistic local updates
    pub optimistic_updates: u64,
    /// Entries marked stale
    pub invalidations: u64,
    /// Fetches that completed successfully
    pub fetches: u64,
    /// Fetches that failed after all retries
    pub fetch_failures: u64,
    /// Fetch requests that joined one already in flight
    pub coalesced_fetches: u64,
    /// Entries removed by garbage collection
    pub collected: u64,
    /// Current number of entries
    pub size: usize,
}

impl SyncStats {
    /// Fraction of fetches that succeeded (0.0 to 1.0)
    pub fn fetch_success_ratio(&self) -> f64 {
        let total = self.fetches + self.fetch_failures;
        if total == 0 {
            0.0
        } else {
            self.fetches as f64 / total as f64
        }
    }

    /// Total fetch attempts that reached the API
    pub fn total_fetches(&self) -> u64 {
        self.fetches + self.fetch_failures
    }

    /// Merge stats from another instance
    pub fn merge(&mut self, other: &SyncStats) {
        self.optimistic_updates += other.optimistic_updates;
        self.invalidations += other.invalidations;
        self.fetches += other.fetches;
        self.fetch_failures += other.fetch_failures;
        self.coalesced_fetches += other.coalesced_fetches;
        self.collected += other.collected;
        self.size = other.size; // Use latest size
    }
}
