use crate::{InvalidationSource, QueryKey, SignalDirection, SyncMetrics, SyncType};
use std::time::Duration;
use tracing::{debug, trace};

/// Metrics adapter that logs events via `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingMetrics {
    /// Service name/prefix (optional)
    service_name: Option<String>,
}

impl TracingMetrics {
    /// Create new tracing metrics adapter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with service name prefix
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }
}

impl SyncMetrics for TracingMetrics {
    fn record_optimistic_update(&self, key: &QueryKey) {
        debug!(
            target: "biotap",
            event = "optimistic_update",
            key = %key,
            service = ?self.service_name,
            "Optimistic Update"
        );
    }

    fn record_invalidation(&self, key: &QueryKey, source: InvalidationSource) {
        debug!(
            target: "biotap",
            event = "invalidate",
            key = %key,
            source = source.as_str(),
            service = ?self.service_name,
            "Query Invalidated"
        );
    }

    fn record_fetch(&self, key: &QueryKey, duration: Duration, success: bool) {
        debug!(
            target: "biotap",
            event = "fetch",
            key = %key,
            success = success,
            duration_ms = duration.as_millis(),
            service = ?self.service_name,
            "Query Fetched"
        );
    }

    fn record_signal(&self, kind: Option<SyncType>, direction: SignalDirection) {
        debug!(
            target: "biotap",
            event = "signal",
            kind = kind.map(|k| k.as_str()).unwrap_or("unknown"),
            direction = direction.as_str(),
            service = ?self.service_name,
            "Cross-Tab Signal"
        );
    }

    fn record_size(&self, size: usize) {
        trace!(
            target: "biotap",
            event = "size",
            size = size,
            service = ?self.service_name,
            "Query Cache Size"
        );
    }
}
