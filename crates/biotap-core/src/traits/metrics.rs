//! Metrics trait for sync observability

use std::time::Duration;

use crate::{QueryKey, SyncType};

/// What caused an invalidation, for metrics labeling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidationSource {
    /// Direct call on the query client
    Manual,
    /// Delayed reconciliation after an optimistic click
    Reconciliation,
    /// Background polling tick
    Poll,
    /// Tab became visible
    Visibility,
    /// Signal from another tab
    CrossTab,
    /// Successful link mutation
    Mutation,
}

impl InvalidationSource {
    /// Get source as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidationSource::Manual => "manual",
            InvalidationSource::Reconciliation => "reconciliation",
            InvalidationSource::Poll => "poll",
            InvalidationSource::Visibility => "visibility",
            InvalidationSource::CrossTab => "cross_tab",
            InvalidationSource::Mutation => "mutation",
        }
    }
}

/// Fate of a cross-tab signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalDirection {
    Sent,
    Received,
    /// Received but filtered out
    Ignored,
    /// Payload could not be parsed
    Malformed,
}

impl SignalDirection {
    /// Get direction as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalDirection::Sent => "sent",
            SignalDirection::Received => "received",
            SignalDirection::Ignored => "ignored",
            SignalDirection::Malformed => "malformed",
        }
    }
}

/// Trait for sync metrics/observability
///
/// Implement this to integrate with your metrics system (Prometheus, StatsD, etc.)
pub trait SyncMetrics: Send + Sync + 'static {
    /// Record an optimistic local update of an entry
    fn record_optimistic_update(&self, key: &QueryKey);

    /// Record an entry being marked stale
    fn record_invalidation(&self, key: &QueryKey, source: InvalidationSource);

    /// Record a completed fetch
    fn record_fetch(&self, key: &QueryKey, duration: Duration, success: bool);

    /// Record cross-tab signal traffic
    fn record_signal(&self, kind: Option<SyncType>, direction: SignalDirection);

    /// Record cache size
    fn record_size(&self, size: usize);
}

/// No-op metrics implementation (default)
///
/// Zero overhead when metrics are not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl SyncMetrics for NoopMetrics {
    #[inline]
    fn record_optimistic_update(&self, _key: &QueryKey) {}

    #[inline]
    fn record_invalidation(&self, _key: &QueryKey, _source: InvalidationSource) {}

    #[inline]
    fn record_fetch(&self, _key: &QueryKey, _duration: Duration, _success: bool) {}

    #[inline]
    fn record_signal(&self, _kind: Option<SyncType>, _direction: SignalDirection) {}

    #[inline]
    fn record_size(&self, _size: usize) {}
}

/// Metrics adapter using the `metrics` crate
///
/// Integrates with Prometheus, StatsD, and other exporters via the `metrics` ecosystem.
///
/// # Example
/// ```ignore
/// use biotap_core::MetricsCrateAdapter;
///
/// // Set up a metrics recorder (e.g., prometheus_exporter)
/// // metrics::set_global_recorder(recorder);
///
/// let metrics = MetricsCrateAdapter::new("biotap");
/// // Emits: biotap_invalidations_total, biotap_fetches_total, etc.
/// ```
#[cfg(feature = "metrics")]
#[derive(Debug, Clone)]
pub struct MetricsCrateAdapter {
    prefix: String,
}

#[cfg(feature = "metrics")]
impl MetricsCrateAdapter {
    /// Create a new adapter with the given metric name prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn metric_name(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }
}

#[cfg(feature = "metrics")]
impl SyncMetrics for MetricsCrateAdapter {
    fn record_optimistic_update(&self, _key: &QueryKey) {
        metrics::counter!(self.metric_name("optimistic_updates_total")).increment(1);
    }

    fn record_invalidation(&self, _key: &QueryKey, source: InvalidationSource) {
        metrics::counter!(
            self.metric_name("invalidations_total"),
            "source" => source.as_str()
        )
        .increment(1);
    }

    fn record_fetch(&self, _key: &QueryKey, duration: Duration, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        metrics::counter!(self.metric_name("fetches_total"), "outcome" => outcome).increment(1);
        metrics::histogram!(self.metric_name("fetch_duration_seconds"))
            .record(duration.as_secs_f64());
    }

    fn record_signal(&self, kind: Option<SyncType>, direction: SignalDirection) {
        metrics::counter!(
            self.metric_name("signals_total"),
            "type" => kind.map(|k| k.as_str()).unwrap_or("unknown"),
            "direction" => direction.as_str()
        )
        .increment(1);
    }

    fn record_size(&self, size: usize) {
        metrics::gauge!(self.metric_name("entries")).set(size as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_as_str() {
        assert_eq!(InvalidationSource::Poll.as_str(), "poll");
        assert_eq!(InvalidationSource::CrossTab.as_str(), "cross_tab");
    }

    #[test]
    fn test_direction_as_str() {
        assert_eq!(SignalDirection::Sent.as_str(), "sent");
        assert_eq!(SignalDirection::Malformed.as_str(), "malformed");
    }

    #[test]
    fn test_noop_metrics() {
        let metrics = NoopMetrics;
        // Just verify these don't panic
        metrics.record_optimistic_update(&QueryKey::links(1));
        metrics.record_invalidation(&QueryKey::links(1), InvalidationSource::Manual);
        metrics.record_fetch(&QueryKey::links(1), Duration::from_millis(1), true);
        metrics.record_signal(Some(SyncType::Click), SignalDirection::Sent);
    }
}
