//! Collaborator traits for sync operations

mod api;
mod metrics;
mod platform;
mod serializer;
mod store;

#[cfg(feature = "tracing")]
mod log;

pub use api::LinkApi;
pub use metrics::{InvalidationSource, NoopMetrics, SignalDirection, SyncMetrics};
pub use platform::{Navigator, NoopNavigator, SignalStore, VisibilitySource};
pub use serializer::{JsonSerializer, Serializer};
pub use store::QueryStore;

#[cfg(feature = "metrics")]
pub use metrics::MetricsCrateAdapter;

#[cfg(feature = "tracing")]
pub use log::TracingMetrics;
