//! Standard queries of the application
//!
//! Binds [`LinkApi`] calls to their cache keys and freshness policies.

use std::sync::Arc;
use std::time::Duration;

use biotap_core::{LinkApi, QueryKey, QueryOptions, QueryOpts, QueryStore, Serializer, SyncMetrics};

use crate::{QueryClient, QueryObserver, RealtimeSyncConfig};

/// Freshness of owner and public link lists
pub const LINKS_STALE_TIME: Duration = Duration::from_secs(30);
/// Poll interval of a public profile
pub const PUBLIC_LINKS_POLL_INTERVAL: Duration = Duration::from_secs(15);
/// Freshness of the analytics aggregates
pub const ANALYTICS_STALE_TIME: Duration = Duration::from_secs(5 * 60);
/// Poll interval of the analytics dashboard
pub const ANALYTICS_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub fn links_options() -> QueryOptions {
    QueryOpts::new().stale_time(LINKS_STALE_TIME).retry(1).build()
}

pub fn public_links_options() -> QueryOptions {
    QueryOpts::new().stale_time(LINKS_STALE_TIME).retry(1).build()
}

pub fn analytics_options() -> QueryOptions {
    QueryOpts::new().stale_time(ANALYTICS_STALE_TIME).build()
}

pub fn geographic_options() -> QueryOptions {
    QueryOpts::new().stale_time(ANALYTICS_STALE_TIME).build()
}

/// Mount the signed-in user's link list at `["links", user_id]`
pub fn observe_links<B, S, M>(
    client: &QueryClient<B, S, M>,
    api: Arc<dyn LinkApi>,
    user_id: i64,
) -> QueryObserver
where
    B: QueryStore,
    S: Serializer,
    M: SyncMetrics,
{
    client.observe(QueryKey::links(user_id), links_options(), move || {
        let api = api.clone();
        async move { api.get_links().await }
    })
}

/// Mount a public profile's link list at `["publicLinks", username]`
pub fn observe_public_links<B, S, M>(
    client: &QueryClient<B, S, M>,
    api: Arc<dyn LinkApi>,
    username: &str,
) -> QueryObserver
where
    B: QueryStore,
    S: Serializer,
    M: SyncMetrics,
{
    let owner = username.to_string();
    client.observe(QueryKey::public_links(username), public_links_options(), move || {
        let api = api.clone();
        let owner = owner.clone();
        async move { api.get_public_links(&owner).await }
    })
}

/// Mount the analytics aggregate at `["analytics", user_id, days]`
pub fn observe_analytics<B, S, M>(
    client: &QueryClient<B, S, M>,
    api: Arc<dyn LinkApi>,
    user_id: i64,
    days: u32,
) -> QueryObserver
where
    B: QueryStore,
    S: Serializer,
    M: SyncMetrics,
{
    client.observe(QueryKey::analytics(user_id, days), analytics_options(), move || {
        let api = api.clone();
        async move { api.get_analytics(days).await }
    })
}

/// Mount the geographic breakdown at `["geographic-analytics", user_id, days]`
pub fn observe_geographic<B, S, M>(
    client: &QueryClient<B, S, M>,
    api: Arc<dyn LinkApi>,
    user_id: i64,
    days: u32,
) -> QueryObserver
where
    B: QueryStore,
    S: Serializer,
    M: SyncMetrics,
{
    client.observe(QueryKey::geographic(user_id, days), geographic_options(), move || {
        let api = api.clone();
        async move { api.get_geographic_analytics(days).await }
    })
}

/// Polling of a public profile
pub fn public_links_sync(username: &str) -> RealtimeSyncConfig {
    RealtimeSyncConfig::new(QueryKey::public_links(username)).interval(PUBLIC_LINKS_POLL_INTERVAL)
}

/// Polling of the analytics dashboard
pub fn analytics_sync(user_id: i64, days: u32) -> RealtimeSyncConfig {
    RealtimeSyncConfig::new(QueryKey::analytics(user_id, days)).interval(ANALYTICS_POLL_INTERVAL)
}
