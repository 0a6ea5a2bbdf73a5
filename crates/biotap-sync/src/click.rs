//! Optimistic click tracking
//!
//! A click increments the cached click count at once, opens the redirect
//! endpoint (which records the click server-side), and a little later
//! invalidates the affected queries so the server's count replaces the
//! optimistic one.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use biotap_core::{
    ANALYTICS, InvalidationSource, JsonSerializer, LINKS, Link, LinkApi, Navigator, NoopMetrics,
    QueryKey, QueryStore, Serializer, SyncMetrics, SyncType, record_click,
};
use biotap_storage::MemoryQueryStore;

use crate::{CrossTabSync, QueryClient};

/// Default delay before optimistic counts are reconciled with the server
pub const DEFAULT_RECONCILE_DELAY: Duration = Duration::from_millis(2000);

/// Configuration for ClickTracker
#[derive(Debug, Clone)]
pub struct ClickTrackerConfig {
    /// Wait before invalidating the optimistically updated queries
    pub reconcile_delay: Duration,
    /// Abort pending reconciliations when the tracker is dropped
    pub cancel_on_drop: bool,
}

impl Default for ClickTrackerConfig {
    fn default() -> Self {
        Self {
            reconcile_delay: DEFAULT_RECONCILE_DELAY,
            cancel_on_drop: true,
        }
    }
}

impl ClickTrackerConfig {
    pub fn reconcile_delay(mut self, delay: Duration) -> Self {
        self.reconcile_delay = delay;
        self
    }

    pub fn cancel_on_drop(mut self, cancel: bool) -> Self {
        self.cancel_on_drop = cancel;
        self
    }
}

/// Optimistic click tracker
pub struct ClickTracker<B = MemoryQueryStore, S = JsonSerializer, M = NoopMetrics>
where
    B: QueryStore,
    S: Serializer,
    M: SyncMetrics,
{
    client: QueryClient<B, S, M>,
    api: Arc<dyn LinkApi>,
    navigator: Arc<dyn Navigator>,
    cross_tab: Option<CrossTabSync>,
    config: ClickTrackerConfig,
    pending: Mutex<JoinSet<()>>,
}

impl<B, S, M> ClickTracker<B, S, M>
where
    B: QueryStore,
    S: Serializer,
    M: SyncMetrics,
{
    /// Create a tracker with default config
    pub fn new(
        client: QueryClient<B, S, M>,
        api: Arc<dyn LinkApi>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::with_config(client, api, navigator, ClickTrackerConfig::default())
    }

    /// Create with custom config
    pub fn with_config(
        client: QueryClient<B, S, M>,
        api: Arc<dyn LinkApi>,
        navigator: Arc<dyn Navigator>,
        config: ClickTrackerConfig,
    ) -> Self {
        Self {
            client,
            api,
            navigator,
            cross_tab: None,
            config,
            pending: Mutex::new(JoinSet::new()),
        }
    }

    /// Also tell other tabs about each click
    pub fn with_cross_tab(mut self, cross_tab: CrossTabSync) -> Self {
        self.cross_tab = Some(cross_tab);
        self
    }

    pub fn config(&self) -> &ClickTrackerConfig {
        &self.config
    }

    /// Record a click on `link_id`
    ///
    /// Every cached link list under `["links"]`, and the public list of
    /// `owner_username` when given, has the link's count incremented before
    /// this returns. Lists that are absent or lack the link are untouched.
    /// Navigation and reconciliation failures are logged, never returned.
    ///
    /// Returns the number of cached lists updated.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the reconciliation
    /// is scheduled on a spawned task.
    pub fn track_click(&self, link_id: i64, owner_username: Option<&str>) -> usize {
        let bump = |mut links: Vec<Link>| {
            record_click(&mut links, link_id);
            links
        };

        let mut updated = 0;
        if let Some(username) = owner_username {
            updated += self
                .client
                .set_queries_data(QueryKey::public_links(username), bump);
        }
        updated += self.client.set_queries_data(QueryKey::root(LINKS), bump);
        debug!(target: "biotap", link_id, updated, "tracked click");

        let url = self.api.redirect_url(link_id);
        if let Err(e) = self.navigator.open(&url) {
            warn!(target: "biotap", link_id, url = %url, error = %e, "failed to open redirect");
        }

        if let Some(cross_tab) = &self.cross_tab {
            if let Err(e) = cross_tab.trigger(SyncType::Click) {
                debug!(target: "biotap", error = %e, "failed to signal click to other tabs");
            }
        }

        self.schedule_reconcile(owner_username.map(QueryKey::public_links));
        updated
    }

    /// Reconciliations that have not fired yet
    pub fn pending_reconciliations(&self) -> usize {
        let mut pending = self.pending.lock();
        while pending.try_join_next().is_some() {}
        pending.len()
    }

    fn schedule_reconcile(&self, public_key: Option<QueryKey>) {
        let client = self.client.clone();
        let delay = self.config.reconcile_delay;

        let mut pending = self.pending.lock();
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(key) = public_key {
                client.invalidate_from(key, InvalidationSource::Reconciliation);
            }
            client.invalidate_from(QueryKey::root(LINKS), InvalidationSource::Reconciliation);
            client.invalidate_from(QueryKey::root(ANALYTICS), InvalidationSource::Reconciliation);
        });
    }
}

impl<B, S, M> Drop for ClickTracker<B, S, M>
where
    B: QueryStore,
    S: Serializer,
    M: SyncMetrics,
{
    fn drop(&mut self) {
        if !self.config.cancel_on_drop {
            self.pending.get_mut().detach_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biotap_core::NoopNavigator;

    struct RedirectOnly;

    #[async_trait::async_trait]
    impl LinkApi for RedirectOnly {
        async fn get_links(&self) -> biotap_core::Result<Vec<Link>> {
            Ok(Vec::new())
        }
        async fn get_public_links(&self, _username: &str) -> biotap_core::Result<Vec<Link>> {
            Ok(Vec::new())
        }
        async fn get_analytics(&self, _days: u32) -> biotap_core::Result<biotap_core::AnalyticsResponse> {
            Err(biotap_core::SyncError::Network("offline".into()))
        }
        async fn get_geographic_analytics(
            &self,
            _days: u32,
        ) -> biotap_core::Result<biotap_core::GeographicResponse> {
            Err(biotap_core::SyncError::Network("offline".into()))
        }
        async fn create_link(&self, _link: &biotap_core::LinkCreate) -> biotap_core::Result<Link> {
            Err(biotap_core::SyncError::Network("offline".into()))
        }
        async fn update_link(
            &self,
            _id: i64,
            _update: &biotap_core::LinkUpdate,
        ) -> biotap_core::Result<Link> {
            Err(biotap_core::SyncError::Network("offline".into()))
        }
        async fn delete_link(&self, _id: i64) -> biotap_core::Result<()> {
            Ok(())
        }
        fn redirect_url(&self, link_id: i64) -> String {
            format!("/links/{}/redirect", link_id)
        }
    }

    fn tracker(config: ClickTrackerConfig) -> ClickTracker {
        ClickTracker::with_config(
            QueryClient::new(),
            Arc::new(RedirectOnly),
            Arc::new(NoopNavigator),
            config,
        )
    }

    #[test]
    #[should_panic(expected = "Tokio 1.x runtime")]
    fn test_click_outside_runtime_panics() {
        let client = QueryClient::new();
        let tracker = ClickTracker::new(client, Arc::new(RedirectOnly), Arc::new(NoopNavigator));
        tracker.track_click(42, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_until_delay_elapses() {
        let tracker = tracker(ClickTrackerConfig::default());
        tracker.track_click(1, None);
        tracker.track_click(1, Some("alice"));
        assert_eq!(tracker.pending_reconciliations(), 2);

        tokio::time::sleep(DEFAULT_RECONCILE_DELAY + Duration::from_millis(1)).await;
        assert_eq!(tracker.pending_reconciliations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending() {
        let tracker = tracker(ClickTrackerConfig::default());
        let client = tracker.client.clone();
        client
            .set_query_data(QueryKey::links(7), |_: Option<Vec<Link>>| Some(Vec::new()))
            .unwrap();

        tracker.track_click(1, None);
        drop(tracker);

        tokio::time::sleep(DEFAULT_RECONCILE_DELAY * 2).await;
        let entry = client
            .get_query_entry::<Vec<Link>>(QueryKey::links(7))
            .unwrap()
            .unwrap();
        assert!(!entry.invalidated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_reconcile_outlives_tracker() {
        let tracker = tracker(ClickTrackerConfig::default().cancel_on_drop(false));
        let client = tracker.client.clone();
        client
            .set_query_data(QueryKey::links(7), |_: Option<Vec<Link>>| Some(Vec::new()))
            .unwrap();

        tracker.track_click(1, None);
        drop(tracker);

        tokio::time::sleep(DEFAULT_RECONCILE_DELAY * 2).await;
        let entry = client
            .get_query_entry::<Vec<Link>>(QueryKey::links(7))
            .unwrap()
            .unwrap();
        assert!(entry.invalidated);
    }
}
