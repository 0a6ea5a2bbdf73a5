//! Mounted views
//!
//! A view mounts its queries, pollers and cross-tab listener from an
//! [`AppContext`] and owns all of them; dropping the view unmounts
//! everything it registered.

use std::sync::Arc;

use biotap_core::{
    ANALYTICS, AnalyticsResponse, GeographicResponse, Link, LinkApi, LinkStats, Navigator,
    QueryKey, Result, User, visible_links,
};
use biotap_storage::PageVisibility;

use crate::queries::{
    analytics_sync, observe_analytics, observe_geographic, observe_links, observe_public_links,
    public_links_sync,
};
use crate::{
    AppContext, ClickTracker, CrossTabSubscription, CrossTabSync, LinkMutations, QueryClient,
    QueryObserver, RealtimeSync, RealtimeSyncConfig, SyncHandle,
};

/// Public profile of one user
pub struct ProfileView {
    username: String,
    client: QueryClient,
    tracker: ClickTracker,
    _links: QueryObserver,
    _poll: SyncHandle,
    _cross_tab: Option<CrossTabSubscription>,
}

impl ProfileView {
    /// Mount the profile of `username`
    ///
    /// Requires a [`QueryClient`], an `Arc<dyn LinkApi>`, an
    /// `Arc<dyn Navigator>` and a [`PageVisibility`] in `ctx`; uses a
    /// [`CrossTabSync`] when one is provided.
    pub fn mount(ctx: &AppContext, username: &str) -> Result<Self> {
        let client = ctx.require::<QueryClient>().clone();
        let api = ctx.require::<Arc<dyn LinkApi>>().clone();
        let navigator = ctx.require::<Arc<dyn Navigator>>().clone();
        let visibility = ctx.require::<PageVisibility>();
        let cross_tab = ctx.get::<CrossTabSync>();

        let links = observe_public_links(&client, api.clone(), username);
        let poll = RealtimeSync::start(&client, visibility, public_links_sync(username))?;
        let subscription = cross_tab.map(|sync| {
            let keys = vec![QueryKey::public_links(username), QueryKey::root(ANALYTICS)];
            sync.subscribe(&client, keys)
        });

        let mut tracker = ClickTracker::new(client.clone(), api, navigator);
        if let Some(sync) = cross_tab {
            tracker = tracker.with_cross_tab(sync.clone());
        }

        Ok(Self {
            username: username.to_string(),
            client,
            tracker,
            _links: links,
            _poll: poll,
            _cross_tab: subscription,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Links to render: active only, in display order
    pub fn links(&self) -> Result<Vec<Link>> {
        let links: Option<Vec<Link>> = self
            .client
            .get_query_data(QueryKey::public_links(&self.username))?;
        Ok(links.map(|links| visible_links(&links)).unwrap_or_default())
    }

    /// Active link count and clicks across the rendered links
    pub fn stats(&self) -> Result<LinkStats> {
        Ok(LinkStats::from_links(&self.links()?))
    }

    /// Handle a click on one of the profile's links
    pub fn click(&self, link_id: i64) -> usize {
        self.tracker.track_click(link_id, Some(&self.username))
    }
}

/// The signed-in user's dashboard
pub struct DashboardView {
    user: User,
    days: u32,
    client: QueryClient,
    tracker: ClickTracker,
    mutations: LinkMutations,
    _observers: Vec<QueryObserver>,
    _polls: Vec<SyncHandle>,
    _cross_tab: Option<CrossTabSubscription>,
}

impl DashboardView {
    /// Mount the dashboard of `user` with analytics over the last `days`
    ///
    /// Requires the same context entries as [`ProfileView::mount`].
    pub fn mount(ctx: &AppContext, user: User, days: u32) -> Result<Self> {
        let client = ctx.require::<QueryClient>().clone();
        let api = ctx.require::<Arc<dyn LinkApi>>().clone();
        let navigator = ctx.require::<Arc<dyn Navigator>>().clone();
        let visibility = ctx.require::<PageVisibility>();
        let cross_tab = ctx.get::<CrossTabSync>();

        let observers = vec![
            observe_links(&client, api.clone(), user.id),
            observe_analytics(&client, api.clone(), user.id, days),
            observe_geographic(&client, api.clone(), user.id, days),
        ];
        let links_sync = RealtimeSyncConfig::new(QueryKey::links(user.id));
        let polls = vec![
            RealtimeSync::start(&client, visibility, links_sync)?,
            RealtimeSync::start(&client, visibility, analytics_sync(user.id, days))?,
        ];
        let subscription = cross_tab.map(|sync| {
            let keys = vec![QueryKey::links(user.id), QueryKey::root(ANALYTICS)];
            sync.subscribe(&client, keys)
        });

        let mut tracker = ClickTracker::new(client.clone(), api.clone(), navigator);
        let mut mutations = LinkMutations::new(client.clone(), api).with_owner(user.clone());
        if let Some(sync) = cross_tab {
            tracker = tracker.with_cross_tab(sync.clone());
            mutations = mutations.with_cross_tab(sync.clone());
        }

        Ok(Self {
            user,
            days,
            client,
            tracker,
            mutations,
            _observers: observers,
            _polls: polls,
            _cross_tab: subscription,
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// All of the user's links, in display order
    pub fn links(&self) -> Result<Vec<Link>> {
        let mut links: Vec<Link> = self
            .client
            .get_query_data(QueryKey::links(self.user.id))?
            .unwrap_or_default();
        links.sort_by_key(|l| (l.display_order, l.id));
        Ok(links)
    }

    /// Active, hidden and top links with the click total
    pub fn stats(&self) -> Result<LinkStats> {
        Ok(LinkStats::from_links(&self.links()?))
    }

    pub fn analytics(&self) -> Result<Option<AnalyticsResponse>> {
        self.client
            .get_query_data(QueryKey::analytics(self.user.id, self.days))
    }

    pub fn geographic(&self) -> Result<Option<GeographicResponse>> {
        self.client
            .get_query_data(QueryKey::geographic(self.user.id, self.days))
    }

    /// Handle a click on one of the user's links from the dashboard
    pub fn click(&self, link_id: i64) -> usize {
        self.tracker.track_click(link_id, Some(&self.user.username))
    }

    pub fn mutations(&self) -> &LinkMutations {
        &self.mutations
    }
}
