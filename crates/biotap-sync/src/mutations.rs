//! Link mutations
//!
//! Explicit user edits go straight to the API. On success the owner's
//! cached lists are invalidated and other tabs are told that links changed.

use std::sync::Arc;
use tracing::{debug, warn};

use biotap_core::{
    InvalidationSource, JsonSerializer, LINKS, Link, LinkApi, LinkCreate, LinkUpdate, NoopMetrics,
    QueryKey, QueryStore, Result, Serializer, SyncMetrics, SyncType, User, next_display_order,
};
use biotap_storage::MemoryQueryStore;

use crate::{CrossTabSync, QueryClient};

/// Create, edit, delete and reorder the signed-in user's links
pub struct LinkMutations<B = MemoryQueryStore, S = JsonSerializer, M = NoopMetrics>
where
    B: QueryStore,
    S: Serializer,
    M: SyncMetrics,
{
    client: QueryClient<B, S, M>,
    api: Arc<dyn LinkApi>,
    cross_tab: Option<CrossTabSync>,
    owner: Option<User>,
}

impl<B, S, M> LinkMutations<B, S, M>
where
    B: QueryStore,
    S: Serializer,
    M: SyncMetrics,
{
    pub fn new(client: QueryClient<B, S, M>, api: Arc<dyn LinkApi>) -> Self {
        Self {
            client,
            api,
            cross_tab: None,
            owner: None,
        }
    }

    /// Broadcast a `link` signal after each successful mutation
    pub fn with_cross_tab(mut self, cross_tab: CrossTabSync) -> Self {
        self.cross_tab = Some(cross_tab);
        self
    }

    /// Mutate on behalf of `owner`
    ///
    /// New links are appended after the owner's cached list and the
    /// owner's public profile list is invalidated along with the rest.
    pub fn with_owner(mut self, owner: User) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Create a link
    ///
    /// With an owner set, `display_order` is replaced by the position after
    /// the last link in the owner's cached list.
    pub async fn create(&self, link: &LinkCreate) -> Result<Link> {
        let mut link = link.clone();
        if let Some(owner) = &self.owner {
            let cached: Vec<Link> = self
                .client
                .get_query_data(QueryKey::links(owner.id))?
                .unwrap_or_default();
            link.display_order = next_display_order(&cached);
        }

        let created = self.api.create_link(&link).await?;
        debug!(target: "biotap", id = created.id, "created link");
        self.links_changed();
        Ok(created)
    }

    pub async fn update(&self, id: i64, update: &LinkUpdate) -> Result<Link> {
        let updated = self.api.update_link(id, update).await?;
        debug!(target: "biotap", id, "updated link");
        self.links_changed();
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.api.delete_link(id).await?;
        debug!(target: "biotap", id, "deleted link");
        self.links_changed();
        Ok(())
    }

    /// Show or hide a link on the public profile
    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<Link> {
        self.update(id, &LinkUpdate::active(is_active)).await
    }

    /// Persist a new order: `ids[i]` gets `display_order = i`
    ///
    /// Stops at the first failure. Links already updated stay updated and
    /// the caches are invalidated either way.
    pub async fn reorder(&self, ids: &[i64]) -> Result<Vec<Link>> {
        let mut reordered = Vec::with_capacity(ids.len());
        let mut outcome = Ok(());

        for (order, &id) in ids.iter().enumerate() {
            let order = i32::try_from(order).unwrap_or(i32::MAX);
            match self.api.update_link(id, &LinkUpdate::display_order(order)).await {
                Ok(link) => reordered.push(link),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        if !reordered.is_empty() {
            self.links_changed();
        }
        outcome.map(|()| reordered)
    }

    fn links_changed(&self) {
        self.client
            .invalidate_from(QueryKey::root(LINKS), InvalidationSource::Mutation);
        if let Some(owner) = &self.owner {
            self.client.invalidate_from(
                QueryKey::public_links(&owner.username),
                InvalidationSource::Mutation,
            );
        }
        if let Some(cross_tab) = &self.cross_tab {
            if let Err(e) = cross_tab.trigger(SyncType::Link) {
                warn!(target: "biotap", error = %e, "failed to signal link change to other tabs");
            }
        }
    }
}
