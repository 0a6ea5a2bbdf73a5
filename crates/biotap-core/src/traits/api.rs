//! REST API collaborator trait

use async_trait::async_trait;

use crate::{
    AnalyticsResponse, GeographicResponse, Link, LinkCreate, LinkUpdate, Result, SyncError,
};

/// Link and analytics endpoints consumed by the sync layer
///
/// Transport details (verbs, headers, auth) belong to the implementation.
#[async_trait]
pub trait LinkApi: Send + Sync + 'static {
    /// Links owned by the signed-in user
    async fn get_links(&self) -> Result<Vec<Link>>;

    /// Active links on a public profile
    async fn get_public_links(&self, username: &str) -> Result<Vec<Link>>;

    /// Click analytics for the last `days` days
    async fn get_analytics(&self, days: u32) -> Result<AnalyticsResponse>;

    /// Geographic breakdown for the last `days` days
    async fn get_geographic_analytics(&self, days: u32) -> Result<GeographicResponse>;

    async fn create_link(&self, link: &LinkCreate) -> Result<Link>;

    async fn update_link(&self, id: i64, update: &LinkUpdate) -> Result<Link>;

    async fn delete_link(&self, id: i64) -> Result<()>;

    /// Current server-side record of one owned link
    ///
    /// The default reads the whole list and picks the link out.
    async fn refresh_link_stats(&self, id: i64) -> Result<Link> {
        self.get_links()
            .await?
            .into_iter()
            .find(|l| l.id == id)
            .ok_or_else(|| SyncError::Api {
                status: 404,
                message: "Link not found".to_string(),
            })
    }

    /// URL of the redirect endpoint that records a click and forwards
    /// to the link destination
    fn redirect_url(&self, link_id: i64) -> String;
}
