//! Link records mirrored from the API

use serde::{Deserialize, Serialize};

/// A link owned by a user, as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: i64,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
    pub click_count: u64,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Link {
    /// Record one click locally
    pub fn record_click(&mut self) {
        self.click_count = self.click_count.saturating_add(1);
    }
}

/// Payload for creating a link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCreate {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Partial update of a link; unset fields are left unchanged server-side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl LinkUpdate {
    pub fn display_order(order: i32) -> Self {
        Self {
            display_order: Some(order),
            ..Default::default()
        }
    }

    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }
}

/// Links shown on a public profile: active only, ordered by
/// `(display_order, id)` so ties never render nondeterministically.
pub fn visible_links(links: &[Link]) -> Vec<Link> {
    let mut visible: Vec<Link> = links.iter().filter(|l| l.is_active).cloned().collect();
    visible.sort_by_key(|l| (l.display_order, l.id));
    visible
}

/// Apply one click to the link with `link_id`, if present.
///
/// Returns `true` when a link was updated.
pub fn record_click(links: &mut [Link], link_id: i64) -> bool {
    match links.iter_mut().find(|l| l.id == link_id) {
        Some(link) => {
            link.record_click();
            true
        }
        None => false,
    }
}

/// Position for a link appended after `links`
pub fn next_display_order(links: &[Link]) -> i32 {
    links
        .iter()
        .map(|l| l.display_order)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Summary figures over a set of links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Links shown publicly
    pub active: usize,
    /// Links switched off by their owner
    pub hidden: usize,
    pub total_clicks: u64,
    /// Most clicked link; the earliest one wins a tie
    pub top_link: Option<Link>,
}

impl LinkStats {
    pub fn from_links(links: &[Link]) -> Self {
        let active = links.iter().filter(|l| l.is_active).count();
        let top_link = links
            .iter()
            .fold(None::<&Link>, |top, link| match top {
                Some(top) if link.click_count <= top.click_count => Some(top),
                _ => Some(link),
            })
            .cloned();

        Self {
            active,
            hidden: links.len() - active,
            total_clicks: links.iter().map(|l| l.click_count).sum(),
            top_link,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_link(id: i64, display_order: i32, click_count: u64) -> Link {
    Link {
        id,
        title: format!("Link {}", id),
        url: format!("https://example.com/{}", id),
        description: None,
        is_active: true,
        display_order,
        click_count,
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: None,
        user_id: 7,
        icon: None,
    }
}
