//! Query keys

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Root segment for an owner's link list
pub const LINKS: &str = "links";
/// Root segment for a public profile's link list
pub const PUBLIC_LINKS: &str = "publicLinks";
/// Root segment for the analytics aggregate
pub const ANALYTICS: &str = "analytics";
/// Root segment for the geographic breakdown
pub const GEOGRAPHIC: &str = "geographic-analytics";

/// Ordered list of identifier segments naming a cache entry
///
/// A key doubles as a filter: `["links"]` matches `["links", "7"]`
/// and every other key that starts with the same segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey {
    parts: Vec<String>,
}

impl QueryKey {
    /// Create an empty key (matches everything when used as a filter)
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Single-segment key, typically used as an invalidation prefix
    pub fn root(segment: impl Display) -> Self {
        Self::new().part(segment)
    }

    /// `["links", user_id]`
    pub fn links(user_id: i64) -> Self {
        Self::root(LINKS).part(user_id)
    }

    /// `["publicLinks", username]`
    pub fn public_links(username: &str) -> Self {
        Self::root(PUBLIC_LINKS).part(username)
    }

    /// `["analytics", user_id, days]`
    pub fn analytics(user_id: i64, days: u32) -> Self {
        Self::root(ANALYTICS).part(user_id).part(days)
    }

    /// `["geographic-analytics", user_id, days]`
    pub fn geographic(user_id: i64, days: u32) -> Self {
        Self::root(GEOGRAPHIC).part(user_id).part(days)
    }

    /// Add a part to the key
    pub fn part(mut self, part: impl Display) -> Self {
        self.parts.push(part.to_string());
        self
    }

    /// Add multiple parts
    pub fn parts<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Display,
    {
        self.parts.extend(parts.into_iter().map(|p| p.to_string()));
        self
    }

    /// Segments of the key
    pub fn segments(&self) -> &[String] {
        &self.parts
    }

    /// Whether `self`, used as a filter, selects `key`
    pub fn matches(&self, key: &QueryKey) -> bool {
        key.parts.starts_with(&self.parts)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Default for QueryKey {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join(":"))
    }
}

impl From<&str> for QueryKey {
    fn from(segment: &str) -> Self {
        Self::root(segment)
    }
}

impl From<String> for QueryKey {
    fn from(segment: String) -> Self {
        Self::root(segment)
    }
}

impl From<&QueryKey> for QueryKey {
    fn from(key: &QueryKey) -> Self {
        key.clone()
    }
}

// Tuple conversions for composite keys

impl<T1: Display, T2: Display> From<(T1, T2)> for QueryKey {
    fn from((a, b): (T1, T2)) -> Self {
        Self::new().part(a).part(b)
    }
}

impl<T1: Display, T2: Display, T3: Display> From<(T1, T2, T3)> for QueryKey {
    fn from((a, b, c): (T1, T2, T3)) -> Self {
        Self::new().part(a).part(b).part(c)
    }
}
