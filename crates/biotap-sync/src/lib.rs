//! biotap-sync: Optimistic click tracking and cache synchronization
//!
//! # Features
//!
//! - **Query cache** with prefix invalidation and refetch of mounted queries
//! - **Optimistic click counts** reconciled with the server after a delay
//! - **Background polling** gated on page visibility
//! - **Cross-tab invalidation** over a shared key-value store
//! - **Metrics integration**
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use biotap_sync::prelude::*;
//!
//! # fn links() -> Vec<Link> { Vec::new() }
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let client = QueryClient::new();
//!
//!     client.set_query_data(QueryKey::links(7), |_: Option<Vec<Link>>| Some(links()))?;
//!
//!     // Bump link 42 everywhere it is cached
//!     client.set_queries_data(QueryKey::root(LINKS), |mut links: Vec<Link>| {
//!         record_click(&mut links, 42);
//!         links
//!     });
//!
//!     if let Some(links) = client.get_query_data::<Vec<Link>>(QueryKey::links(7))? {
//!         println!("{} links cached", links.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

mod click;
mod client;
mod context;
mod cross_tab;
mod mutations;
pub mod queries;
mod realtime;
mod view;

// Re-export core
pub use biotap_core::*;

// Re-export storage
pub use biotap_storage::{MemoryQueryStore, PageVisibility, SharedStorage, StorageConfig, TabStorage};

pub use click::{ClickTracker, ClickTrackerConfig, DEFAULT_RECONCILE_DELAY};
pub use client::{DEFAULT_GC_TIME, QueryClient, QueryClientConfig, QueryObserver};
pub use context::AppContext;
pub use cross_tab::{CrossTabConfig, CrossTabSubscription, CrossTabSync, DEFAULT_CLEAR_AFTER};
pub use mutations::LinkMutations;
pub use realtime::{DEFAULT_SYNC_INTERVAL, RealtimeSync, RealtimeSyncConfig, SyncHandle};
pub use view::{DashboardView, ProfileView};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AppContext, ClickTracker, ClickTrackerConfig, CrossTabSync, LINKS, Link, LinkApi,
        MemoryQueryStore, PageVisibility, QueryClient, QueryClientConfig, QueryKey, QueryOpts,
        RealtimeSync, RealtimeSyncConfig, Result, SharedStorage, SyncError, SyncType,
        record_click, visible_links,
    };
}
