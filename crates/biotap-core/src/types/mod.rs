//! Core types for sync operations

mod account;
mod analytics;
mod entry;
mod key;
mod link;
mod options;
mod signal;
mod stats;
mod storage;

pub use account::{
    MessageResponse, PasswordChange, PasswordResetConfirm, PasswordResetRequest, Token, User,
    UserRegister, UserUpdate,
};
pub use analytics::{
    AnalyticsResponse, CityStats, CountryStats, DailyClicks, DeviceStats, GeographicResponse,
    TopLink,
};
pub use entry::QueryEntry;
pub use key::{ANALYTICS, GEOGRAPHIC, LINKS, PUBLIC_LINKS, QueryKey};
pub use link::{
    Link, LinkCreate, LinkStats, LinkUpdate, next_display_order, record_click, visible_links,
};
pub use options::{DEFAULT_RETRY_DELAY, DEFAULT_STALE_TIME, QueryOptions, QueryOpts};
pub use signal::{SYNC_SIGNAL_KEY, SyncSignal, SyncType};
pub use stats::SyncStats;
pub use storage::{StorageChange, StorageEvent, StorageEvents, StorageNotice, TabId};
