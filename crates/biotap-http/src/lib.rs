//! biotap-http: REST API client for biotap
//!
//! [`HttpLinkApi`] implements [`biotap_core::LinkApi`] over `reqwest`. The
//! access token lives in an explicitly constructed [`ApiSession`] that the
//! application shares with every client it builds.
//!
//! ```rust,no_run
//! use biotap_core::LinkApi;
//! use biotap_http::{ApiConfig, ApiSession, HttpLinkApi};
//!
//! # async fn run() -> biotap_core::Result<()> {
//! let session = ApiSession::new();
//! let api = HttpLinkApi::new(ApiConfig::from_env()?, session.clone())?;
//!
//! api.login("alice", "hunter2").await?;
//! let links = api.get_links().await?;
//! println!("{} links, redirect via {}", links.len(), api.redirect_url(42));
//!
//! session.clear();
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod endpoints;
mod session;

pub use client::{DEFAULT_RETRY_AFTER_SECS, HttpLinkApi};
pub use config::{ApiConfig, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use endpoints::Endpoints;
pub use session::ApiSession;
