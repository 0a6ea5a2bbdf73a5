//! biotap-core: Core traits and types for the biotap sync library
//!
//! This crate provides the data model, query keys and the collaborator
//! traits used throughout the biotap workspace.

mod error;
mod traits;
mod types;

pub use error::{Result, SyncError};
pub use traits::*;
pub use types::*;
