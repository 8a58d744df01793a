//! Persistence and synchronization of lists.
//!
//! - [`RemoteListStore`]: contract of the system of record
//! - [`ApiClient`]: that contract over HTTP
//! - [`SyncEngine`]: optimistic local edits with full-replace writes

mod client;
mod engine;
mod error;
mod store;

pub use client::ApiClient;
pub use engine::{FlushReport, SyncEngine};
pub use error::{StoreError, SyncError};
pub use store::RemoteListStore;
