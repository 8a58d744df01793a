//! Scanlist Library
//!
//! Turns scanned documents into checklists that are edited optimistically
//! on the client and kept in a remote list store.

pub mod auth;
pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod scan;
pub mod server;
pub mod session;
pub mod state;
pub mod sync;

pub use auth::{Account, AuthError, AuthProvider};
pub use models::{Item, ItemField, ItemId, ItemRecord, List, ListRecord, ListUpdate};
pub use scan::{items_from_text, OcrEngine, ScanError, Scanner, TesseractEngine};
pub use session::{Session, SessionError};
pub use state::ListState;
pub use sync::{ApiClient, FlushReport, RemoteListStore, StoreError, SyncEngine, SyncError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
