//! Server-side modules for the scanlist list server.

mod routes;

pub use routes::{router, ApiError, AppState};

use std::sync::Arc;

use crate::db::{ListRepository, UserRepository};

impl AppState {
    /// State backed by one SQLite pool.
    pub fn sqlite(pool: sqlx::SqlitePool) -> Self {
        Self {
            lists: Arc::new(ListRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool)),
        }
    }
}
