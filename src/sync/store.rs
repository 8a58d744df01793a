//! Contract of the remote list store.

use futures::future::BoxFuture;

use super::error::StoreError;
use crate::models::{List, ListUpdate};

/// Durable collection of lists, the system of record.
///
/// Implemented over HTTP by [`ApiClient`](super::ApiClient) and directly on
/// SQLite by the server's `ListRepository`.
pub trait RemoteListStore: Send + Sync {
    /// Creates an empty list.
    fn create_list<'a>(
        &'a self,
        name: &'a str,
        owner_id: &'a str,
    ) -> BoxFuture<'a, Result<List, StoreError>>;

    /// All lists of one owner, most recently created first.
    fn lists_for_owner<'a>(&'a self, owner_id: &'a str)
        -> BoxFuture<'a, Result<Vec<List>, StoreError>>;

    /// Applies `update` and returns the stored list.
    ///
    /// Fails with [`StoreError::NotFound`] if `list_id` is unknown.
    fn update_list<'a>(
        &'a self,
        list_id: &'a str,
        update: ListUpdate,
    ) -> BoxFuture<'a, Result<List, StoreError>>;

    /// Deletes a list and its items. Deleting an unknown list succeeds.
    fn delete_list<'a>(&'a self, list_id: &'a str) -> BoxFuture<'a, Result<(), StoreError>>;
}
