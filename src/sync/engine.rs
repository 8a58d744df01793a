//! Optimistic synchronization of the open list.
//!
//! Local state is the visible truth. Every mutation is applied to the
//! [`ListState`] first, then the full item array is written to the remote
//! store in a spawned task. Write failures are logged and otherwise ignored:
//! nothing is rolled back and nothing is retried.
//!
//! Update responses are never folded back into local state. Server state
//! replaces local state only on an explicit read ([`SyncEngine::open`] or
//! [`SyncEngine::refresh`]), which is also when provisional item identities
//! become durable.

use std::sync::Arc;

use tokio::task::JoinSet;

use super::error::{StoreError, SyncError};
use super::store::RemoteListStore;
use crate::models::{Item, ItemField, ItemId, List, ListUpdate};
use crate::session::Session;
use crate::state::ListState;

/// Outcome of waiting for outstanding writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub persisted: usize,
    pub failed: usize,
}

/// Mediates between the open list and the remote store.
pub struct SyncEngine {
    store: Arc<dyn RemoteListStore>,
    owner_id: String,
    open: Option<ListState>,
    pending: JoinSet<Result<(), StoreError>>,
    report: FlushReport,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn RemoteListStore>, session: &Session) -> Self {
        Self {
            store,
            owner_id: session.user_id.clone(),
            open: None,
            pending: JoinSet::new(),
            report: FlushReport::default(),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// The open list, if any.
    pub fn current(&self) -> Option<&ListState> {
        self.open.as_ref()
    }

    /// All lists of the session owner, most recent first.
    pub async fn lists(&self) -> Result<Vec<List>, SyncError> {
        Ok(self.store.lists_for_owner(&self.owner_id).await?)
    }

    /// Creates an empty list and opens it.
    pub async fn create_list(&mut self, name: &str) -> Result<&ListState, SyncError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SyncError::InvalidName);
        }

        let list = self.store.create_list(name, &self.owner_id).await?;
        tracing::info!(list_id = %list.id, name = %list.name, "Created list");
        Ok(self.open_list(list))
    }

    /// Reads the list from the store and makes it the open list.
    pub async fn open(&mut self, list_id: &str) -> Result<&ListState, SyncError> {
        let list = self
            .lists()
            .await?
            .into_iter()
            .find(|list| list.id == list_id)
            .ok_or_else(|| StoreError::NotFound(list_id.to_string()))?;
        Ok(self.open_list(list))
    }

    /// Opens a list obtained from a read the caller already performed.
    pub fn open_list(&mut self, list: List) -> &ListState {
        self.open.insert(ListState::new(list))
    }

    /// Re-reads the open list, replacing local state with the server's.
    pub async fn refresh(&mut self) -> Result<&ListState, SyncError> {
        let list_id = self.state()?.id().to_string();
        self.open(&list_id).await
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    /// Deletes a list remotely, closing it if it is the open one.
    pub async fn delete_list(&mut self, list_id: &str) -> Result<(), SyncError> {
        self.store.delete_list(list_id).await?;
        if self.open.as_ref().is_some_and(|state| state.id() == list_id) {
            self.open = None;
        }
        tracing::info!(list_id, "Deleted list");
        Ok(())
    }

    pub fn toggle_checked(&mut self, id: &ItemId) -> Result<(), SyncError> {
        self.state_mut()?.toggle_checked(id);
        self.persist_items();
        Ok(())
    }

    pub fn set_field(
        &mut self,
        id: &ItemId,
        field: ItemField,
        value: impl Into<String>,
    ) -> Result<(), SyncError> {
        self.state_mut()?.set_field(id, field, value);
        self.persist_items();
        Ok(())
    }

    /// Edits text and note as one mutation, so one write carries both.
    pub fn edit_item(
        &mut self,
        id: &ItemId,
        text: Option<&str>,
        note: Option<&str>,
    ) -> Result<(), SyncError> {
        self.state_mut()?.edit_item(id, text, note);
        self.persist_items();
        Ok(())
    }

    pub fn delete_item(&mut self, id: &ItemId) -> Result<(), SyncError> {
        self.state_mut()?.delete_item(id);
        self.persist_items();
        Ok(())
    }

    /// Appends one item and returns its (provisional) identity.
    pub fn append_item(&mut self, item: Item) -> Result<ItemId, SyncError> {
        let id = item.id.clone();
        self.state_mut()?.append_item(item);
        self.persist_items();
        Ok(id)
    }

    /// Appends a batch, typically the result of a scan, as one write.
    pub fn append_many(&mut self, items: Vec<Item>) -> Result<usize, SyncError> {
        let count = items.len();
        self.state_mut()?.append_many(items);
        self.persist_items();
        Ok(count)
    }

    /// Renames the open list. Only the name is sent to the store.
    pub fn rename(&mut self, name: &str) -> Result<(), SyncError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SyncError::InvalidName);
        }

        let state = self.state_mut()?;
        state.rename(name);
        let list_id = state.id().to_string();
        self.spawn_write(list_id, ListUpdate::rename(name));
        Ok(())
    }

    /// Waits for every outstanding write and reports how they went.
    ///
    /// Failures are already logged; they are counted here, never returned.
    pub async fn flush(&mut self) -> FlushReport {
        while let Some(joined) = self.pending.join_next().await {
            self.record(joined);
        }
        std::mem::take(&mut self.report)
    }

    /// Number of writes spawned but not yet collected.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    fn state(&self) -> Result<&ListState, SyncError> {
        self.open.as_ref().ok_or(SyncError::NoOpenList)
    }

    fn state_mut(&mut self) -> Result<&mut ListState, SyncError> {
        self.open.as_mut().ok_or(SyncError::NoOpenList)
    }

    fn persist_items(&mut self) {
        let Some(state) = self.open.as_ref() else {
            return;
        };
        let update = ListUpdate::full(state.items(), state.name());
        let list_id = state.id().to_string();
        self.spawn_write(list_id, update);
    }

    fn spawn_write(&mut self, list_id: String, update: ListUpdate) {
        while let Some(joined) = self.pending.try_join_next() {
            self.record(joined);
        }

        let store = Arc::clone(&self.store);
        self.pending.spawn(async move {
            match store.update_list(&list_id, update).await {
                Ok(_) => {
                    tracing::debug!(list_id = %list_id, "List persisted");
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(list_id = %list_id, error = %e, "Failed to persist list, keeping local state");
                    Err(e)
                }
            }
        });
    }

    fn record(&mut self, joined: Result<Result<(), StoreError>, tokio::task::JoinError>) {
        match joined {
            Ok(Ok(())) => self.report.persisted += 1,
            Ok(Err(_)) => self.report.failed += 1,
            Err(e) => {
                tracing::warn!(error = %e, "List write task aborted");
                self.report.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use futures::future::BoxFuture;
    use std::sync::Mutex;

    /// In-memory store that records every update it receives.
    #[derive(Default)]
    struct RecordingStore {
        lists: Mutex<Vec<List>>,
        updates: Mutex<Vec<(String, ListUpdate)>>,
        fail_updates: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                fail_updates: true,
                ..Self::default()
            }
        }

        fn updates(&self) -> Vec<(String, ListUpdate)> {
            self.updates.lock().unwrap().clone()
        }

        /// Assigns durable ids the way the server would.
        fn apply(&self, list_id: &str, update: &ListUpdate) -> Option<List> {
            let mut lists = self.lists.lock().unwrap();
            let list = lists.iter_mut().find(|l| l.id == list_id)?;
            if let Some(items) = &update.items {
                list.items = items
                    .iter()
                    .enumerate()
                    .map(|(n, record)| {
                        let mut record = record.clone();
                        record.id.get_or_insert_with(|| format!("{}-{}", list_id, n));
                        Item::from(record)
                    })
                    .collect();
            }
            if let Some(name) = update.name.as_ref().filter(|n| !n.is_empty()) {
                list.name = name.clone();
            }
            Some(list.clone())
        }
    }

    impl RemoteListStore for RecordingStore {
        fn create_list<'a>(
            &'a self,
            name: &'a str,
            owner_id: &'a str,
        ) -> BoxFuture<'a, Result<List, StoreError>> {
            Box::pin(async move {
                let mut lists = self.lists.lock().unwrap();
                let list = List {
                    id: format!("list-{}", lists.len() + 1),
                    owner_id: owner_id.to_string(),
                    name: name.to_string(),
                    items: Vec::new(),
                    created_at: Utc::now(),
                };
                lists.insert(0, list.clone());
                Ok(list)
            })
        }

        fn lists_for_owner<'a>(
            &'a self,
            owner_id: &'a str,
        ) -> BoxFuture<'a, Result<Vec<List>, StoreError>> {
            Box::pin(async move {
                let lists = self.lists.lock().unwrap();
                Ok(lists
                    .iter()
                    .filter(|l| l.owner_id == owner_id)
                    .cloned()
                    .collect())
            })
        }

        fn update_list<'a>(
            &'a self,
            list_id: &'a str,
            update: ListUpdate,
        ) -> BoxFuture<'a, Result<List, StoreError>> {
            Box::pin(async move {
                self.updates
                    .lock()
                    .unwrap()
                    .push((list_id.to_string(), update.clone()));
                if self.fail_updates {
                    return Err(StoreError::Network("connection refused".to_string()));
                }
                self.apply(list_id, &update)
                    .ok_or_else(|| StoreError::NotFound(list_id.to_string()))
            })
        }

        fn delete_list<'a>(&'a self, list_id: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
            Box::pin(async move {
                self.lists.lock().unwrap().retain(|l| l.id != list_id);
                Ok(())
            })
        }
    }

    fn session() -> Session {
        Session {
            user_id: "user-1".to_string(),
            username: "alice".to_string(),
        }
    }

    fn engine_with(store: &Arc<RecordingStore>) -> SyncEngine {
        let store: Arc<dyn RemoteListStore> = store.clone();
        SyncEngine::new(store, &session())
    }

    #[tokio::test]
    async fn test_create_list_opens_empty_list() {
        let store = Arc::new(RecordingStore::default());
        let mut engine = engine_with(&store);

        let state = engine.create_list("Groceries").await.unwrap();
        assert_eq!(state.name(), "Groceries");
        assert!(state.items().is_empty());

        let lists = engine.lists().await.unwrap();
        assert_eq!(lists.len(), 1);
        assert!(lists[0].items.is_empty());
    }

    #[tokio::test]
    async fn test_create_list_rejects_blank_name() {
        let store = Arc::new(RecordingStore::default());
        let mut engine = engine_with(&store);

        let result = engine.create_list("   ").await;
        assert!(matches!(result, Err(SyncError::InvalidName)));
        assert!(engine.lists().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_require_open_list() {
        let store = Arc::new(RecordingStore::default());
        let mut engine = engine_with(&store);

        let result = engine.append_item(Item::new("Milk"));
        assert!(matches!(result, Err(SyncError::NoOpenList)));
        assert!(store.updates().is_empty());
    }

    #[tokio::test]
    async fn test_every_mutation_sends_full_array() {
        let store = Arc::new(RecordingStore::default());
        let mut engine = engine_with(&store);
        engine.create_list("Groceries").await.unwrap();

        let milk = engine.append_item(Item::new("Milk")).unwrap();
        engine.append_item(Item::new("Eggs")).unwrap();
        engine.toggle_checked(&milk).unwrap();
        engine.set_field(&milk, ItemField::Note, "2L").unwrap();

        let report = engine.flush().await;
        assert_eq!(report, FlushReport { persisted: 4, failed: 0 });

        let updates = store.updates();
        assert_eq!(updates.len(), 4);
        for (list_id, update) in &updates {
            assert_eq!(list_id, "list-1");
            assert_eq!(update.name.as_deref(), Some("Groceries"));
        }
        let sizes: Vec<usize> = updates
            .iter()
            .map(|(_, u)| u.items.as_ref().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![1, 2, 2, 2]);
    }

    #[tokio::test]
    async fn test_edit_item_is_one_write() {
        let store = Arc::new(RecordingStore::default());
        let mut engine = engine_with(&store);
        engine.create_list("Groceries").await.unwrap();
        let milk = engine.append_item(Item::new("Milk")).unwrap();
        engine.flush().await;

        engine.edit_item(&milk, Some("Oat milk"), Some("2L")).unwrap();
        let report = engine.flush().await;
        assert_eq!(report, FlushReport { persisted: 1, failed: 0 });

        let updates = store.updates();
        assert_eq!(updates.len(), 2);
        let items = updates[1].1.items.as_ref().unwrap();
        assert_eq!(items[0].text, "Oat milk");
        assert_eq!(items[0].note, "2L");
    }

    #[tokio::test]
    async fn test_provisional_ids_survive_until_refresh() {
        let store = Arc::new(RecordingStore::default());
        let mut engine = engine_with(&store);
        engine.create_list("Groceries").await.unwrap();

        let id = engine.append_item(Item::new("Milk")).unwrap();
        engine.set_field(&id, ItemField::Text, "Oat milk").unwrap();
        engine.toggle_checked(&id).unwrap();
        engine.flush().await;

        // Update responses carried durable ids; local state must not adopt them.
        let item = engine.current().unwrap().find(&id).unwrap();
        assert!(item.id.is_provisional());
        assert_eq!(item.text, "Oat milk");

        let state = engine.refresh().await.unwrap();
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].id, ItemId::durable("list-1-0"));
        assert_eq!(state.items()[0].text, "Oat milk");
        assert!(state.items()[0].is_checked);
    }

    #[tokio::test]
    async fn test_rename_sends_name_only() {
        let store = Arc::new(RecordingStore::default());
        let mut engine = engine_with(&store);
        engine.create_list("Groceries").await.unwrap();

        engine.rename("  Weekend  ").unwrap();
        engine.flush().await;

        assert_eq!(engine.current().unwrap().name(), "Weekend");
        let updates = store.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1, ListUpdate::rename("Weekend"));
    }

    #[tokio::test]
    async fn test_rename_rejects_blank_name() {
        let store = Arc::new(RecordingStore::default());
        let mut engine = engine_with(&store);
        engine.create_list("Groceries").await.unwrap();

        assert!(matches!(engine.rename(""), Err(SyncError::InvalidName)));
        assert_eq!(engine.current().unwrap().name(), "Groceries");
        assert_eq!(engine.flush().await, FlushReport::default());
    }

    #[tokio::test]
    async fn test_failed_writes_keep_local_state() {
        let store = Arc::new(RecordingStore::failing());
        let mut engine = engine_with(&store);
        engine.create_list("Groceries").await.unwrap();

        engine.append_many(vec![Item::new("A"), Item::new("B")]).unwrap();
        let report = engine.flush().await;

        assert_eq!(report, FlushReport { persisted: 0, failed: 1 });
        let texts: Vec<&str> = engine
            .current()
            .unwrap()
            .items()
            .iter()
            .map(|i| i.text.as_str())
            .collect();
        assert_eq!(texts, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_open_unknown_list_is_not_found() {
        let store = Arc::new(RecordingStore::default());
        let mut engine = engine_with(&store);

        let result = engine.open("missing").await;
        assert!(matches!(
            result,
            Err(SyncError::Store(StoreError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_write_to_deleted_list_is_swallowed() {
        let store = Arc::new(RecordingStore::default());
        let mut engine = engine_with(&store);
        let list = engine.create_list("Groceries").await.unwrap().list().clone();

        // Another client deletes the list while it is open here.
        store.delete_list(&list.id).await.unwrap();

        engine.append_item(Item::new("Milk")).unwrap();
        let report = engine.flush().await;
        assert_eq!(report.failed, 1);
        assert_eq!(engine.current().unwrap().items().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_open_list_closes_it() {
        let store = Arc::new(RecordingStore::default());
        let mut engine = engine_with(&store);
        let list_id = engine.create_list("Groceries").await.unwrap().id().to_string();

        engine.delete_list(&list_id).await.unwrap();
        assert!(engine.current().is_none());
        assert!(engine.lists().await.unwrap().is_empty());

        // Idempotent.
        engine.delete_list(&list_id).await.unwrap();
    }
}
