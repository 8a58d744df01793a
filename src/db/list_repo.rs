use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::BoxFuture;
use sqlx::SqlitePool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{Item, ItemId, ItemRecord, List, ListUpdate};
use crate::sync::{RemoteListStore, StoreError};

/// SQLite-backed list store, the system of record behind the server.
#[derive(Clone)]
pub struct ListRepository {
    pool: SqlitePool,
}

// Row types for database queries
#[derive(sqlx::FromRow)]
struct ListRow {
    id: String,
    owner_id: String,
    name: String,
    created_at: String,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    text: String,
    note: String,
    is_checked: bool,
}

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

impl ListRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, name: &str, owner_id: &str) -> Result<List, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Invalid("name cannot be empty".to_string()));
        }
        if owner_id.is_empty() {
            return Err(StoreError::Invalid("user_id is required".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        // Fixed precision keeps the text column sortable.
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        sqlx::query("INSERT INTO lists (id, owner_id, name, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(owner_id)
            .bind(name)
            .bind(&created_at)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<List>, StoreError> {
        let row: Option<ListRow> = sqlx::query_as("SELECT * FROM lists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match row {
            Some(row) => self.hydrate_list(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Lists of one owner, newest first.
    pub async fn for_owner(&self, owner_id: &str) -> Result<Vec<List>, StoreError> {
        let rows: Vec<ListRow> = sqlx::query_as(
            "SELECT * FROM lists WHERE owner_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut lists = Vec::with_capacity(rows.len());
        for row in rows {
            lists.push(self.hydrate_list(row).await?);
        }
        Ok(lists)
    }

    /// Applies an update in one transaction.
    ///
    /// A present item array replaces every stored item. Incoming ids are kept
    /// only if they already belong to this list (first occurrence wins);
    /// everything else gets a fresh durable id. An empty name is ignored.
    pub async fn update(&self, list_id: &str, update: &ListUpdate) -> Result<List, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // Write before any read so the lock is taken up front; overlapping
        // updates then wait on the busy timeout instead of failing.
        let name = update
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let touched = sqlx::query("UPDATE lists SET name = COALESCE(?, name) WHERE id = ?")
            .bind(name)
            .bind(list_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        if touched.rows_affected() == 0 {
            return Err(StoreError::NotFound(list_id.to_string()));
        }

        if let Some(items) = &update.items {
            let known: Vec<(String,)> = sqlx::query_as("SELECT id FROM list_items WHERE list_id = ?")
                .bind(list_id)
                .fetch_all(&mut *tx)
                .await
                .map_err(db_error)?;
            let mut known: HashSet<String> = known.into_iter().map(|(id,)| id).collect();

            // Replace items
            sqlx::query("DELETE FROM list_items WHERE list_id = ?")
                .bind(list_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

            for (position, item) in items.iter().enumerate() {
                let id = assign_item_id(item, &mut known);
                sqlx::query(
                    r#"
                    INSERT INTO list_items (id, list_id, position, text, note, is_checked)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&id)
                .bind(list_id)
                .bind(position as i64)
                .bind(&item.text)
                .bind(&item.note)
                .bind(item.is_checked)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            }
        }

        tx.commit().await.map_err(db_error)?;

        self.get_by_id(list_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(list_id.to_string()))
    }

    pub async fn delete(&self, list_id: &str) -> Result<(), StoreError> {
        // CASCADE will handle list_items
        sqlx::query("DELETE FROM lists WHERE id = ?")
            .bind(list_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn hydrate_list(&self, row: ListRow) -> Result<List, StoreError> {
        let items: Vec<ItemRow> = sqlx::query_as(
            "SELECT id, text, note, is_checked FROM list_items WHERE list_id = ? ORDER BY position",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                StoreError::Database(format!("invalid created_at for list {}: {}", row.id, e))
            })?;

        Ok(List {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            items: items
                .into_iter()
                .map(|i| Item {
                    id: ItemId::durable(i.id),
                    text: i.text,
                    note: i.note,
                    is_checked: i.is_checked,
                })
                .collect(),
            created_at,
        })
    }
}

/// Keeps a known id once, mints a new one otherwise.
fn assign_item_id(item: &ItemRecord, known: &mut HashSet<String>) -> String {
    match &item.id {
        Some(id) if known.remove(id) => id.clone(),
        _ => Uuid::new_v4().to_string(),
    }
}

impl RemoteListStore for ListRepository {
    fn create_list<'a>(
        &'a self,
        name: &'a str,
        owner_id: &'a str,
    ) -> BoxFuture<'a, Result<List, StoreError>> {
        Box::pin(self.create(name, owner_id))
    }

    fn lists_for_owner<'a>(
        &'a self,
        owner_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<List>, StoreError>> {
        Box::pin(self.for_owner(owner_id))
    }

    fn update_list<'a>(
        &'a self,
        list_id: &'a str,
        update: ListUpdate,
    ) -> BoxFuture<'a, Result<List, StoreError>> {
        Box::pin(async move { self.update(list_id, &update).await })
    }

    fn delete_list<'a>(&'a self, list_id: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(self.delete(list_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    struct TestContext {
        repo: ListRepository,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    async fn setup_repo() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(&db_path).await.unwrap();
        TestContext {
            repo: ListRepository::new(pool),
            _temp_dir: temp_dir,
        }
    }

    fn record(id: Option<&str>, text: &str) -> ItemRecord {
        ItemRecord {
            id: id.map(str::to_string),
            text: text.to_string(),
            note: String::new(),
            is_checked: false,
        }
    }

    fn texts(list: &List) -> Vec<&str> {
        list.items.iter().map(|i| i.text.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_and_get_list() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let created = repo.create("  Groceries ", "user-1").await.unwrap();
        assert_eq!(created.name, "Groceries");
        assert_eq!(created.owner_id, "user-1");
        assert!(created.items.is_empty());

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let ctx = setup_repo().await;
        let result = ctx.repo.create("   ", "user-1").await;
        assert!(matches!(result, Err(StoreError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_for_owner_newest_first_and_scoped() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        repo.create("First", "user-1").await.unwrap();
        repo.create("Second", "user-1").await.unwrap();
        repo.create("Other", "user-2").await.unwrap();

        let lists = repo.for_owner("user-1").await.unwrap();
        let names: Vec<&str> = lists.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
        assert!(repo.for_owner("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_items_in_order() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;
        let list = repo.create("Groceries", "user-1").await.unwrap();

        let update = ListUpdate {
            items: Some(vec![record(None, "Milk"), record(None, "Eggs")]),
            name: None,
        };
        let updated = repo.update(&list.id, &update).await.unwrap();
        assert_eq!(texts(&updated), vec!["Milk", "Eggs"]);
        assert!(updated.items.iter().all(|i| !i.id.is_provisional()));

        let update = ListUpdate {
            items: Some(vec![record(None, "Bread")]),
            name: None,
        };
        let updated = repo.update(&list.id, &update).await.unwrap();
        assert_eq!(texts(&updated), vec!["Bread"]);
    }

    #[tokio::test]
    async fn test_update_keeps_known_ids_and_mints_others() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;
        let list = repo.create("Groceries", "user-1").await.unwrap();

        let first = repo
            .update(
                &list.id,
                &ListUpdate {
                    items: Some(vec![record(None, "Milk")]),
                    name: None,
                },
            )
            .await
            .unwrap();
        let milk_id = first.items[0].id.as_raw().to_string();

        let second = repo
            .update(
                &list.id,
                &ListUpdate {
                    items: Some(vec![
                        record(Some(&milk_id), "Milk"),
                        record(Some(&milk_id), "Duplicate"),
                        record(Some("forged"), "Eggs"),
                    ]),
                    name: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(second.items[0].id, ItemId::durable(milk_id.clone()));
        assert_ne!(second.items[1].id.as_raw(), milk_id);
        assert_ne!(second.items[2].id.as_raw(), "forged");
    }

    #[tokio::test]
    async fn test_update_name_only_keeps_items() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;
        let list = repo.create("Groceries", "user-1").await.unwrap();
        repo.update(
            &list.id,
            &ListUpdate {
                items: Some(vec![record(None, "Milk")]),
                name: None,
            },
        )
        .await
        .unwrap();

        let renamed = repo
            .update(&list.id, &ListUpdate::rename("Weekend"))
            .await
            .unwrap();
        assert_eq!(renamed.name, "Weekend");
        assert_eq!(texts(&renamed), vec!["Milk"]);

        let unchanged = repo
            .update(&list.id, &ListUpdate::rename(""))
            .await
            .unwrap();
        assert_eq!(unchanged.name, "Weekend");
    }

    #[tokio::test]
    async fn test_concurrent_updates_queue_instead_of_failing() {
        let ctx = setup_repo().await;
        let list = ctx.repo.create("Groceries", "user-1").await.unwrap();

        let mut handles = Vec::new();
        for n in 0..8 {
            let repo = ctx.repo.clone();
            let list_id = list.id.clone();
            handles.push(tokio::spawn(async move {
                let items = vec![
                    Item::new(format!("Item {}", n)),
                    Item::new("Shared").with_note(format!("{}", n)),
                ];
                repo.update(&list_id, &ListUpdate::full(&items, "Groceries"))
                    .await
            }));
        }

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.is_ok(), "update failed: {:?}", result.err());
        }

        let stored = ctx.repo.get_by_id(&list.id).await.unwrap().unwrap();
        assert_eq!(stored.items.len(), 2);
        assert_eq!(stored.items[1].text, "Shared");
    }

    #[tokio::test]
    async fn test_unparseable_created_at_is_error() {
        let ctx = setup_repo().await;
        let list = ctx.repo.create("Groceries", "user-1").await.unwrap();
        sqlx::query("UPDATE lists SET created_at = 'yesterday' WHERE id = ?")
            .bind(&list.id)
            .execute(&ctx.repo.pool)
            .await
            .unwrap();

        let result = ctx.repo.get_by_id(&list.id).await;
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[tokio::test]
    async fn test_update_unknown_list_is_not_found() {
        let ctx = setup_repo().await;
        let result = ctx.repo.update("missing", &ListUpdate::rename("x")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_cascades_and_is_idempotent() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;
        let list = repo.create("Groceries", "user-1").await.unwrap();
        repo.update(
            &list.id,
            &ListUpdate {
                items: Some(vec![record(None, "Milk")]),
                name: None,
            },
        )
        .await
        .unwrap();

        repo.delete(&list.id).await.unwrap();
        repo.delete(&list.id).await.unwrap();

        assert!(repo.get_by_id(&list.id).await.unwrap().is_none());
        let (orphans,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM list_items")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
