//! PostgreSQL item repository.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};

use filetree_core::error::{AppError, ErrorKind};
use filetree_core::result::AppResult;
use filetree_core::types::ItemId;
use filetree_entity::item::{CreateItem, Item, ItemKind};

use crate::store::{CascadeMode, ItemStore};

/// Unique index enforcing sibling `(parent, name, kind)` uniqueness.
const SIBLING_KEY: &str = "items_sibling_name_kind_key";
/// Self-referencing foreign key on `parent_id`.
const PARENT_FKEY: &str = "items_parent_id_fkey";
/// SQLSTATE for serialization failures under `SERIALIZABLE`.
const SERIALIZATION_FAILURE: &str = "40001";

const DEFAULT_MAX_DEPTH: usize = 4096;

/// Repository for item CRUD and tree queries.
///
/// Subtree deletes rely on `ON DELETE CASCADE`; moves run in a
/// `SERIALIZABLE` transaction that re-validates before writing.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: PgPool,
    max_depth: usize,
}

impl ItemRepository {
    /// Create a new item repository.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the bound on the recursive ancestor query.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e))
    }

    /// Whether `item_id` lies on the ancestor chain of `start`.
    async fn chain_contains(
        tx: &mut Transaction<'static, Postgres>,
        start: ItemId,
        item_id: ItemId,
        max_depth: usize,
    ) -> AppResult<bool> {
        let (found, deepest): (bool, i64) = sqlx::query_as(
            "WITH RECURSIVE up AS ( \
                SELECT id, parent_id, 0::BIGINT AS depth FROM items WHERE id = $1 \
                UNION ALL \
                SELECT i.id, i.parent_id, u.depth + 1 FROM items i \
                INNER JOIN up u ON i.id = u.parent_id \
                WHERE u.depth < $3 AND u.id != $2 \
             ) SELECT EXISTS(SELECT 1 FROM up WHERE id = $2), COALESCE(MAX(depth), 0) FROM up",
        )
        .bind(start)
        .bind(item_id)
        .bind(max_depth as i64)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to walk ancestors", e))?;

        if !found && deepest >= max_depth as i64 {
            return Err(AppError::corrupt_hierarchy(format!(
                "Ancestor walk from {start} exceeded {max_depth} levels"
            )));
        }
        Ok(found)
    }
}

/// Translate write errors, surfacing constraint violations as domain errors.
fn map_write_error(e: sqlx::Error, context: &'static str) -> AppError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.constraint() == Some(SIBLING_KEY) {
            return AppError::duplicate_name("An item with this name and type already exists here");
        }
        if db_err.constraint() == Some(PARENT_FKEY) {
            return AppError::not_found("Parent folder not found");
        }
        if db_err.code().as_deref() == Some(SERIALIZATION_FAILURE) {
            return AppError::concurrent_modification("Concurrent change to the tree, retry");
        }
    }
    AppError::with_source(ErrorKind::Database, context, e)
}

#[async_trait]
impl ItemStore for ItemRepository {
    async fn get(&self, id: ItemId) -> AppResult<Option<Item>> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find item", e))
    }

    async fn list_by_parent(&self, parent_id: Option<ItemId>) -> AppResult<Vec<Item>> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE parent_id IS NOT DISTINCT FROM $1")
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    async fn list_by_name_substring(&self, query: &str) -> AppResult<Vec<Item>> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE strpos(lower(name), lower($1)) > 0")
            .bind(query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search items", e))
    }

    async fn list_by_kind(&self, kind: ItemKind) -> AppResult<Vec<Item>> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE kind = $1")
            .bind(kind)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list by kind", e))
    }

    async fn find_sibling(
        &self,
        parent_id: Option<ItemId>,
        name: &str,
        kind: ItemKind,
    ) -> AppResult<Option<Item>> {
        sqlx::query_as::<_, Item>(
            "SELECT * FROM items \
             WHERE parent_id IS NOT DISTINCT FROM $1 AND name = $2 AND kind = $3",
        )
        .bind(parent_id)
        .bind(name)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find sibling", e))
    }

    async fn insert(&self, data: &CreateItem) -> AppResult<Item> {
        let mut tx = self.begin().await?;

        if let Some(parent_id) = data.parent_id {
            let parent_kind: Option<ItemKind> =
                sqlx::query_scalar("SELECT kind FROM items WHERE id = $1 FOR SHARE")
                    .bind(parent_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::with_source(ErrorKind::Database, "Failed to lock parent", e)
                    })?;
            match parent_kind {
                None => return Err(AppError::not_found(format!("Parent folder {parent_id} not found"))),
                Some(ItemKind::File) => {
                    return Err(AppError::validation(format!(
                        "Parent {parent_id} is a file and cannot contain items"
                    )));
                }
                Some(ItemKind::Folder) => {}
            }
        }

        let item = sqlx::query_as::<_, Item>(
            "INSERT INTO items (id, name, kind, parent_id, size_bytes) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(ItemId::new())
        .bind(&data.name)
        .bind(data.kind)
        .bind(data.parent_id)
        .bind(data.size_bytes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to create item"))?;

        tx.commit()
            .await
            .map_err(|e| map_write_error(e, "Failed to commit item"))?;

        debug!(item_id = %item.id, name = %item.name, "Item inserted");
        Ok(item)
    }

    async fn update_parent(
        &self,
        id: ItemId,
        new_parent_id: Option<ItemId>,
        expected_version: i64,
    ) -> AppResult<Item> {
        let mut tx = self.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to set isolation", e))?;

        let current = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "Failed to lock item"))?
            .ok_or_else(|| AppError::not_found(format!("Item {id} not found")))?;

        if current.version != expected_version {
            return Err(AppError::concurrent_modification(format!(
                "Item {id} is at version {}, expected {expected_version}",
                current.version
            )));
        }

        if let Some(target) = new_parent_id {
            let target_kind: Option<ItemKind> =
                sqlx::query_scalar("SELECT kind FROM items WHERE id = $1 FOR SHARE")
                    .bind(target)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| map_write_error(e, "Failed to lock destination"))?;
            match target_kind {
                None => return Err(AppError::not_found(format!("Target folder {target} not found"))),
                Some(ItemKind::File) => {
                    return Err(AppError::validation(format!(
                        "Target {target} is a file and cannot contain items"
                    )));
                }
                Some(ItemKind::Folder) => {}
            }

            if Self::chain_contains(&mut tx, target, id, self.max_depth).await? {
                return Err(AppError::would_create_cycle(format!(
                    "Item {id} is an ancestor of {target}"
                )));
            }
        }

        let moved = sqlx::query_as::<_, Item>(
            "UPDATE items SET parent_id = $2, version = version + 1, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(new_parent_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to move item"))?;

        tx.commit()
            .await
            .map_err(|e| map_write_error(e, "Failed to commit move"))?;

        Ok(moved)
    }

    fn cascade_mode(&self) -> CascadeMode {
        CascadeMode::Native
    }

    async fn delete_cascade(&self, id: ItemId) -> AppResult<u64> {
        let mut tx = self.begin().await?;

        let subtree: i64 = sqlx::query_scalar(
            "WITH RECURSIVE tree AS ( \
                SELECT id FROM items WHERE id = $1 \
                UNION \
                SELECT i.id FROM items i INNER JOIN tree t ON i.parent_id = t.id \
             ) SELECT COUNT(*) FROM tree",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to size subtree", e))?;

        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete item", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Item {id} not found")));
        }

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit delete", e))?;

        info!(item_id = %id, removed = subtree, "Subtree deleted");
        Ok(subtree as u64)
    }

    async fn delete_batch(&self, ids: &[ItemId]) -> AppResult<u64> {
        let mut tx = self.begin().await?;

        let result = sqlx::query("DELETE FROM items WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete batch", e))?;

        if result.rows_affected() != ids.len() as u64 {
            return Err(AppError::concurrent_modification(format!(
                "Expected to delete {} items, found {}",
                ids.len(),
                result.rows_affected()
            )));
        }

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit delete", e))?;
        Ok(result.rows_affected())
    }
}
