//! The storage contract the tree engine is written against.

use async_trait::async_trait;

use filetree_core::error::AppError;
use filetree_core::result::AppResult;
use filetree_core::types::ItemId;
use filetree_entity::item::{CreateItem, Item, ItemKind};

/// How a store removes a folder's subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CascadeMode {
    /// `delete_cascade` removes the whole subtree atomically.
    #[default]
    Native,
    /// The caller collects the subtree and hands it to `delete_batch`.
    Explicit,
}

/// Durable record storage keyed by item identifier.
///
/// Implementations are the source of truth for the tree invariants:
/// `insert` and `update_parent` must reject sibling name/kind collisions
/// and `update_parent` must reject cycles, even when the caller already
/// checked. Callers' checks are a fast path, not the guard.
#[async_trait]
pub trait ItemStore: Send + Sync + 'static {
    /// Point lookup.
    async fn get(&self, id: ItemId) -> AppResult<Option<Item>>;

    /// Direct children of `parent_id`; `None` lists root-level items.
    async fn list_by_parent(&self, parent_id: Option<ItemId>) -> AppResult<Vec<Item>>;

    /// Every item whose name contains `query`, ignoring case.
    async fn list_by_name_substring(&self, query: &str) -> AppResult<Vec<Item>>;

    /// Every item of the given kind.
    async fn list_by_kind(&self, kind: ItemKind) -> AppResult<Vec<Item>>;

    /// The sibling under `parent_id` with exactly this name and kind, if any.
    async fn find_sibling(
        &self,
        parent_id: Option<ItemId>,
        name: &str,
        kind: ItemKind,
    ) -> AppResult<Option<Item>>;

    /// Persist a new item and return it with its assigned ID.
    ///
    /// Fails with `DuplicateName` on a sibling collision and `NotFound`
    /// if the parent does not exist.
    async fn insert(&self, data: &CreateItem) -> AppResult<Item>;

    /// Re-parent an item if its version still equals `expected_version`.
    ///
    /// The version check, the cycle check, the sibling check, and the write
    /// happen as one atomic unit.
    async fn update_parent(
        &self,
        id: ItemId,
        new_parent_id: Option<ItemId>,
        expected_version: i64,
    ) -> AppResult<Item>;

    /// How this store deletes subtrees.
    fn cascade_mode(&self) -> CascadeMode {
        CascadeMode::Native
    }

    /// Delete an item and, for native-cascade stores, its whole subtree.
    /// Returns the number of records removed.
    async fn delete_cascade(&self, id: ItemId) -> AppResult<u64>;

    /// Delete all `ids` as one atomic unit. `ids` arrive leaf-to-root.
    async fn delete_batch(&self, ids: &[ItemId]) -> AppResult<u64> {
        let _ = ids;
        Err(AppError::internal("This store does not support batch deletes"))
    }
}
