//! In-memory item store using a Tokio `RwLock` for single-node deployments.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use filetree_core::error::AppError;
use filetree_core::result::AppResult;
use filetree_core::types::ItemId;
use filetree_entity::item::{CreateItem, Item, ItemKind};

use crate::store::{CascadeMode, ItemStore};

const DEFAULT_MAX_DEPTH: usize = 4096;

/// Arena of items indexed by identifier, plus a parent → children index.
#[derive(Debug, Default)]
struct Arena {
    /// Every live item.
    items: HashMap<ItemId, Item>,
    /// Direct children per parent; `None` is the root scope.
    children: HashMap<Option<ItemId>, HashSet<ItemId>>,
}

impl Arena {
    fn attach(&mut self, item: Item) {
        self.children
            .entry(item.parent_id)
            .or_default()
            .insert(item.id);
        self.items.insert(item.id, item);
    }

    fn detach(&mut self, id: ItemId) -> Option<Item> {
        let item = self.items.remove(&id)?;
        if let Some(siblings) = self.children.get_mut(&item.parent_id) {
            siblings.remove(&id);
            if siblings.is_empty() {
                self.children.remove(&item.parent_id);
            }
        }
        Some(item)
    }

    fn child_ids(&self, parent_id: Option<ItemId>) -> impl Iterator<Item = ItemId> + '_ {
        self.children
            .get(&parent_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    fn sibling_conflict(
        &self,
        parent_id: Option<ItemId>,
        name: &str,
        kind: ItemKind,
        exclude: Option<ItemId>,
    ) -> Option<&Item> {
        self.child_ids(parent_id)
            .filter(|id| Some(*id) != exclude)
            .filter_map(|id| self.items.get(&id))
            .find(|item| item.name == name && item.kind == kind)
    }

    /// Checks that `parent_id` names a live folder.
    fn require_folder(&self, parent_id: Option<ItemId>) -> AppResult<()> {
        let Some(pid) = parent_id else {
            return Ok(());
        };
        match self.items.get(&pid) {
            None => Err(AppError::not_found(format!("Parent folder {pid} not found"))),
            Some(parent) if !parent.is_folder() => Err(AppError::validation(format!(
                "Parent {pid} is a file and cannot contain items"
            ))),
            Some(_) => Ok(()),
        }
    }

    /// Whether `ancestor` appears on the upward chain starting at `start`.
    fn chain_contains(&self, start: ItemId, ancestor: ItemId, max_depth: usize) -> AppResult<bool> {
        let mut current = Some(start);
        let mut steps = 0usize;
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            steps += 1;
            if steps > max_depth {
                return Err(AppError::corrupt_hierarchy(format!(
                    "Ancestor walk from {start} exceeded {max_depth} levels"
                )));
            }
            current = self.items.get(&id).and_then(|item| item.parent_id);
        }
        Ok(false)
    }

    /// Pre-order collection of `root` and everything beneath it.
    fn subtree(&self, root: ItemId) -> Vec<ItemId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            stack.extend(self.child_ids(Some(id)));
        }
        order
    }
}

/// In-memory item store.
///
/// All mutations take the write lock, so each one is atomic with respect
/// to every other store call. Suitable for single-node deployments and tests.
#[derive(Debug, Clone)]
pub struct MemoryItemStore {
    /// Protected arena.
    arena: Arc<RwLock<Arena>>,
    /// Delete strategy advertised to callers.
    cascade_mode: CascadeMode,
    /// Bound on upward walks during move validation.
    max_depth: usize,
}

impl Default for MemoryItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryItemStore {
    /// Creates an empty store with native cascading deletes.
    pub fn new() -> Self {
        Self {
            arena: Arc::new(RwLock::new(Arena::default())),
            cascade_mode: CascadeMode::Native,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Advertise a different delete strategy.
    pub fn with_cascade_mode(mut self, mode: CascadeMode) -> Self {
        self.cascade_mode = mode;
        self
    }

    /// Override the bound on upward walks.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of live items.
    pub async fn len(&self) -> usize {
        self.arena.read().await.items.len()
    }

    /// Whether the store holds no items.
    pub async fn is_empty(&self) -> bool {
        self.arena.read().await.items.is_empty()
    }

    /// Place a fully-formed record without checking any invariant.
    ///
    /// Used for restoring snapshots and for reproducing corrupted trees.
    pub async fn insert_unchecked(&self, item: Item) {
        let mut arena = self.arena.write().await;
        if let Some(previous) = arena.detach(item.id) {
            warn!(item_id = %previous.id, "Overwriting existing item");
        }
        arena.attach(item);
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn get(&self, id: ItemId) -> AppResult<Option<Item>> {
        Ok(self.arena.read().await.items.get(&id).cloned())
    }

    async fn list_by_parent(&self, parent_id: Option<ItemId>) -> AppResult<Vec<Item>> {
        let arena = self.arena.read().await;
        Ok(arena
            .child_ids(parent_id)
            .filter_map(|id| arena.items.get(&id).cloned())
            .collect())
    }

    async fn list_by_name_substring(&self, query: &str) -> AppResult<Vec<Item>> {
        let needle = query.to_lowercase();
        let arena = self.arena.read().await;
        Ok(arena
            .items
            .values()
            .filter(|item| item.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn list_by_kind(&self, kind: ItemKind) -> AppResult<Vec<Item>> {
        let arena = self.arena.read().await;
        Ok(arena
            .items
            .values()
            .filter(|item| item.kind == kind)
            .cloned()
            .collect())
    }

    async fn find_sibling(
        &self,
        parent_id: Option<ItemId>,
        name: &str,
        kind: ItemKind,
    ) -> AppResult<Option<Item>> {
        let arena = self.arena.read().await;
        Ok(arena.sibling_conflict(parent_id, name, kind, None).cloned())
    }

    async fn insert(&self, data: &CreateItem) -> AppResult<Item> {
        let mut arena = self.arena.write().await;
        arena.require_folder(data.parent_id)?;

        if arena
            .sibling_conflict(data.parent_id, &data.name, data.kind, None)
            .is_some()
        {
            return Err(AppError::duplicate_name(format!(
                "A {} named '{}' already exists here",
                data.kind, data.name
            )));
        }

        let item = data.clone().into_item(Utc::now());
        arena.attach(item.clone());
        debug!(item_id = %item.id, name = %item.name, "Item inserted");
        Ok(item)
    }

    async fn update_parent(
        &self,
        id: ItemId,
        new_parent_id: Option<ItemId>,
        expected_version: i64,
    ) -> AppResult<Item> {
        let mut arena = self.arena.write().await;

        let current = arena
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Item {id} not found")))?;

        if current.version != expected_version {
            return Err(AppError::concurrent_modification(format!(
                "Item {id} is at version {}, expected {expected_version}",
                current.version
            )));
        }

        arena.require_folder(new_parent_id)?;

        if let Some(target) = new_parent_id {
            if arena.chain_contains(target, id, self.max_depth)? {
                return Err(AppError::would_create_cycle(format!(
                    "Item {id} is an ancestor of {target}"
                )));
            }
        }

        if arena
            .sibling_conflict(new_parent_id, &current.name, current.kind, Some(id))
            .is_some()
        {
            return Err(AppError::duplicate_name(format!(
                "A {} named '{}' already exists in the destination",
                current.kind, current.name
            )));
        }

        let mut moved = arena
            .detach(id)
            .ok_or_else(|| AppError::internal(format!("Item {id} vanished under write lock")))?;
        moved.parent_id = new_parent_id;
        moved.version += 1;
        moved.updated_at = Utc::now();
        arena.attach(moved.clone());

        Ok(moved)
    }

    fn cascade_mode(&self) -> CascadeMode {
        self.cascade_mode
    }

    async fn delete_cascade(&self, id: ItemId) -> AppResult<u64> {
        let mut arena = self.arena.write().await;
        if !arena.items.contains_key(&id) {
            return Err(AppError::not_found(format!("Item {id} not found")));
        }

        if self.cascade_mode == CascadeMode::Explicit && arena.child_ids(Some(id)).next().is_some()
        {
            return Err(AppError::validation(format!(
                "Item {id} still has children; this store does not cascade"
            )));
        }

        let doomed = arena.subtree(id);
        for victim in doomed.iter().rev() {
            arena.detach(*victim);
        }

        info!(item_id = %id, removed = doomed.len(), "Subtree deleted");
        Ok(doomed.len() as u64)
    }

    async fn delete_batch(&self, ids: &[ItemId]) -> AppResult<u64> {
        let mut arena = self.arena.write().await;

        if let Some(missing) = ids.iter().find(|id| !arena.items.contains_key(*id)) {
            return Err(AppError::not_found(format!("Item {missing} not found")));
        }

        let doomed: HashSet<ItemId> = ids.iter().copied().collect();
        let orphaning = ids.iter().find_map(|id| {
            arena
                .child_ids(Some(*id))
                .find(|child| !doomed.contains(child))
        });
        if let Some(child) = orphaning {
            return Err(AppError::validation(format!(
                "Batch would orphan item {child}"
            )));
        }

        for id in ids {
            arena.detach(*id);
        }
        Ok(ids.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use filetree_core::ErrorKind;

    async fn seed_chain(store: &MemoryItemStore) -> (Item, Item, Item) {
        let a = store.insert(&CreateItem::folder("A", None)).await.unwrap();
        let b = store
            .insert(&CreateItem::folder("B", Some(a.id)))
            .await
            .unwrap();
        let c = store
            .insert(&CreateItem::folder("C", Some(b.id)))
            .await
            .unwrap();
        (a, b, c)
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_sibling() {
        let store = MemoryItemStore::new();
        let docs = store.insert(&CreateItem::folder("Docs", None)).await.unwrap();
        store
            .insert(&CreateItem::file("Foto.png", Some(docs.id), 500))
            .await
            .unwrap();

        let err = store
            .insert(&CreateItem::file("Foto.png", Some(docs.id), 999))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateName);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_same_name_different_kind_is_allowed() {
        let store = MemoryItemStore::new();
        store.insert(&CreateItem::folder("notes", None)).await.unwrap();
        store
            .insert(&CreateItem::file("notes", None, 3))
            .await
            .expect("file and folder may share a name");
    }

    #[tokio::test]
    async fn test_insert_under_file_is_rejected() {
        let store = MemoryItemStore::new();
        let file = store.insert(&CreateItem::file("a.txt", None, 1)).await.unwrap();
        let err = store
            .insert(&CreateItem::file("b.txt", Some(file.id), 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_update_parent_rejects_cycle() {
        let store = MemoryItemStore::new();
        let (a, _, c) = seed_chain(&store).await;

        let err = store.update_parent(a.id, Some(c.id), a.version).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::WouldCreateCycle);
        assert!(store.get(a.id).await.unwrap().unwrap().is_root());
    }

    #[tokio::test]
    async fn test_update_parent_checks_version() {
        let store = MemoryItemStore::new();
        let (_, b, _) = seed_chain(&store).await;

        let moved = store.update_parent(b.id, None, b.version).await.unwrap();
        assert_eq!(moved.version, b.version + 1);

        let err = store.update_parent(b.id, None, b.version).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConcurrentModification);
    }

    #[tokio::test]
    async fn test_delete_cascade_removes_subtree() {
        let store = MemoryItemStore::new();
        let (a, b, c) = seed_chain(&store).await;
        store
            .insert(&CreateItem::file("x.bin", Some(c.id), 10))
            .await
            .unwrap();

        let removed = store.delete_cascade(a.id).await.unwrap();
        assert_eq!(removed, 4);
        assert!(store.get(b.id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_explicit_mode_refuses_to_cascade() {
        let store = MemoryItemStore::new().with_cascade_mode(CascadeMode::Explicit);
        let (a, b, c) = seed_chain(&store).await;

        let err = store.delete_cascade(a.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = store.delete_batch(&[b.id, a.id]).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(store.len().await, 3);

        assert_eq!(store.delete_batch(&[c.id, b.id, a.id]).await.unwrap(), 3);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_name_search_ignores_case() {
        let store = MemoryItemStore::new();
        store
            .insert(&CreateItem::file("Invoice2023.pdf", None, 1))
            .await
            .unwrap();
        store
            .insert(&CreateItem::file("receipt.pdf", None, 1))
            .await
            .unwrap();

        let hits = store.list_by_name_substring("INVOICE").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Invoice2023.pdf");
    }
}
