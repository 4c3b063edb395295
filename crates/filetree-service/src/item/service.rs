//! Item creation and cascading deletion.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use filetree_core::config::TreeConfig;
use filetree_core::error::AppError;
use filetree_core::types::ItemId;
use filetree_database::{CascadeMode, ItemStore};
use filetree_entity::item::{CreateItem, Item, ItemKind};

use crate::context::RequestContext;

/// Enforces sibling uniqueness on insert and performs cascading deletes.
#[derive(Clone)]
pub struct ItemService {
    /// Item store.
    store: Arc<dyn ItemStore>,
    /// Longest accepted name, in characters.
    max_name_length: usize,
    /// Bound on the explicit subtree walk.
    max_depth: usize,
}

impl std::fmt::Debug for ItemService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemService")
            .field("max_name_length", &self.max_name_length)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Request to create a new item.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateItemRequest {
    /// Item name; surrounding whitespace is trimmed.
    pub name: String,
    /// File or folder.
    pub kind: ItemKind,
    /// Parent folder ID (None for root-level).
    pub parent_id: Option<ItemId>,
    /// Byte size. Required for files, ignored for folders.
    pub size_bytes: Option<u64>,
}

impl ItemService {
    /// Creates a new item service.
    pub fn new(store: Arc<dyn ItemStore>, config: &TreeConfig) -> Self {
        Self {
            store,
            max_name_length: config.max_name_length,
            max_depth: config.max_depth,
        }
    }

    /// Creates a file or folder.
    ///
    /// Fails with `DuplicateName` when the parent already holds an item
    /// with the same name and kind; nothing is written in that case.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreateItemRequest,
    ) -> Result<Item, AppError> {
        let data = self.validate(req)?;

        if let Some(parent_id) = data.parent_id {
            let parent = self
                .store
                .get(parent_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Parent folder {parent_id} not found")))?;
            if !parent.is_folder() {
                debug!(parent_id = %parent_id, "Rejected create under a file");
                return Err(AppError::validation(format!(
                    "{} is a file and cannot contain items",
                    parent.name
                )));
            }
        }

        if let Some(existing) = self
            .store
            .find_sibling(data.parent_id, &data.name, data.kind)
            .await?
        {
            debug!(existing_id = %existing.id, name = %data.name, "Rejected duplicate name");
            return Err(AppError::duplicate_name(format!(
                "A {} named '{}' already exists here",
                data.kind.as_str().to_lowercase(),
                data.name
            )));
        }

        let item = self.store.insert(&data).await?;

        info!(
            request_id = %ctx.request_id,
            actor = %ctx.actor,
            item_id = %item.id,
            kind = %item.kind,
            parent_id = ?item.parent_id,
            name = %item.name,
            "Item created"
        );

        Ok(item)
    }

    /// Deletes an item and, for folders, its whole subtree.
    ///
    /// Returns the number of records removed.
    pub async fn delete(&self, ctx: &RequestContext, id: ItemId) -> Result<u64, AppError> {
        let item = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Item {id} not found")))?;

        let removed = match self.store.cascade_mode() {
            CascadeMode::Native => self.store.delete_cascade(id).await?,
            CascadeMode::Explicit => self.delete_explicit(&item).await?,
        };

        info!(
            request_id = %ctx.request_id,
            actor = %ctx.actor,
            item_id = %id,
            kind = %item.kind,
            removed,
            "Item deleted"
        );

        Ok(removed)
    }

    fn validate(&self, req: CreateItemRequest) -> Result<CreateItem, AppError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Name cannot be empty"));
        }
        if name.chars().count() > self.max_name_length {
            return Err(AppError::validation(format!(
                "Name is longer than {} characters",
                self.max_name_length
            )));
        }

        match req.kind {
            ItemKind::Folder => Ok(CreateItem::folder(name, req.parent_id)),
            ItemKind::File => {
                let size = req
                    .size_bytes
                    .ok_or_else(|| AppError::validation("A file requires a size"))?;
                let size = i64::try_from(size)
                    .map_err(|_| AppError::validation(format!("File size {size} is too large")))?;
                Ok(CreateItem::file(name, req.parent_id, size))
            }
        }
    }

    /// Pre-order walk of the subtree rooted at `root`, bounded against loops.
    async fn collect_subtree(&self, root: &Item) -> Result<Vec<ItemId>, AppError> {
        let mut order = vec![root.id];
        if root.is_file() {
            return Ok(order);
        }

        let mut seen = HashSet::from([root.id]);
        let mut stack = vec![(root.id, 0usize)];

        while let Some((folder_id, depth)) = stack.pop() {
            if depth >= self.max_depth {
                warn!(item_id = %root.id, max_depth = self.max_depth, "Delete walk exceeded depth bound");
                return Err(AppError::corrupt_hierarchy(format!(
                    "Folder {} is nested deeper than {} levels",
                    root.id, self.max_depth
                )));
            }

            for child in self.store.list_by_parent(Some(folder_id)).await? {
                if !seen.insert(child.id) {
                    warn!(item_id = %child.id, "Item reached twice during delete walk");
                    return Err(AppError::corrupt_hierarchy(format!(
                        "Item {} appears more than once beneath {}",
                        child.id, root.id
                    )));
                }
                order.push(child.id);
                if child.is_folder() {
                    stack.push((child.id, depth + 1));
                }
            }
        }

        Ok(order)
    }

    /// Deletes a subtree on a store without native cascade.
    ///
    /// Ids go to the store leaf-to-root in one batch. If the batch fails
    /// after removing some records, the remaining ones still form complete
    /// subtrees (every removed item's descendants were removed first) and
    /// the failure is reported as `PartialDelete`.
    async fn delete_explicit(&self, root: &Item) -> Result<u64, AppError> {
        let mut ids = self.collect_subtree(root).await?;
        ids.reverse();

        match self.store.delete_batch(&ids).await {
            Ok(removed) => Ok(removed),
            Err(cause) => match self.count_remaining(&ids).await {
                Ok(remaining) if remaining == ids.len() => Err(cause),
                Ok(remaining) => {
                    let removed = ids.len() - remaining;
                    error!(
                        item_id = %root.id,
                        removed,
                        remaining,
                        error = %cause,
                        "Subtree delete stopped partway"
                    );
                    Err(AppError::partial_delete(format!(
                        "Removed {removed} of {} items under {} before failing: {}",
                        ids.len(),
                        root.id,
                        cause.message
                    )))
                }
                Err(lookup) => {
                    error!(
                        item_id = %root.id,
                        error = %cause,
                        lookup_error = %lookup,
                        "Subtree delete failed and its progress is unknown"
                    );
                    Err(AppError::partial_delete(format!(
                        "Deleting {} items under {} failed ({}) and the remaining \
                         items could not be counted ({})",
                        ids.len(),
                        root.id,
                        cause.message,
                        lookup.message
                    )))
                }
            },
        }
    }

    /// How many of `ids` the store still holds.
    async fn count_remaining(&self, ids: &[ItemId]) -> Result<usize, AppError> {
        let mut remaining = 0;
        for id in ids {
            if self.store.get(*id).await?.is_some() {
                remaining += 1;
            }
        }
        Ok(remaining)
    }
}
