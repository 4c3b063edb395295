//! Moving items between folders.

use std::sync::Arc;

use tracing::{debug, info};

use filetree_core::error::AppError;
use filetree_core::types::ItemId;
use filetree_database::ItemStore;
use filetree_entity::item::Item;

use crate::context::RequestContext;

use super::tree::TreeNavigator;

/// Validates and commits re-parenting.
#[derive(Clone)]
pub struct MoveService {
    /// Item store.
    store: Arc<dyn ItemStore>,
    /// Navigator used for the cycle check.
    navigator: TreeNavigator,
}

impl std::fmt::Debug for MoveService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoveService")
            .field("navigator", &self.navigator)
            .finish()
    }
}

impl MoveService {
    /// Creates a new move service.
    pub fn new(store: Arc<dyn ItemStore>, navigator: TreeNavigator) -> Self {
        Self { store, navigator }
    }

    /// Moves `item_id` under `target_parent_id` (None for the root).
    ///
    /// Checks run in order and stop at the first failure:
    /// existence, no-op (`AlreadyInPlace`), destination, cycle, name
    /// conflict. The store write is the only mutation and carries the
    /// item's version so a concurrent change fails it instead of being
    /// overwritten.
    pub async fn move_item(
        &self,
        ctx: &RequestContext,
        item_id: ItemId,
        target_parent_id: Option<ItemId>,
    ) -> Result<Item, AppError> {
        let item = self
            .store
            .get(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Item {item_id} not found")))?;

        if item.parent_id == target_parent_id {
            debug!(item_id = %item_id, parent_id = ?target_parent_id, "Move is a no-op");
            return Err(AppError::already_in_place(format!(
                "{} is already in that folder",
                item.name
            )));
        }

        if let Some(target) = target_parent_id {
            let destination = self
                .store
                .get(target)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Target folder {target} not found")))?;
            if !destination.is_folder() {
                return Err(AppError::validation(format!(
                    "{} is a file and cannot contain items",
                    destination.name
                )));
            }

            if item.is_folder() && self.navigator.is_within(target, item_id).await? {
                debug!(item_id = %item_id, target = %target, "Rejected move into own subtree");
                return Err(AppError::would_create_cycle(format!(
                    "Cannot move {} into itself or one of its subfolders",
                    item.name
                )));
            }
        }

        if let Some(conflict) = self
            .store
            .find_sibling(target_parent_id, &item.name, item.kind)
            .await?
            .filter(|sibling| sibling.id != item_id)
        {
            debug!(item_id = %item_id, conflict_id = %conflict.id, "Rejected move on name conflict");
            return Err(AppError::duplicate_name(format!(
                "The destination already contains a {} named '{}'",
                item.kind.as_str().to_lowercase(),
                item.name
            )));
        }

        let moved = self
            .store
            .update_parent(item_id, target_parent_id, item.version)
            .await?;

        info!(
            request_id = %ctx.request_id,
            actor = %ctx.actor,
            item_id = %item_id,
            from = ?item.parent_id,
            to = ?moved.parent_id,
            "Item moved"
        );

        Ok(moved)
    }
}
