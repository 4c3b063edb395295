//! The operations the presentation layer calls.

use std::sync::Arc;

use filetree_core::config::TreeConfig;
use filetree_core::error::AppError;
use filetree_core::types::ItemId;
use filetree_database::ItemStore;
use filetree_entity::item::{Breadcrumb, FolderOption, Item, ItemKind, ItemView, ListScope};

use crate::context::RequestContext;
use crate::item::{
    CreateItemRequest, ItemService, ListingService, MoveService, SizeAggregator, TreeNavigator,
};

/// Facade over the tree services, wired against one store.
#[derive(Clone)]
pub struct ExplorerService {
    store: Arc<dyn ItemStore>,
    sizes: SizeAggregator,
    navigator: TreeNavigator,
    listing: ListingService,
    items: ItemService,
    mover: MoveService,
}

impl std::fmt::Debug for ExplorerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplorerService")
            .field("sizes", &self.sizes)
            .field("navigator", &self.navigator)
            .finish_non_exhaustive()
    }
}

impl ExplorerService {
    /// Builds every tree service against `store`.
    pub fn new(store: Arc<dyn ItemStore>, config: &TreeConfig) -> Self {
        let sizes = SizeAggregator::new(Arc::clone(&store), config);
        let navigator = TreeNavigator::new(Arc::clone(&store), config);
        Self {
            listing: ListingService::new(Arc::clone(&store), sizes.clone()),
            items: ItemService::new(Arc::clone(&store), config),
            mover: MoveService::new(Arc::clone(&store), navigator.clone()),
            store,
            sizes,
            navigator,
        }
    }

    /// Folder contents when `query` is absent, global search otherwise.
    pub async fn list_items(
        &self,
        parent_id: Option<ItemId>,
        query: Option<&str>,
    ) -> Result<Vec<ItemView>, AppError> {
        self.listing
            .list(&ListScope::from_params(parent_id, query))
            .await
    }

    /// Creates a file or folder. `file_size` is required for files.
    pub async fn create_item(
        &self,
        ctx: &RequestContext,
        name: &str,
        kind: ItemKind,
        parent_id: Option<ItemId>,
        file_size: Option<u64>,
    ) -> Result<Item, AppError> {
        self.items
            .create(
                ctx,
                CreateItemRequest {
                    name: name.to_string(),
                    kind,
                    parent_id,
                    size_bytes: file_size,
                },
            )
            .await
    }

    /// Deletes an item with its subtree; returns the number removed.
    pub async fn delete_item(&self, ctx: &RequestContext, id: ItemId) -> Result<u64, AppError> {
        self.items.delete(ctx, id).await
    }

    /// Moves an item under `target_parent_id` (None for the root).
    pub async fn move_item(
        &self,
        ctx: &RequestContext,
        id: ItemId,
        target_parent_id: Option<ItemId>,
    ) -> Result<Item, AppError> {
        self.mover.move_item(ctx, id, target_parent_id).await
    }

    /// Root-to-item trail; empty for `None`.
    pub async fn get_breadcrumbs(&self, id: Option<ItemId>) -> Result<Vec<Breadcrumb>, AppError> {
        self.navigator.breadcrumbs(id).await
    }

    /// Every folder, for populating a move destination picker.
    pub async fn list_folders(&self) -> Result<Vec<FolderOption>, AppError> {
        self.listing.list_folders().await
    }

    /// Folders `id` can legally be moved into.
    pub async fn list_move_targets(&self, id: ItemId) -> Result<Vec<FolderOption>, AppError> {
        self.listing.list_move_targets(id).await
    }

    /// One item with its aggregate size.
    pub async fn get_item(&self, id: ItemId) -> Result<ItemView, AppError> {
        let item = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Item {id} not found")))?;
        let size = self.sizes.compute_size_bounded(&item).await?;
        Ok(ItemView::from_item(item, size))
    }
}
