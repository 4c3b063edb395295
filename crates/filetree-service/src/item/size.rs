//! Aggregate size computation.
//!
//! Folder sizes are never stored; every read recomputes them from the
//! descendant files. The walk is an explicit breadth-first worklist, so
//! nesting depth never grows the call stack, and all folders on one level
//! are listed concurrently because sibling subtrees are independent.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use filetree_core::config::TreeConfig;
use filetree_core::error::AppError;
use filetree_core::types::ItemId;
use filetree_database::ItemStore;
use filetree_entity::item::{Item, ItemKind, ItemView};

/// Computes recursive item sizes.
#[derive(Clone)]
pub struct SizeAggregator {
    /// Item store.
    store: Arc<dyn ItemStore>,
    /// Maximum folder nesting before the hierarchy is considered corrupt.
    max_depth: usize,
    /// Concurrent listings per level.
    concurrency: usize,
    /// Optional bound on one computation.
    timeout: Option<Duration>,
}

impl std::fmt::Debug for SizeAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizeAggregator")
            .field("max_depth", &self.max_depth)
            .field("concurrency", &self.concurrency)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SizeAggregator {
    /// Creates a new size aggregator.
    pub fn new(store: Arc<dyn ItemStore>, config: &TreeConfig) -> Self {
        Self {
            store,
            max_depth: config.max_depth,
            concurrency: config.size_concurrency.max(1),
            timeout: config.size_timeout(),
        }
    }

    /// Total byte size of `item`.
    ///
    /// Files return their stored size without touching the store. Folders
    /// return the sum of every descendant file (0 when empty).
    pub async fn compute_size(&self, item: &Item) -> Result<u64, AppError> {
        if item.kind == ItemKind::File {
            return stored_size(item);
        }

        let mut total: u64 = 0;
        let mut visited: HashSet<ItemId> = HashSet::from([item.id]);
        let mut frontier = vec![item.id];
        let mut depth = 0usize;

        while !frontier.is_empty() {
            depth += 1;
            if depth > self.max_depth {
                warn!(item_id = %item.id, max_depth = self.max_depth, "Size walk exceeded depth bound");
                return Err(AppError::corrupt_hierarchy(format!(
                    "Folder {} is nested deeper than {} levels",
                    item.id, self.max_depth
                )));
            }

            let store = &self.store;
            let listings: Vec<(ItemId, Vec<Item>)> = stream::iter(std::mem::take(&mut frontier))
                .map(|folder_id| async move {
                    store
                        .list_by_parent(Some(folder_id))
                        .await
                        .map(|children| (folder_id, children))
                })
                .buffer_unordered(self.concurrency)
                .try_collect()
                .await?;

            for (folder_id, children) in listings {
                for child in children {
                    if child.parent_id != Some(folder_id) {
                        warn!(
                            folder_id = %folder_id,
                            child_id = %child.id,
                            "Store returned a child with a mismatched parent"
                        );
                        return Err(AppError::store_inconsistency(format!(
                            "Item {} was listed under {folder_id} but points to {:?}",
                            child.id, child.parent_id
                        )));
                    }

                    match child.kind {
                        ItemKind::File => {
                            total = total.checked_add(stored_size(&child)?).ok_or_else(|| {
                                AppError::store_inconsistency(format!(
                                    "Size of folder {} overflows 64 bits",
                                    item.id
                                ))
                            })?;
                        }
                        ItemKind::Folder => {
                            if !visited.insert(child.id) {
                                warn!(item_id = %child.id, "Folder reached twice during size walk");
                                return Err(AppError::corrupt_hierarchy(format!(
                                    "Folder {} appears more than once beneath {}",
                                    child.id, item.id
                                )));
                            }
                            frontier.push(child.id);
                        }
                    }
                }
            }
        }

        debug!(item_id = %item.id, size = total, folders = visited.len(), "Folder size computed");
        Ok(total)
    }

    /// Like [`compute_size`](Self::compute_size), but honours the configured
    /// timeout and fails with `Timeout` when it elapses.
    pub async fn compute_size_bounded(&self, item: &Item) -> Result<u64, AppError> {
        match self.timeout {
            None => self.compute_size(item).await,
            Some(limit) => tokio::time::timeout(limit, self.compute_size(item))
                .await
                .map_err(|_| {
                    warn!(item_id = %item.id, timeout_ms = limit.as_millis() as u64, "Size computation timed out");
                    AppError::timeout(format!(
                        "Computing the size of {} took longer than {limit:?}",
                        item.id
                    ))
                })?,
        }
    }

    /// Resolve an item by ID and compute its size.
    pub async fn compute_size_by_id(&self, id: ItemId) -> Result<u64, AppError> {
        let item = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Item {id} not found")))?;
        self.compute_size_bounded(&item).await
    }

    /// Annotate each item with its aggregate size, preserving order.
    pub async fn annotate(&self, items: Vec<Item>) -> Result<Vec<ItemView>, AppError> {
        stream::iter(items)
            .map(|item| async move {
                let size = self.compute_size_bounded(&item).await?;
                Ok::<_, AppError>(ItemView::from_item(item, size))
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }
}

/// A file's stored size, rejecting values no valid record can hold.
fn stored_size(item: &Item) -> Result<u64, AppError> {
    u64::try_from(item.size_bytes).map_err(|_| {
        AppError::store_inconsistency(format!(
            "File {} has a negative stored size ({})",
            item.id, item.size_bytes
        ))
    })
}
