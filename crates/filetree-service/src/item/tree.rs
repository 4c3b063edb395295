//! Ancestor walks: breadcrumbs and containment checks.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use filetree_core::config::TreeConfig;
use filetree_core::error::AppError;
use filetree_core::types::ItemId;
use filetree_database::ItemStore;
use filetree_entity::item::Breadcrumb;

/// Walks parent links upward from an item.
///
/// Every walk tracks the IDs it has seen and stops after `max_depth`
/// steps, so a corrupted (cyclic) store fails with `CorruptHierarchy`
/// instead of looping.
#[derive(Clone)]
pub struct TreeNavigator {
    /// Item store.
    store: Arc<dyn ItemStore>,
    /// Maximum number of links a walk may follow.
    max_depth: usize,
}

impl std::fmt::Debug for TreeNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeNavigator")
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Guards one upward walk against loops and runaway depth.
struct WalkGuard {
    seen: HashSet<ItemId>,
    max_depth: usize,
    start: ItemId,
}

impl WalkGuard {
    fn new(start: ItemId, max_depth: usize) -> Self {
        Self {
            seen: HashSet::new(),
            max_depth,
            start,
        }
    }

    fn visit(&mut self, id: ItemId) -> Result<(), AppError> {
        if !self.seen.insert(id) {
            warn!(start = %self.start, repeated = %id, "Parent links form a loop");
            return Err(AppError::corrupt_hierarchy(format!(
                "Parent links starting at {} loop back to {id}",
                self.start
            )));
        }
        if self.seen.len() > self.max_depth {
            warn!(start = %self.start, max_depth = self.max_depth, "Ancestor walk exceeded depth bound");
            return Err(AppError::corrupt_hierarchy(format!(
                "Ancestor chain of {} is longer than {} levels",
                self.start, self.max_depth
            )));
        }
        Ok(())
    }
}

impl TreeNavigator {
    /// Creates a new tree navigator.
    pub fn new(store: Arc<dyn ItemStore>, config: &TreeConfig) -> Self {
        Self {
            store,
            max_depth: config.max_depth,
        }
    }

    /// Root-to-item chain of `{id, name}` pairs.
    ///
    /// Returns an empty trail for `None`. A missing item anywhere on the
    /// chain ends the trail at that point rather than failing the call.
    pub async fn breadcrumbs(&self, item_id: Option<ItemId>) -> Result<Vec<Breadcrumb>, AppError> {
        let Some(start) = item_id else {
            return Ok(Vec::new());
        };

        let mut guard = WalkGuard::new(start, self.max_depth);
        let mut trail = Vec::new();
        let mut current = Some(start);

        while let Some(id) = current {
            guard.visit(id)?;
            let Some(item) = self.store.get(id).await? else {
                debug!(start = %start, missing = %id, "Breadcrumb trail truncated at missing item");
                break;
            };
            trail.push(Breadcrumb::from(&item));
            current = item.parent_id;
        }

        trail.reverse();
        Ok(trail)
    }

    /// IDs from `start` up to its root, `start` first.
    ///
    /// Unlike [`breadcrumbs`](Self::breadcrumbs) this is strict: a missing
    /// `start` is `NotFound` and a dangling parent link is `StoreInconsistency`.
    pub async fn ancestry(&self, start: ItemId) -> Result<Vec<ItemId>, AppError> {
        let mut guard = WalkGuard::new(start, self.max_depth);
        let mut chain = Vec::new();
        let mut current = Some(start);

        while let Some(id) = current {
            guard.visit(id)?;
            let item = match self.store.get(id).await? {
                Some(item) => item,
                None if id == start => {
                    return Err(AppError::not_found(format!("Item {start} not found")));
                }
                None => {
                    warn!(start = %start, missing = %id, "Dangling parent link");
                    return Err(AppError::store_inconsistency(format!(
                        "Ancestor {id} of {start} does not exist"
                    )));
                }
            };
            chain.push(item.id);
            current = item.parent_id;
        }

        Ok(chain)
    }

    /// Whether `ancestor` is `start` itself or lies on `start`'s parent chain.
    ///
    /// Stops as soon as `ancestor` is reached, so a walk that hits the item
    /// being moved never needs to read further up.
    pub async fn is_within(&self, start: ItemId, ancestor: ItemId) -> Result<bool, AppError> {
        let mut guard = WalkGuard::new(start, self.max_depth);
        let mut current = Some(start);

        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            guard.visit(id)?;
            current = match self.store.get(id).await? {
                Some(item) => item.parent_id,
                None => {
                    return Err(AppError::store_inconsistency(format!(
                        "Item {id} on the ancestor chain of {start} does not exist"
                    )));
                }
            };
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use filetree_core::ErrorKind;

    use crate::item::test_support::{file, folder, store};

    fn navigator(store: Arc<dyn ItemStore>) -> TreeNavigator {
        TreeNavigator::new(store, &TreeConfig::default())
    }

    #[tokio::test]
    async fn test_breadcrumbs_of_none_is_empty() {
        let (_memory, shared) = store();
        assert!(navigator(shared).breadcrumbs(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_breadcrumbs_of_root_item_is_single() {
        let (memory, shared) = store();
        let docs = folder(&memory, "Docs", None).await;

        let trail = navigator(shared).breadcrumbs(Some(docs.id)).await.unwrap();
        assert_eq!(trail, vec![Breadcrumb { id: docs.id, name: "Docs".into() }]);
    }

    #[tokio::test]
    async fn test_breadcrumbs_are_root_first() {
        let (memory, shared) = store();
        let a = folder(&memory, "A", None).await;
        let b = folder(&memory, "B", Some(a.id)).await;
        let c = file(&memory, "c.txt", Some(b.id), 1).await;

        let names: Vec<_> = navigator(shared)
            .breadcrumbs(Some(c.id))
            .await
            .unwrap()
            .into_iter()
            .map(|crumb| crumb.name)
            .collect();
        assert_eq!(names, ["A", "B", "c.txt"]);
    }

    #[tokio::test]
    async fn test_breadcrumbs_truncate_at_missing_ancestor() {
        let (memory, shared) = store();
        let a = folder(&memory, "A", None).await;
        let b = folder(&memory, "B", Some(a.id)).await;

        let mut orphan = b.clone();
        orphan.parent_id = Some(ItemId::new());
        memory.insert_unchecked(orphan).await;

        let trail = navigator(shared).breadcrumbs(Some(b.id)).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].id, b.id);
    }

    #[tokio::test]
    async fn test_breadcrumbs_of_missing_item_is_empty() {
        let (_memory, shared) = store();
        let trail = navigator(shared).breadcrumbs(Some(ItemId::new())).await.unwrap();
        assert!(trail.is_empty());
    }

    #[tokio::test]
    async fn test_breadcrumbs_fail_on_loop() {
        let (memory, shared) = store();
        let a = folder(&memory, "A", None).await;
        let b = folder(&memory, "B", Some(a.id)).await;

        let mut looped = a.clone();
        looped.parent_id = Some(b.id);
        memory.insert_unchecked(looped).await;

        let err = navigator(shared).breadcrumbs(Some(b.id)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::CorruptHierarchy);
    }

    #[tokio::test]
    async fn test_ancestry_is_strict_about_dangling_links() {
        let (memory, shared) = store();
        let a = folder(&memory, "A", None).await;
        let mut dangling = a.clone();
        dangling.parent_id = Some(ItemId::new());
        memory.insert_unchecked(dangling).await;

        let nav = navigator(shared);
        let err = nav.ancestry(a.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::StoreInconsistency);

        let err = nav.ancestry(ItemId::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_ancestry_lists_item_then_parents() {
        let (memory, shared) = store();
        let a = folder(&memory, "A", None).await;
        let b = folder(&memory, "B", Some(a.id)).await;

        assert_eq!(navigator(shared).ancestry(b.id).await.unwrap(), vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_is_within() {
        let (memory, shared) = store();
        let a = folder(&memory, "A", None).await;
        let b = folder(&memory, "B", Some(a.id)).await;
        let c = folder(&memory, "C", Some(b.id)).await;
        let other = folder(&memory, "Other", None).await;

        let nav = navigator(shared);
        assert!(nav.is_within(c.id, a.id).await.unwrap());
        assert!(nav.is_within(a.id, a.id).await.unwrap());
        assert!(!nav.is_within(a.id, c.id).await.unwrap());
        assert!(!nav.is_within(other.id, a.id).await.unwrap());
    }
}
