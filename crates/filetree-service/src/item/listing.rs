//! Folder listings and global name search.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use filetree_core::error::AppError;
use filetree_core::types::ItemId;
use filetree_database::ItemStore;
use filetree_entity::item::{FolderOption, ItemKind, ItemView, ListScope};

use super::size::SizeAggregator;

/// Produces sorted, size-annotated views of the tree.
#[derive(Clone)]
pub struct ListingService {
    /// Item store.
    store: Arc<dyn ItemStore>,
    /// Size aggregator used to annotate every row.
    sizes: SizeAggregator,
}

impl std::fmt::Debug for ListingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingService")
            .field("sizes", &self.sizes)
            .finish()
    }
}

impl ListingService {
    /// Creates a new listing service.
    pub fn new(store: Arc<dyn ItemStore>, sizes: SizeAggregator) -> Self {
        Self { store, sizes }
    }

    /// Lists a folder's direct children or searches the whole tree.
    ///
    /// Folders come before files. Within a kind, names ascend by their
    /// collation key (see [`compare_for_listing`]). Every row carries its
    /// aggregate size. Results are not paginated.
    pub async fn list(&self, scope: &ListScope) -> Result<Vec<ItemView>, AppError> {
        let rows = match scope {
            ListScope::Folder { parent_id } => {
                if let Some(pid) = parent_id {
                    let parent = self
                        .store
                        .get(*pid)
                        .await?
                        .ok_or_else(|| AppError::not_found(format!("Folder {pid} not found")))?;
                    if !parent.is_folder() {
                        return Err(AppError::validation(format!(
                            "{} is a file and has no contents",
                            parent.name
                        )));
                    }
                }
                self.store.list_by_parent(*parent_id).await?
            }
            ListScope::Search { query } => {
                let query = query.trim();
                if query.is_empty() {
                    return Err(AppError::validation("Search query cannot be empty"));
                }
                self.store.list_by_name_substring(query).await?
            }
        };

        debug!(scope = ?scope, rows = rows.len(), "Listing fetched");

        let mut views = self.sizes.annotate(rows).await?;
        views.sort_by(compare_for_listing);
        Ok(views)
    }

    /// Every folder in the tree, ordered by name.
    pub async fn list_folders(&self) -> Result<Vec<FolderOption>, AppError> {
        let mut folders: Vec<FolderOption> = self
            .store
            .list_by_kind(ItemKind::Folder)
            .await?
            .into_iter()
            .map(FolderOption::from)
            .collect();
        folders.sort_by(|a, b| compare_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(folders)
    }

    /// Folders `item_id` may be moved into: every folder except the item
    /// itself and, when it is a folder, its descendants.
    pub async fn list_move_targets(&self, item_id: ItemId) -> Result<Vec<FolderOption>, AppError> {
        let item = self
            .store
            .get(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Item {item_id} not found")))?;

        let folders = self.list_folders().await?;
        if !item.is_folder() {
            return Ok(folders);
        }

        let mut children: HashMap<Option<ItemId>, Vec<ItemId>> = HashMap::new();
        for folder in &folders {
            children.entry(folder.parent_id).or_default().push(folder.id);
        }

        let mut excluded = HashSet::from([item_id]);
        let mut stack = vec![item_id];
        while let Some(id) = stack.pop() {
            for child in children.get(&Some(id)).into_iter().flatten() {
                if excluded.insert(*child) {
                    stack.push(*child);
                }
            }
        }

        Ok(folders
            .into_iter()
            .filter(|folder| !excluded.contains(&folder.id))
            .collect())
    }
}

/// Listing order: folders first, then names.
///
/// Names compare by [`collation_key`], so accents and case only matter
/// when two keys are equal. Remaining ties fall back to the lowercase
/// name, the exact name, and finally the ID.
pub fn compare_for_listing(a: &ItemView, b: &ItemView) -> Ordering {
    a.kind
        .sort_rank()
        .cmp(&b.kind.sort_rank())
        .then_with(|| compare_names(&a.name, &b.name))
        .then_with(|| a.id.cmp(&b.id))
}

fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Primary sort key for a name: NFD-decomposed, combining marks removed,
/// lowercased. `Ação` and `acao` share the key `acao`.
pub fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use filetree_core::ErrorKind;
    use filetree_core::config::TreeConfig;

    use crate::item::test_support::{file, folder, store};

    fn listing(store: Arc<dyn ItemStore>) -> ListingService {
        let sizes = SizeAggregator::new(Arc::clone(&store), &TreeConfig::default());
        ListingService::new(store, sizes)
    }

    fn names(views: &[ItemView]) -> Vec<&str> {
        views.iter().map(|v| v.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_folders_first_then_names() {
        let (memory, shared) = store();
        file(&memory, "beta.txt", None, 1).await;
        file(&memory, "Alpha.txt", None, 1).await;
        folder(&memory, "zeta", None).await;
        folder(&memory, "Music", None).await;

        let views = listing(shared)
            .list(&ListScope::Folder { parent_id: None })
            .await
            .unwrap();
        assert_eq!(names(&views), ["Music", "zeta", "Alpha.txt", "beta.txt"]);
    }

    #[tokio::test]
    async fn test_accented_names_sort_with_their_base_letter() {
        let (memory, shared) = store();
        for name in ["Zebra.txt", "Édito.txt", "Apple.txt", "Ação.txt"] {
            file(&memory, name, None, 1).await;
        }
        folder(&memory, "Órgãos", None).await;
        folder(&memory, "Notas", None).await;

        let views = listing(shared)
            .list(&ListScope::Folder { parent_id: None })
            .await
            .unwrap();
        assert_eq!(
            names(&views),
            ["Notas", "Órgãos", "Ação.txt", "Apple.txt", "Édito.txt", "Zebra.txt"]
        );
    }

    #[test]
    fn test_collation_key_folds_accents_and_case() {
        assert_eq!(collation_key("Ação"), "acao");
        assert_eq!(collation_key("ÉDITO"), "edito");
        assert_eq!(collation_key("Relatório.pdf"), "relatorio.pdf");
    }

    #[test]
    fn test_equal_keys_fall_back_to_exact_name() {
        assert_eq!(compare_names("acao", "Ação"), Ordering::Less);
        assert_eq!(compare_names("Acao", "acao"), Ordering::Less);
        assert_eq!(compare_names("b", "b"), Ordering::Equal);
    }

    #[tokio::test]
    async fn test_folder_rows_carry_aggregate_size() {
        let (memory, shared) = store();
        let docs = folder(&memory, "Docs", None).await;
        file(&memory, "Relatorio.pdf", Some(docs.id), 1000).await;
        file(&memory, "Foto.png", Some(docs.id), 500).await;

        let views = listing(shared)
            .list(&ListScope::Folder { parent_id: None })
            .await
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].size, 1500);
    }

    #[tokio::test]
    async fn test_listing_missing_folder_is_not_found() {
        let (_memory, shared) = store();
        let err = listing(shared)
            .list(&ListScope::Folder {
                parent_id: Some(ItemId::new()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_search_is_global_and_case_insensitive() {
        let (memory, shared) = store();
        let docs = folder(&memory, "Docs", None).await;
        let images = folder(&memory, "Images", None).await;
        file(&memory, "Invoice2023.pdf", Some(docs.id), 10).await;
        file(&memory, "Invoice_scan.png", Some(images.id), 20).await;
        let invoices = folder(&memory, "invoices", Some(docs.id)).await;
        file(&memory, "old.pdf", Some(invoices.id), 5).await;
        file(&memory, "notes.txt", None, 1).await;

        let views = listing(shared)
            .list(&ListScope::Search {
                query: "INVOICE".into(),
            })
            .await
            .unwrap();
        assert_eq!(
            names(&views),
            ["invoices", "Invoice2023.pdf", "Invoice_scan.png"]
        );
        assert_eq!(views[0].size, 5);
    }

    #[tokio::test]
    async fn test_blank_search_is_rejected() {
        let (_memory, shared) = store();
        let err = listing(shared)
            .list(&ListScope::Search { query: "  ".into() })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_move_targets_exclude_item_and_descendants() {
        let (memory, shared) = store();
        let a = folder(&memory, "A", None).await;
        let b = folder(&memory, "B", Some(a.id)).await;
        folder(&memory, "C", Some(b.id)).await;
        let other = folder(&memory, "Other", None).await;
        let f = file(&memory, "f.txt", Some(other.id), 1).await;

        let svc = listing(shared);
        let targets: Vec<_> = svc
            .list_move_targets(a.id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(targets, ["Other"]);

        let for_file = svc.list_move_targets(f.id).await.unwrap();
        assert_eq!(for_file.len(), 4);
    }

    #[tokio::test]
    async fn test_list_folders_sorted_by_name() {
        let (memory, shared) = store();
        folder(&memory, "b", None).await;
        let a = folder(&memory, "A", None).await;
        folder(&memory, "c", Some(a.id)).await;
        file(&memory, "file", None, 1).await;

        let folders = listing(shared).list_folders().await.unwrap();
        let names: Vec<_> = folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["A", "b", "c"]);
    }
}
