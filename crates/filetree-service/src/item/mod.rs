//! Item tree services.

pub mod listing;
pub mod move_op;
pub mod service;
pub mod size;
pub mod tree;

pub use listing::ListingService;
pub use move_op::MoveService;
pub use service::{CreateItemRequest, ItemService};
pub use size::SizeAggregator;
pub use tree::TreeNavigator;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use filetree_database::{ItemStore, MemoryItemStore};
    use filetree_entity::item::{CreateItem, Item};

    use filetree_core::types::ItemId;

    pub fn store() -> (MemoryItemStore, Arc<dyn ItemStore>) {
        let memory = MemoryItemStore::new();
        let shared: Arc<dyn ItemStore> = Arc::new(memory.clone());
        (memory, shared)
    }

    pub async fn folder(store: &MemoryItemStore, name: &str, parent: Option<ItemId>) -> Item {
        store
            .insert(&CreateItem::folder(name, parent))
            .await
            .expect("insert folder")
    }

    pub async fn file(
        store: &MemoryItemStore,
        name: &str,
        parent: Option<ItemId>,
        size: i64,
    ) -> Item {
        store
            .insert(&CreateItem::file(name, parent, size))
            .await
            .expect("insert file")
    }
}
