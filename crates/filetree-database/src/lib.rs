//! # filetree-database
//!
//! The [`ItemStore`] contract consumed by the tree engine, a PostgreSQL
//! implementation backed by `sqlx`, and an in-memory implementation for
//! single-process deployments and tests.

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod store;

use std::sync::Arc;

use tracing::info;

use filetree_core::config::{StoreBackend, StoreConfig, TreeConfig};
use filetree_core::result::AppResult;

pub use memory::MemoryItemStore;
pub use repositories::ItemRepository;
pub use store::{CascadeMode, ItemStore};

/// Open the store selected by configuration, running migrations when asked.
pub async fn open_store(store: &StoreConfig, tree: &TreeConfig) -> AppResult<Arc<dyn ItemStore>> {
    match store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory item store");
            Ok(Arc::new(MemoryItemStore::new().with_max_depth(tree.max_depth)))
        }
        StoreBackend::Postgres => {
            let pool = connection::connect(&store.database).await?;
            if store.database.run_migrations {
                connection::migrate(&pool).await?;
            }
            Ok(Arc::new(
                ItemRepository::new(pool).with_max_depth(tree.max_depth),
            ))
        }
    }
}
