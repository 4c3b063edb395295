//! # filetree-service
//!
//! The tree engine for FileTree. Each service works against an
//! [`ItemStore`](filetree_database::ItemStore) and implements one concern:
//!
//! - [`SizeAggregator`]: recursive folder sizes, computed on every read
//! - [`TreeNavigator`]: breadcrumbs and bounded ancestor walks
//! - [`ListingService`]: folder contents and global name search
//! - [`ItemService`]: uniqueness-checked creation and cascading deletion
//! - [`MoveService`]: cycle-safe, conflict-checked relocation
//!
//! [`ExplorerService`] bundles them behind the operations callers use.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod context;
pub mod explorer;
pub mod item;

pub use context::RequestContext;
pub use explorer::ExplorerService;
pub use item::{
    CreateItemRequest, ItemService, ListingService, MoveService, SizeAggregator, TreeNavigator,
};
