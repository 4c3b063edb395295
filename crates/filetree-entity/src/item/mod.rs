//! Item domain entities.

pub mod kind;
pub mod model;
pub mod scope;
pub mod view;

pub use kind::ItemKind;
pub use model::{CreateItem, Item};
pub use scope::ListScope;
pub use view::{Breadcrumb, FolderOption, ItemView};
