//! # filetree-entity
//!
//! Domain entity models for FileTree. The only stored entity is the
//! [`Item`](item::Item), a file or a folder. The remaining types are
//! read-side projections handed to callers.

pub mod item;

pub use item::{Breadcrumb, CreateItem, FolderOption, Item, ItemKind, ItemView, ListScope};
