//! Read-side projections returned by the tree operations.

use serde::{Deserialize, Serialize};

use filetree_core::types::ItemId;

use super::kind::ItemKind;
use super::model::Item;

/// An item annotated with its aggregate size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    /// Item ID.
    pub id: ItemId,
    /// Item name.
    pub name: String,
    /// File or folder.
    pub kind: ItemKind,
    /// Stored size for files, recursive descendant sum for folders.
    pub size: u64,
    /// Containing folder.
    pub parent_id: Option<ItemId>,
}

impl ItemView {
    /// Pair a stored item with its computed size.
    pub fn from_item(item: Item, size: u64) -> Self {
        Self {
            id: item.id,
            name: item.name,
            kind: item.kind,
            size,
            parent_id: item.parent_id,
        }
    }
}

/// One step of the root-to-item ancestor chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Item ID.
    pub id: ItemId,
    /// Item name.
    pub name: String,
}

/// A folder entry for populating a move-destination selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderOption {
    /// Folder ID.
    pub id: ItemId,
    /// Folder name.
    pub name: String,
    /// The folder's own parent.
    pub parent_id: Option<ItemId>,
}

impl From<&Item> for Breadcrumb {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
        }
    }
}

impl From<Item> for FolderOption {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            parent_id: item.parent_id,
        }
    }
}
