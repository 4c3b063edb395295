//! Item entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use filetree_core::types::ItemId;

use super::kind::ItemKind;

/// A file or folder in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Item {
    /// Unique item identifier.
    pub id: ItemId,
    /// Item name, unique among siblings of the same kind.
    pub name: String,
    /// File or folder. Immutable after creation.
    pub kind: ItemKind,
    /// Containing folder (null for root-level items).
    pub parent_id: Option<ItemId>,
    /// Stored byte count. Meaningful for files only; always 0 for folders.
    pub size_bytes: i64,
    /// Optimistic-concurrency token, bumped on every parent change.
    pub version: i64,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// When the item was last moved.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Check if this item is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }

    /// Check if this item is a file.
    pub fn is_file(&self) -> bool {
        self.kind == ItemKind::File
    }

    /// Check if this item sits at the root (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to insert a new item. The store assigns the ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItem {
    /// Item name.
    pub name: String,
    /// File or folder.
    pub kind: ItemKind,
    /// Parent folder (None for root).
    pub parent_id: Option<ItemId>,
    /// Byte size for files; 0 for folders.
    pub size_bytes: i64,
}

impl CreateItem {
    /// Describe a new folder.
    pub fn folder(name: impl Into<String>, parent_id: Option<ItemId>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Folder,
            parent_id,
            size_bytes: 0,
        }
    }

    /// Describe a new file.
    pub fn file(name: impl Into<String>, parent_id: Option<ItemId>, size_bytes: i64) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::File,
            parent_id,
            size_bytes,
        }
    }

    /// Materialize the record with a freshly assigned identifier.
    pub fn into_item(self, now: DateTime<Utc>) -> Item {
        Item {
            id: ItemId::new(),
            name: self.name,
            kind: self.kind,
            parent_id: self.parent_id,
            size_bytes: self.size_bytes,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_item_starts_at_version_zero() {
        let item = CreateItem::folder("Docs", None).into_item(Utc::now());
        assert_eq!(item.version, 0);
        assert!(item.is_root());
        assert!(item.is_folder());
        assert_eq!(item.size_bytes, 0);
    }
}
