//! Item kind enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two variants of an item. Only folders may have children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_kind", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemKind {
    /// A leaf carrying a byte size.
    File,
    /// A container whose size is derived from its descendants.
    Folder,
}

impl ItemKind {
    /// Listing rank: folders sort before files.
    pub fn sort_rank(&self) -> u8 {
        match self {
            Self::Folder => 0,
            Self::File => 1,
        }
    }

    /// Return the kind as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "FILE",
            Self::Folder => "FOLDER",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = filetree_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FILE" => Ok(Self::File),
            "FOLDER" => Ok(Self::Folder),
            _ => Err(filetree_core::AppError::validation(format!(
                "Invalid item kind: '{s}'. Expected one of: FILE, FOLDER"
            ))),
        }
    }
}
