//! Listing scope: folder contents or global search.

use serde::{Deserialize, Serialize};

use filetree_core::types::ItemId;

/// What a listing call should return. The two modes are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ListScope {
    /// Direct children of a folder, or root-level items when `parent_id` is null.
    Folder {
        /// The folder whose contents are listed.
        parent_id: Option<ItemId>,
    },
    /// Every item in the tree whose name contains `query`, case-insensitively.
    Search {
        /// Substring to look for.
        query: String,
    },
}

impl ListScope {
    /// Build a scope from the `listItems(parentId, query)` parameter pair.
    ///
    /// A present query selects search mode and the parent is ignored.
    pub fn from_params(parent_id: Option<ItemId>, query: Option<&str>) -> Self {
        match query {
            Some(q) => Self::Search {
                query: q.to_string(),
            },
            None => Self::Folder { parent_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_selects_search_mode() {
        let parent = ItemId::new();
        let scope = ListScope::from_params(Some(parent), Some("invoice"));
        assert_eq!(
            scope,
            ListScope::Search {
                query: "invoice".into()
            }
        );
    }

    #[test]
    fn test_no_query_lists_folder() {
        assert_eq!(
            ListScope::from_params(None, None),
            ListScope::Folder { parent_id: None }
        );
    }
}
