//! Category → major-branch lookup table.
//!
//! A major branch is a coarse semantic grouping (chemical, gene/protein,
//! disease, ...) used to keep unrelated entities out of the same cluster.
//! The table itself is supplied from outside (see the storage crate's
//! `BranchSource`); this type only answers lookups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root categories too generic to place a node in any branch. Nodes
/// carrying one of these get their branch from their neighbors instead.
pub const CATCH_ALL_CATEGORIES: [&str; 2] = ["biolink:NamedThing", "biolink:BiologicalEntity"];

/// Flat mapping from category label to major-branch label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryBranchMap {
    branches: HashMap<String, String>,
}

impl CategoryBranchMap {
    pub fn new(branches: HashMap<String, String>) -> Self {
        CategoryBranchMap { branches }
    }

    /// The major branch of `category`.
    ///
    /// Returns `None` for catch-all root categories and for categories the
    /// table does not know.
    pub fn branch_of(&self, category: &str) -> Option<&str> {
        if is_catch_all(category) {
            return None;
        }
        self.branches.get(category).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for CategoryBranchMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        CategoryBranchMap {
            branches: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Returns `true` for the catch-all root categories.
pub fn is_catch_all(category: &str) -> bool {
    CATCH_ALL_CATEGORIES.contains(&category)
}
