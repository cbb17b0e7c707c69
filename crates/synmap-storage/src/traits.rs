//! The [`BranchSource`] trait: where the category→major-branch table comes from.
//!
//! The pipeline only ever sees a [`CategoryBranchMap`]. Implementations are
//! interchangeable: [`HttpBranchSource`](crate::http::HttpBranchSource) for
//! production runs, [`JsonFileBranchSource`](crate::json_file::JsonFileBranchSource)
//! for offline runs, and [`StaticBranchSource`](crate::memory::StaticBranchSource)
//! for tests.

use serde::Deserialize;

use synmap_core::CategoryBranchMap;

use crate::error::StorageError;

/// Supplies the category→major-branch table for a model version.
///
/// The trait is synchronous; the table is fetched once per run, before any
/// graph work starts.
pub trait BranchSource {
    /// Returns the table for `model_version`.
    ///
    /// An unreachable source or an empty table is a
    /// [`StorageError::MissingCategoryMapping`].
    fn category_to_branch(&self, model_version: &str) -> Result<CategoryBranchMap, StorageError>;
}

/// Accepted document shapes: the service's wrapped object, or a bare map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum BranchMapDocument {
    Wrapped {
        category_to_major_branch: CategoryBranchMap,
    },
    Flat(CategoryBranchMap),
}

impl BranchMapDocument {
    /// Unwraps the table, rejecting an empty one.
    pub(crate) fn into_map(self, location: &str) -> Result<CategoryBranchMap, StorageError> {
        let map = match self {
            BranchMapDocument::Wrapped {
                category_to_major_branch,
            } => category_to_major_branch,
            BranchMapDocument::Flat(map) => map,
        };
        if map.is_empty() {
            return Err(StorageError::MissingCategoryMapping {
                location: location.to_string(),
                reason: "the category to major branch table is empty".to_string(),
            });
        }
        Ok(map)
    }
}
