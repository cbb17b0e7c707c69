//! In-memory [`BranchSource`] for tests and embedding.

use synmap_core::CategoryBranchMap;

use crate::error::StorageError;
use crate::traits::BranchSource;

/// Serves a fixed table regardless of the requested model version.
#[derive(Debug, Clone, Default)]
pub struct StaticBranchSource {
    map: CategoryBranchMap,
}

impl StaticBranchSource {
    pub fn new(map: CategoryBranchMap) -> Self {
        StaticBranchSource { map }
    }
}

impl BranchSource for StaticBranchSource {
    fn category_to_branch(&self, model_version: &str) -> Result<CategoryBranchMap, StorageError> {
        if self.map.is_empty() {
            return Err(StorageError::MissingCategoryMapping {
                location: "static table".to_string(),
                reason: format!("no categories configured for model version {model_version}"),
            });
        }
        Ok(self.map.clone())
    }
}
