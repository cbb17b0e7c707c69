//! [`BranchSource`] backed by a JSON file on disk.
//!
//! Accepts the same document the lookup service returns
//! (`{"category_to_major_branch": {...}}`) or a bare category→branch object,
//! so a saved service response can be replayed offline.

use std::fs;
use std::path::{Path, PathBuf};

use synmap_core::CategoryBranchMap;

use crate::error::StorageError;
use crate::traits::{BranchMapDocument, BranchSource};

/// Reads the table from a JSON file. The model version is not consulted.
#[derive(Debug, Clone)]
pub struct JsonFileBranchSource {
    path: PathBuf,
}

impl JsonFileBranchSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileBranchSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BranchSource for JsonFileBranchSource {
    fn category_to_branch(&self, model_version: &str) -> Result<CategoryBranchMap, StorageError> {
        let location = self.path.display().to_string();
        let unavailable = |reason: String| StorageError::MissingCategoryMapping {
            location: location.clone(),
            reason,
        };

        let text = fs::read_to_string(&self.path).map_err(|e| unavailable(e.to_string()))?;
        let document: BranchMapDocument =
            serde_json::from_str(&text).map_err(|e| unavailable(e.to_string()))?;
        let map = document.into_map(&location)?;

        tracing::info!(
            path = %location,
            model_version,
            categories = map.len(),
            "loaded category to major branch table from file"
        );
        Ok(map)
    }
}
