//! Storage error types for synmap-storage.
//!
//! [`StorageError`] covers everything that can go wrong between the
//! pipeline and the outside world: file access, malformed tables, and the
//! category→branch lookup.

use std::path::PathBuf;

use synmap_core::CoreError;
use thiserror::Error;

/// Errors produced while reading inputs, fetching the branch map, or
/// writing outputs.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Opening or creating a file failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A table could not be read or written as delimited text.
    #[error("table error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from a table header.
    #[error("{table} table has no '{column}' column")]
    MissingColumn { table: &'static str, column: &'static str },

    /// A required cell is empty.
    #[error("{table} table line {line}: empty '{column}' value")]
    MissingValue {
        table: &'static str,
        line: u64,
        column: &'static str,
    },

    /// The category→major-branch table could not be obtained.
    #[error("category to major branch mapping unavailable from {location}: {reason}")]
    MissingCategoryMapping { location: String, reason: String },

    /// The loaded data violated a graph invariant.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the underlying cause is an operating-system I/O failure.
    pub fn is_io(&self) -> bool {
        match self {
            StorageError::Io { .. } => true,
            StorageError::Csv(err) => err.is_io_error(),
            _ => false,
        }
    }
}
