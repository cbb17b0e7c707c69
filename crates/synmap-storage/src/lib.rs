//! Inputs and outputs of a synmap run.
//!
//! - [`tsv`]: node, edge and member-map tables as tab-separated text
//! - [`files`]: run-directory file names and whole-run load/write
//! - [`traits`]: the [`BranchSource`] contract for the category→branch table
//! - [`http`], [`json_file`], [`memory`]: its implementations
//! - [`error`]: [`StorageError`]

pub mod error;
pub mod files;
pub mod http;
pub mod json_file;
pub mod memory;
pub mod traits;
pub mod tsv;

pub use error::StorageError;
pub use files::{load_match_tables, write_match_tables, MatchTables, OutputPaths};
pub use http::{HttpBranchSource, HttpBranchSourceConfig, DEFAULT_BRANCH_URL, DEFAULT_MODEL_VERSION};
pub use json_file::JsonFileBranchSource;
pub use memory::StaticBranchSource;
pub use traits::BranchSource;
pub use tsv::{EdgeLayout, NodeLayout};
