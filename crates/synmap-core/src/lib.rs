pub mod adjacency;
pub mod branch;
pub mod edge;
pub mod error;
pub mod graph;
pub mod id;
pub mod label;
pub mod node;

// Re-export commonly used types
pub use adjacency::{AdjacencyStats, WeightedAdjacency};
pub use branch::{CategoryBranchMap, CATCH_ALL_CATEGORIES};
pub use edge::{EdgeRecord, MatchEdge, Predicate, Weight};
pub use error::CoreError;
pub use graph::{LoadReport, MatchGraph, ReferenceMode};
pub use id::{EdgeId, LabelId, NodeId};
pub use label::{LabelSet, LabelStore};
pub use node::MatchNode;
