//! Core error types for synmap-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Every variant
//! names the offending edge or node so a failed run points straight at the
//! row that caused it.

use crate::id::NodeId;
use thiserror::Error;

/// Core errors produced by the synmap-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An edge carries a predicate with no defined match weight.
    #[error("unknown predicate '{predicate}' on edge '{edge}'")]
    UnknownPredicate { edge: String, predicate: String },

    /// An edge references a node id that is absent from the node table.
    #[error("edge '{edge}' references unknown node '{node}'")]
    DanglingEdgeReference { edge: String, node: String },

    /// The node table contains the same identifier twice.
    #[error("duplicate node id: '{id}'")]
    DuplicateNode { id: String },

    /// A node index is outside the graph it was used with.
    #[error("node {node} out of range for a graph of {node_count} nodes")]
    NodeOutOfRange { node: NodeId, node_count: usize },

    /// A label store was sized for a different graph than the adjacency.
    #[error("label store holds {actual} nodes but the adjacency has {expected}")]
    LabelStoreMismatch { expected: usize, actual: usize },
}
