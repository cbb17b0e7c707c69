//! Match-graph node records.
//!
//! A [`MatchNode`] holds everything the clustering run reads or writes for
//! one identifier. The identifier itself is the key of the owning
//! [`MatchGraph`](crate::graph::MatchGraph) and is not duplicated here.

use serde::{Deserialize, Serialize};

/// Attributes of a single node in the match graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchNode {
    /// Cluster id carried over from a prior run, or assigned by clustering.
    pub cluster_id: Option<String>,
    /// Category reported by the preferred upstream source.
    pub category_source_a: Option<String>,
    /// Category reported by the fallback upstream source.
    pub category_source_b: Option<String>,
    /// Major branch, set by branch assignment. `None` means unlabeled.
    pub major_branch: Option<String>,
    /// Pass-through columns, in table order.
    pub extra: Vec<String>,
}

impl MatchNode {
    pub fn new() -> Self {
        MatchNode::default()
    }

    pub fn with_cluster_id(mut self, cluster_id: impl Into<String>) -> Self {
        self.cluster_id = Some(cluster_id.into());
        self
    }

    pub fn with_categories(mut self, source_a: Option<&str>, source_b: Option<&str>) -> Self {
        self.category_source_a = source_a.map(str::to_string);
        self.category_source_b = source_b.map(str::to_string);
        self
    }

    /// The category used for branch assignment: source A when present,
    /// otherwise source B.
    pub fn category(&self) -> Option<&str> {
        self.category_source_a
            .as_deref()
            .or(self.category_source_b.as_deref())
    }
}
