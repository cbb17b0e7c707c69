//! Cross-branch edge removal.
//!
//! After branch assignment an edge survives only when both endpoints carry a
//! branch and the branches are equal. Edges touching an unlabeled node are
//! dropped as well, so clustering never joins two nodes whose branches are
//! unknown or different.

use serde::{Deserialize, Serialize};

use synmap_core::{LabelStore, MatchEdge, MatchGraph};

/// Edge counts around the conflict filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    pub before: usize,
    pub after: usize,
    /// Removed because at least one endpoint has no branch.
    pub unlabeled_endpoint: usize,
    /// Removed because the endpoints sit in different branches.
    pub cross_branch: usize,
}

impl FilterReport {
    pub fn removed(&self) -> usize {
        self.before - self.after
    }
}

/// Whether both endpoints of `edge` carry the same branch.
pub fn shares_branch(edge: &MatchEdge, branches: &LabelStore) -> bool {
    match (branches.get(edge.subject), branches.get(edge.object)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Drops every edge of `graph` whose endpoints do not share a branch.
pub fn remove_conflicting_edges(graph: &mut MatchGraph, branches: &LabelStore) -> FilterReport {
    let mut report = FilterReport {
        before: graph.edge_count(),
        ..FilterReport::default()
    };

    graph.retain_edges(|edge| {
        match (branches.get(edge.subject), branches.get(edge.object)) {
            (Some(a), Some(b)) if a == b => return true,
            (Some(_), Some(_)) => report.cross_branch += 1,
            _ => report.unlabeled_endpoint += 1,
        }
        false
    });
    report.after = graph.edge_count();

    tracing::info!(
        before = report.before,
        after = report.after,
        cross_branch = report.cross_branch,
        unlabeled_endpoint = report.unlabeled_endpoint,
        "removed edges between nodes of different major branches"
    );

    report
}
