//! Major-branch assignment.
//!
//! Every node whose category resolves through the [`CategoryBranchMap`] is
//! seeded with that branch and stays fixed. Nodes with a missing, unknown or
//! catch-all category start unlabeled and receive a branch by weighted
//! propagation from their neighbors. A node that no labeled node can reach
//! ends up with no branch.

use serde::{Deserialize, Serialize};

use synmap_core::{CategoryBranchMap, CoreError, LabelStore, MatchGraph, NodeId, WeightedAdjacency};

use crate::engine::{propagate, PropagationConfig, PropagationReport};

/// Counts from one branch assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchReport {
    /// Nodes whose branch came straight from their category.
    pub seeded: usize,
    /// Nodes that needed propagation.
    pub unknown: usize,
    /// Unknown nodes that received a branch.
    pub propagated: usize,
    /// Nodes left without any branch.
    pub unlabeled: usize,
    /// Distinct branches present after assignment.
    pub branches: usize,
    pub propagation: PropagationReport,
}

/// Assigns a major branch to every node it can, writing it to
/// `MatchNode::major_branch`.
///
/// Returns the branch labeling (indexed by [`NodeId`]) for the conflict
/// filter, along with a report.
pub fn assign_major_branches(
    graph: &mut MatchGraph,
    adjacency: &WeightedAdjacency,
    branch_map: &CategoryBranchMap,
    config: &PropagationConfig,
) -> Result<(LabelStore, BranchReport), CoreError> {
    let mut branches = LabelStore::unlabeled(graph.node_count());
    let mut unknown: Vec<NodeId> = Vec::new();

    for (id, _, node) in graph.nodes() {
        match node.category().and_then(|category| branch_map.branch_of(category)) {
            Some(branch) => {
                branches.set(id, branch)?;
            }
            None => unknown.push(id),
        }
    }
    let seeded = graph.node_count() - unknown.len();

    tracing::info!(
        seeded,
        unknown = unknown.len(),
        "seeded major branches from node categories"
    );

    let propagation = propagate(&mut branches, adjacency, &unknown, config)?;

    for (id, branch) in branches.iter() {
        if let Some(node) = graph.node_mut(id) {
            node.major_branch = branch.map(|b| branches.resolve(b).to_string());
        }
    }

    let unlabeled = branches.unlabeled_count();
    let report = BranchReport {
        seeded,
        unknown: unknown.len(),
        propagated: unknown.len() - unlabeled,
        unlabeled,
        branches: branches.assigned_label_count(),
        propagation,
    };

    if unlabeled > 0 {
        tracing::info!(unlabeled, "nodes left without a major branch");
    }

    Ok((branches, report))
}
