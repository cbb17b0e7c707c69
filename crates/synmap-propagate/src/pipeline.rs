//! End-to-end clustering run over an in-memory [`MatchGraph`].
//!
//! Steps, in order:
//!
//! 1. build the weighted adjacency over all edges,
//! 2. assign major branches,
//! 3. drop edges whose endpoints do not share a branch,
//! 4. rebuild the adjacency over the surviving edges,
//! 5. cluster.
//!
//! The caller loads the tables and the branch map and writes the results;
//! this module performs no I/O.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use synmap_core::{AdjacencyStats, CategoryBranchMap, CoreError, MatchGraph, WeightedAdjacency};

use crate::cluster::{cluster_match_graph, ClusterReport};
use crate::engine::PropagationConfig;
use crate::filter::{remove_conflicting_edges, FilterReport};
use crate::major_branch::{assign_major_branches, BranchReport};

/// Configuration for [`run_pipeline`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Used for both the branch and the cluster propagation.
    pub propagation: PropagationConfig,
}

/// Everything a run reports, in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub adjacency: AdjacencyStats,
    pub branches: BranchReport,
    pub filter: FilterReport,
    pub filtered_adjacency: AdjacencyStats,
    pub clusters: ClusterReport,
}

impl PipelineReport {
    /// Whether both propagation runs converged.
    pub fn converged(&self) -> bool {
        self.branches.propagation.converged() && self.clusters.propagation.converged()
    }
}

/// Runs branch assignment, conflict filtering and clustering on `graph`.
///
/// On return every node has its `cluster_id` set and, where one could be
/// found, its `major_branch`; the edge list holds only same-branch edges.
pub fn run_pipeline(
    graph: &mut MatchGraph,
    branch_map: &CategoryBranchMap,
    config: &PipelineConfig,
) -> Result<PipelineReport, CoreError> {
    let started = Instant::now();

    let adjacency = WeightedAdjacency::from_graph(graph)?;
    let adjacency_stats = *adjacency.stats();
    tracing::info!(
        components = adjacency.connected_components(),
        "match graph adjacency ready"
    );

    let step = Instant::now();
    let (branch_labels, branches) =
        assign_major_branches(graph, &adjacency, branch_map, &config.propagation)?;
    tracing::info!(elapsed_ms = step.elapsed().as_millis() as u64, "major branches assigned");
    drop(adjacency);

    let filter = remove_conflicting_edges(graph, &branch_labels);
    drop(branch_labels);

    let filtered = WeightedAdjacency::from_graph(graph)?;
    let filtered_adjacency = *filtered.stats();
    tracing::info!(
        components = filtered.connected_components(),
        "filtered adjacency ready"
    );

    let step = Instant::now();
    let (_, clusters) = cluster_match_graph(graph, &filtered, &config.propagation)?;
    tracing::info!(elapsed_ms = step.elapsed().as_millis() as u64, "clusters assigned");

    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        clusters = clusters.clusters,
        "pipeline finished"
    );

    Ok(PipelineReport {
        adjacency: adjacency_stats,
        branches,
        filter,
        filtered_adjacency,
        clusters,
    })
}
