//! Cluster assignment.
//!
//! Nodes that already carry a `cluster_id` keep it and act as fixed
//! evidence. Every other node starts in a cluster of its own (its
//! identifier) and joins its neighbors' majority cluster by propagation.
//! After the run each node's `cluster_id` is set.

use serde::{Deserialize, Serialize};

use synmap_core::{CoreError, LabelStore, MatchGraph, NodeId, WeightedAdjacency};

use crate::engine::{propagate, PropagationConfig, PropagationReport};

/// Shape of the clustering result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterReport {
    /// Distinct clusters with at least one member.
    pub clusters: usize,
    /// Clusters with exactly one member.
    pub singletons: usize,
    /// Member count of the largest cluster.
    pub largest: usize,
    /// Nodes that arrived with a cluster id.
    pub preassigned: usize,
    pub propagation: PropagationReport,
}

/// Clusters `graph` over `adjacency`, writing each node's `cluster_id`.
///
/// `adjacency` should be built from the conflict-filtered edge list.
pub fn cluster_match_graph(
    graph: &mut MatchGraph,
    adjacency: &WeightedAdjacency,
    config: &PropagationConfig,
) -> Result<(LabelStore, ClusterReport), CoreError> {
    let mut clusters = LabelStore::unlabeled(graph.node_count());
    let mut eligible: Vec<NodeId> = Vec::new();

    for (id, key, node) in graph.nodes() {
        match node.cluster_id.as_deref() {
            Some(cluster_id) => {
                clusters.set(id, cluster_id)?;
            }
            None => {
                clusters.set(id, key)?;
                eligible.push(id);
            }
        }
    }
    let preassigned = graph.node_count() - eligible.len();

    tracing::info!(
        nodes = graph.node_count(),
        preassigned,
        "seeded clusters"
    );

    let propagation = propagate(&mut clusters, adjacency, &eligible, config)?;

    for (id, cluster) in clusters.iter() {
        if let (Some(node), Some(cluster)) = (graph.node_mut(id), cluster) {
            node.cluster_id = Some(clusters.resolve(cluster).to_string());
        }
    }

    let sizes = clusters.label_sizes();
    let report = ClusterReport {
        clusters: sizes.iter().filter(|&&n| n > 0).count(),
        singletons: sizes.iter().filter(|&&n| n == 1).count(),
        largest: sizes.iter().copied().max().unwrap_or(0),
        preassigned,
        propagation,
    };

    tracing::info!(
        clusters = report.clusters,
        singletons = report.singletons,
        largest = report.largest,
        "clustering finished"
    );

    Ok((clusters, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use synmap_core::{EdgeRecord, MatchNode, ReferenceMode};

    fn config() -> PropagationConfig {
        PropagationConfig {
            seed: Some(99),
            ..PropagationConfig::default()
        }
    }

    fn cluster_of(graph: &MatchGraph, key: &str) -> String {
        graph
            .node(graph.node_id(key).unwrap())
            .unwrap()
            .cluster_id
            .clone()
            .unwrap()
    }

    #[test]
    fn preassigned_cluster_pulls_its_chain() {
        // A -1.0- B -0.5- C with A already in cluster "X".
        let (mut graph, _) = MatchGraph::from_records(
            vec![
                ("A".to_string(), MatchNode::new().with_cluster_id("X")),
                ("B".to_string(), MatchNode::new()),
                ("C".to_string(), MatchNode::new()),
            ],
            vec![
                EdgeRecord::new("e1", "A", "biolink:same_as", "B"),
                EdgeRecord::new("e2", "B", "biolink:close_match", "C"),
            ],
            ReferenceMode::Strict,
        )
        .unwrap();
        let adjacency = WeightedAdjacency::from_graph(&graph).unwrap();

        let (_, report) = cluster_match_graph(&mut graph, &adjacency, &config()).unwrap();

        assert!(report.propagation.converged());
        assert_eq!(report.preassigned, 1);
        assert_eq!(report.clusters, 1);
        assert_eq!(report.largest, 3);
        for key in ["A", "B", "C"] {
            assert_eq!(cluster_of(&graph, key), "X");
        }
    }

    #[test]
    fn isolated_node_is_its_own_cluster() {
        let (mut graph, _) = MatchGraph::from_records(
            vec![
                ("P".to_string(), MatchNode::new()),
                ("Q".to_string(), MatchNode::new()),
                ("LONE".to_string(), MatchNode::new()),
            ],
            vec![EdgeRecord::new("e1", "P", "biolink:same_as", "Q")],
            ReferenceMode::Strict,
        )
        .unwrap();
        let adjacency = WeightedAdjacency::from_graph(&graph).unwrap();

        let (_, report) = cluster_match_graph(&mut graph, &adjacency, &config()).unwrap();

        assert_eq!(cluster_of(&graph, "LONE"), "LONE");
        assert_eq!(cluster_of(&graph, "P"), cluster_of(&graph, "Q"));
        assert_eq!(report.clusters, 2);
        assert_eq!(report.singletons, 1);
        assert_eq!(report.largest, 2);
    }

    #[test]
    fn fully_preassigned_graph_is_left_alone() {
        let (mut graph, _) = MatchGraph::from_records(
            vec![
                ("A".to_string(), MatchNode::new().with_cluster_id("K1")),
                ("B".to_string(), MatchNode::new().with_cluster_id("K2")),
            ],
            vec![EdgeRecord::new("e1", "A", "biolink:same_as", "B")],
            ReferenceMode::Strict,
        )
        .unwrap();
        let adjacency = WeightedAdjacency::from_graph(&graph).unwrap();

        let (_, report) = cluster_match_graph(&mut graph, &adjacency, &config()).unwrap();

        assert_eq!(report.propagation.iterations(), 0);
        assert_eq!(cluster_of(&graph, "A"), "K1");
        assert_eq!(cluster_of(&graph, "B"), "K2");
    }
}
