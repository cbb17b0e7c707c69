//! Weighted undirected adjacency over a match graph.
//!
//! [`WeightedAdjacency`] folds the edge list into one weighted pair per
//! unordered node pair: parallel edges and reversed duplicates have their
//! predicate weights summed. The result is held in a petgraph `UnGraph`
//! with one graph node per [`NodeId`], so `weight(a, b) == weight(b, a)`
//! holds by construction.
//!
//! Building is a single O(E) pass. Edges do not need to be sorted or
//! deduplicated beforehand.

use indexmap::map::Entry;
use indexmap::IndexMap;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::edge::{MatchEdge, Weight};
use crate::error::CoreError;
use crate::graph::MatchGraph;
use crate::id::NodeId;

/// Counts gathered while building an adjacency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyStats {
    /// Edges read from the edge list.
    pub edges_read: usize,
    /// Distinct unordered node pairs.
    pub pairs: usize,
    /// Edges folded into a pair that already existed.
    pub parallel_edges_merged: usize,
    /// Edges whose subject and object are the same node.
    pub self_loops_skipped: usize,
    /// Nodes with no neighbor at all.
    pub isolated_nodes: usize,
}

/// Symmetric weighted adjacency, indexed by [`NodeId`].
#[derive(Debug, Clone)]
pub struct WeightedAdjacency {
    graph: UnGraph<(), Weight, u32>,
    stats: AdjacencyStats,
}

impl WeightedAdjacency {
    /// Builds the adjacency for all nodes and edges of `graph`.
    pub fn from_graph(graph: &MatchGraph) -> Result<Self, CoreError> {
        Self::build(graph.node_count(), graph.edges())
    }

    /// Builds the adjacency for `node_count` nodes from an edge list.
    ///
    /// Fails with [`CoreError::UnknownPredicate`] on the first edge whose
    /// predicate has no weight, and with [`CoreError::NodeOutOfRange`] if an
    /// edge endpoint is not below `node_count`.
    pub fn build(node_count: usize, edges: &[MatchEdge]) -> Result<Self, CoreError> {
        let mut stats = AdjacencyStats {
            edges_read: edges.len(),
            ..AdjacencyStats::default()
        };

        // First-seen order keeps the resulting graph deterministic.
        let mut pair_weights: IndexMap<(NodeId, NodeId), Weight> =
            IndexMap::with_capacity(edges.len());

        for edge in edges {
            let weight = edge.weight()?;
            for endpoint in [edge.subject, edge.object] {
                if endpoint.index() >= node_count {
                    return Err(CoreError::NodeOutOfRange {
                        node: endpoint,
                        node_count,
                    });
                }
            }
            if edge.is_self_loop() {
                stats.self_loops_skipped += 1;
                continue;
            }

            match pair_weights.entry(edge.canonical_pair()) {
                Entry::Occupied(mut entry) => {
                    *entry.get_mut() += weight;
                    stats.parallel_edges_merged += 1;
                }
                Entry::Vacant(entry) => {
                    entry.insert(weight);
                }
            }
        }

        let mut graph = UnGraph::<(), Weight, u32>::with_capacity(node_count, pair_weights.len());
        for _ in 0..node_count {
            graph.add_node(());
        }
        for ((a, b), weight) in pair_weights {
            graph.add_edge(a.into(), b.into(), weight);
        }

        stats.pairs = graph.edge_count();
        stats.isolated_nodes = graph
            .node_indices()
            .filter(|&idx| graph.neighbors(idx).next().is_none())
            .count();

        tracing::info!(
            nodes = node_count,
            edges = stats.edges_read,
            pairs = stats.pairs,
            parallel_merged = stats.parallel_edges_merged,
            self_loops = stats.self_loops_skipped,
            isolated = stats.isolated_nodes,
            "built weighted adjacency"
        );

        Ok(WeightedAdjacency { graph, stats })
    }

    /// Iterates `node`'s neighbors with their summed weights.
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, Weight)> + '_ {
        let idx: NodeIndex<u32> = node.into();
        self.graph.edges(idx).map(move |edge| {
            let other = if edge.source() == idx {
                edge.target()
            } else {
                edge.source()
            };
            (NodeId::from(other), *edge.weight())
        })
    }

    /// The summed weight between `a` and `b`, if they are adjacent.
    pub fn weight(&self, a: NodeId, b: NodeId) -> Option<Weight> {
        if a.index() >= self.node_count() || b.index() >= self.node_count() {
            return None;
        }
        self.graph
            .find_edge(a.into(), b.into())
            .and_then(|edge| self.graph.edge_weight(edge).copied())
    }

    /// Number of distinct neighbors of `node`.
    pub fn degree(&self, node: NodeId) -> usize {
        self.graph.neighbors(node.into()).count()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct adjacent pairs.
    pub fn pair_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn stats(&self) -> &AdjacencyStats {
        &self.stats
    }

    /// Number of connected components, isolated nodes included.
    pub fn connected_components(&self) -> usize {
        petgraph::algo::connected_components(&self.graph)
    }
}
