//! MatchGraph: the node table and edge list of one clustering run.
//!
//! [`MatchGraph`] is the single entry point for loading a match graph. It
//! interns node identifiers into dense [`NodeId`]s (an `IndexMap` keyed by
//! identifier, so the node table's row order is preserved), resolves edge
//! endpoints against the node table, and owns the edge list that the
//! conflict filter later narrows down.
//!
//! Edge endpoints that are absent from the node table are fatal in
//! [`ReferenceMode::Strict`] and silently counted and dropped in
//! [`ReferenceMode::ValidateOnly`], which exists for sampled/test runs where
//! the node table is a subset.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::edge::{EdgeRecord, MatchEdge};
use crate::error::CoreError;
use crate::id::{EdgeId, NodeId};
use crate::node::MatchNode;

/// How to treat edges that reference unknown nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceMode {
    /// A dangling reference aborts the load.
    #[default]
    Strict,
    /// Dangling edges are dropped and counted.
    ValidateOnly,
}

/// Counts gathered while loading a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub nodes: usize,
    pub edges: usize,
    pub dangling_edges_dropped: usize,
}

/// The match graph container.
#[derive(Debug, Clone, Default)]
pub struct MatchGraph {
    /// Nodes keyed by identifier; the map index is the [`NodeId`].
    nodes: IndexMap<String, MatchNode>,
    /// Edges with resolved endpoints, in table order.
    edges: Vec<MatchEdge>,
}

impl MatchGraph {
    pub fn new() -> Self {
        MatchGraph::default()
    }

    /// Builds a graph from node and edge rows.
    ///
    /// Nodes keep their row order. Edges are resolved in row order; the
    /// treatment of dangling references follows `mode`.
    pub fn from_records<N, E>(
        nodes: N,
        edges: E,
        mode: ReferenceMode,
    ) -> Result<(MatchGraph, LoadReport), CoreError>
    where
        N: IntoIterator<Item = (String, MatchNode)>,
        E: IntoIterator<Item = EdgeRecord>,
    {
        let mut graph = MatchGraph::new();
        for (id, node) in nodes {
            graph.add_node(id, node)?;
        }

        let mut report = LoadReport::default();
        for record in edges {
            match graph.add_edge(record) {
                Ok(_) => {}
                Err(CoreError::DanglingEdgeReference { edge, node })
                    if mode == ReferenceMode::ValidateOnly =>
                {
                    tracing::debug!(edge = %edge, node = %node, "dropping dangling edge");
                    report.dangling_edges_dropped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        report.nodes = graph.node_count();
        report.edges = graph.edge_count();
        if report.dangling_edges_dropped > 0 {
            tracing::warn!(
                dropped = report.dangling_edges_dropped,
                "validate-only mode dropped edges whose endpoints are missing from the node table"
            );
        }
        Ok((graph, report))
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Adds a node. Errors if the identifier is already present.
    pub fn add_node(&mut self, id: impl Into<String>, node: MatchNode) -> Result<NodeId, CoreError> {
        let idx = self.nodes.len();
        match self.nodes.entry(id.into()) {
            Entry::Occupied(entry) => Err(CoreError::DuplicateNode {
                id: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(node);
                Ok(NodeId(idx as u32))
            }
        }
    }

    /// Resolves and appends an edge row.
    ///
    /// Errors with [`CoreError::DanglingEdgeReference`] if either endpoint is
    /// not in the node table; the edge is not added in that case.
    pub fn add_edge(&mut self, record: EdgeRecord) -> Result<EdgeId, CoreError> {
        let subject = self.resolve_endpoint(&record.id, &record.subject)?;
        let object = self.resolve_endpoint(&record.id, &record.object)?;

        let edge_id = EdgeId(self.edges.len() as u32);
        self.edges.push(MatchEdge {
            id: record.id,
            subject,
            predicate: record.predicate,
            object,
            provenance: record.provenance,
        });
        Ok(edge_id)
    }

    /// Keeps only the edges for which `keep` returns `true`.
    ///
    /// Returns the number of edges removed.
    pub fn retain_edges<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&MatchEdge) -> bool,
    {
        let before = self.edges.len();
        self.edges.retain(keep);
        before - self.edges.len()
    }

    /// Mutable access to a node's attributes.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut MatchNode> {
        self.nodes.get_index_mut(id.index()).map(|(_, node)| node)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Looks up a node's dense ID by identifier.
    pub fn node_id(&self, key: &str) -> Option<NodeId> {
        self.nodes.get_index_of(key).map(|idx| NodeId(idx as u32))
    }

    /// The identifier of a node.
    pub fn node_key(&self, id: NodeId) -> Option<&str> {
        self.nodes.get_index(id.index()).map(|(key, _)| key.as_str())
    }

    pub fn node(&self, id: NodeId) -> Option<&MatchNode> {
        self.nodes.get_index(id.index()).map(|(_, node)| node)
    }

    /// Iterates `(id, identifier, node)` in node-table order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &str, &MatchNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, (key, node))| (NodeId(idx as u32), key.as_str(), node))
    }

    pub fn edges(&self) -> &[MatchEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn resolve_endpoint(&self, edge: &str, key: &str) -> Result<NodeId, CoreError> {
        self.node_id(key).ok_or_else(|| CoreError::DanglingEdgeReference {
            edge: edge.to_string(),
            node: key.to_string(),
        })
    }
}
