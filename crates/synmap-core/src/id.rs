//! Dense ID newtypes for match-graph entities.
//!
//! Node identifiers are interned once when the node table is loaded. Every
//! structure downstream (adjacency, label stores, edges) refers to nodes by
//! a `u32` index so that millions of nodes stay cheap to hold in memory.
//! All IDs are distinct newtypes so a `NodeId` cannot be passed where a
//! `LabelId` is expected.

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// The ID as a `usize` for slice indexing.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

dense_id! {
    /// Row index of a node in the node table. Doubles as the petgraph
    /// `NodeIndex<u32>` of the adjacency.
    NodeId
}

dense_id! {
    /// Position of an edge row in the edge table.
    EdgeId
}

dense_id! {
    /// Interned label (major branch or cluster id) within one label store.
    LabelId
}

impl From<NodeIndex<u32>> for NodeId {
    fn from(idx: NodeIndex<u32>) -> Self {
        NodeId(idx.index() as u32)
    }
}

impl From<NodeId> for NodeIndex<u32> {
    fn from(id: NodeId) -> Self {
        NodeIndex::new(id.index())
    }
}
