//! Label interning and the mutable node→label store.
//!
//! [`LabelStore`] is the state label propagation operates on. It is passed
//! by `&mut` into the engine, which writes each node's new label back
//! immediately, so nodes visited later in the same pass see the update.
//! `None` is the explicit "unlabeled" sentinel; it is never replaced by a
//! guessed value.

use std::cmp::Ordering;

use indexmap::IndexSet;

use crate::error::CoreError;
use crate::id::{LabelId, NodeId};

/// Interned label strings. A label's [`LabelId`] is its insertion index.
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    labels: IndexSet<String>,
}

impl LabelSet {
    pub fn new() -> Self {
        LabelSet::default()
    }

    /// Interns `label`, returning the existing ID if it is already known.
    pub fn intern(&mut self, label: &str) -> LabelId {
        if let Some(idx) = self.labels.get_index_of(label) {
            return LabelId(idx as u32);
        }
        let (idx, _) = self.labels.insert_full(label.to_string());
        LabelId(idx as u32)
    }

    /// Looks up an already interned label.
    pub fn get(&self, label: &str) -> Option<LabelId> {
        self.labels.get_index_of(label).map(|idx| LabelId(idx as u32))
    }

    /// Resolves an ID back to its label string.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this set.
    pub fn resolve(&self, id: LabelId) -> &str {
        &self.labels[id.index()]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Per-node label assignment for one propagation run.
#[derive(Debug, Clone)]
pub struct LabelStore {
    labels: LabelSet,
    assigned: Vec<Option<LabelId>>,
}

impl LabelStore {
    /// Creates a store where all `node_count` nodes are unlabeled.
    pub fn unlabeled(node_count: usize) -> Self {
        LabelStore {
            labels: LabelSet::new(),
            assigned: vec![None; node_count],
        }
    }

    /// Sets `node`'s label, interning it.
    pub fn set(&mut self, node: NodeId, label: &str) -> Result<LabelId, CoreError> {
        self.check(node)?;
        let id = self.labels.intern(label);
        self.assigned[node.index()] = Some(id);
        Ok(id)
    }

    /// Assigns an already interned label (or clears it).
    ///
    /// Used by the propagation engine on its hot path; `node` must be in
    /// range and `label` must come from this store.
    #[inline]
    pub fn assign(&mut self, node: NodeId, label: Option<LabelId>) {
        debug_assert!(label.map_or(true, |l| l.index() < self.labels.len()));
        self.assigned[node.index()] = label;
    }

    /// The current label of `node`, if any.
    #[inline]
    pub fn get(&self, node: NodeId) -> Option<LabelId> {
        self.assigned.get(node.index()).copied().flatten()
    }

    /// The current label of `node` as a string, if any.
    pub fn label_of(&self, node: NodeId) -> Option<&str> {
        self.get(node).map(|id| self.labels.resolve(id))
    }

    pub fn resolve(&self, id: LabelId) -> &str {
        self.labels.resolve(id)
    }

    /// Orders two labels by their string value.
    pub fn compare(&self, a: LabelId, b: LabelId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        self.labels.resolve(a).cmp(self.labels.resolve(b))
    }

    /// Number of nodes covered by this store.
    pub fn node_count(&self) -> usize {
        self.assigned.len()
    }

    /// Number of distinct labels ever interned.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of nodes without a label.
    pub fn unlabeled_count(&self) -> usize {
        self.assigned.iter().filter(|l| l.is_none()).count()
    }

    /// Number of distinct labels currently assigned to at least one node.
    pub fn assigned_label_count(&self) -> usize {
        let mut seen = vec![false; self.labels.len()];
        let mut count = 0;
        for label in self.assigned.iter().flatten() {
            if !seen[label.index()] {
                seen[label.index()] = true;
                count += 1;
            }
        }
        count
    }

    /// Member count per label, indexed by [`LabelId`].
    pub fn label_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.labels.len()];
        for label in self.assigned.iter().flatten() {
            sizes[label.index()] += 1;
        }
        sizes
    }

    /// Iterates `(node, label)` in node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Option<LabelId>)> + '_ {
        self.assigned
            .iter()
            .enumerate()
            .map(|(idx, label)| (NodeId(idx as u32), *label))
    }

    fn check(&self, node: NodeId) -> Result<(), CoreError> {
        if node.index() < self.assigned.len() {
            Ok(())
        } else {
            Err(CoreError::NodeOutOfRange {
                node,
                node_count: self.assigned.len(),
            })
        }
    }
}
