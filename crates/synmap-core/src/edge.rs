//! Match edges, their predicate vocabulary and weights.
//!
//! A match edge suggests that two identifiers denote the same entity. Edges
//! are directed in the source table but semantically undirected: the
//! adjacency builder folds `(A, B)` and `(B, A)` into one weighted pair.
//!
//! Weights are stored as fixed-point tenths ([`Weight`]) rather than `f64`.
//! Every predicate weight is a multiple of 0.1, so sums stay exact and two
//! candidate labels with the same support always compare equal regardless
//! of summation order.

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::CoreError;
use crate::id::NodeId;

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// The fixed match-predicate vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    /// Identifiers are asserted to be the same entity (weight 1.0).
    ExactMatch,
    /// Identifiers are closely related mappings (weight 0.5).
    CloseMatch,
    /// Identifiers share a similar name (weight 0.2).
    NameSimilarity,
}

impl Predicate {
    /// Parses a raw predicate string.
    ///
    /// Accepts the curie form with or without the `biolink:` prefix and the
    /// legacy synonyms used by upstream match-edge producers. Returns `None`
    /// for anything outside the vocabulary.
    pub fn parse(raw: &str) -> Option<Predicate> {
        let name = raw.trim();
        let name = name.strip_prefix("biolink:").unwrap_or(name);
        match name {
            "exact_match" | "same_as" => Some(Predicate::ExactMatch),
            "close_match" => Some(Predicate::CloseMatch),
            "name_similarity" | "has_name_similarity" => Some(Predicate::NameSimilarity),
            _ => None,
        }
    }

    /// The fixed weight this predicate contributes to an adjacency pair.
    pub fn weight(self) -> Weight {
        match self {
            Predicate::ExactMatch => Weight::from_tenths(10),
            Predicate::CloseMatch => Weight::from_tenths(5),
            Predicate::NameSimilarity => Weight::from_tenths(2),
        }
    }

    /// Canonical snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Predicate::ExactMatch => "exact_match",
            Predicate::CloseMatch => "close_match",
            Predicate::NameSimilarity => "name_similarity",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// An edge weight in exact tenths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Weight(u32);

impl Weight {
    pub const ZERO: Weight = Weight(0);

    pub const fn from_tenths(tenths: u32) -> Self {
        Weight(tenths)
    }

    pub const fn tenths(self) -> u32 {
        self.0
    }

    /// The weight as a floating point value (1.0 for an exact match).
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

impl Add for Weight {
    type Output = Weight;

    fn add(self, rhs: Weight) -> Weight {
        Weight(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Weight {
    fn add_assign(&mut self, rhs: Weight) {
        *self = *self + rhs;
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

// ---------------------------------------------------------------------------
// Edge records
// ---------------------------------------------------------------------------

/// An edge row as read from the edge table, endpoints still unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: String,
    pub subject: String,
    pub predicate: String,
    pub object: String,
    /// Provenance columns, passed through unchanged in table order.
    pub provenance: SmallVec<[String; 2]>,
}

impl EdgeRecord {
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        EdgeRecord {
            id: id.into(),
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            provenance: SmallVec::new(),
        }
    }

    /// Attaches pass-through provenance values.
    pub fn with_provenance<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provenance = values.into_iter().map(Into::into).collect();
        self
    }
}

/// An edge whose endpoints have been resolved against the node table.
///
/// The raw predicate string is kept so the edge table can be re-serialized
/// exactly as it was read; it is parsed when the adjacency is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEdge {
    pub id: String,
    pub subject: NodeId,
    pub predicate: String,
    pub object: NodeId,
    pub provenance: SmallVec<[String; 2]>,
}

impl MatchEdge {
    /// Looks up this edge's weight from its predicate.
    pub fn weight(&self) -> Result<Weight, CoreError> {
        Predicate::parse(&self.predicate)
            .map(Predicate::weight)
            .ok_or_else(|| CoreError::UnknownPredicate {
                edge: self.id.clone(),
                predicate: self.predicate.clone(),
            })
    }

    /// Returns `true` if subject and object are the same node.
    pub fn is_self_loop(&self) -> bool {
        self.subject == self.object
    }

    /// The endpoints as an unordered pair, smaller node index first.
    pub fn canonical_pair(&self) -> (NodeId, NodeId) {
        if self.subject <= self.object {
            (self.subject, self.object)
        } else {
            (self.object, self.subject)
        }
    }
}
