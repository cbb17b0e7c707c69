//! Label propagation and the clustering pipeline built on it.
//!
//! [`engine`] holds the generic propagation algorithm. [`major_branch`],
//! [`filter`] and [`cluster`] are the three pipeline stages, and
//! [`pipeline`] chains them.

pub mod cluster;
pub mod engine;
pub mod filter;
pub mod major_branch;
pub mod pipeline;

pub use cluster::{cluster_match_graph, ClusterReport};
pub use engine::{
    propagate, PropagationConfig, PropagationOutcome, PropagationReport, TieBreak,
    DEFAULT_MAX_ITERATIONS,
};
pub use filter::{remove_conflicting_edges, shares_branch, FilterReport};
pub use major_branch::{assign_major_branches, BranchReport};
pub use pipeline::{run_pipeline, PipelineConfig, PipelineReport};
