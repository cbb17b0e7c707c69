//! Run-directory layout: which tables are read and written, and where.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use synmap_core::{LoadReport, MatchGraph, ReferenceMode};

use crate::error::StorageError;
use crate::tsv::{self, EdgeLayout, NodeLayout};

/// Input node table.
pub const NODES_INPUT: &str = "3_merged_match_nodes.tsv";
/// Input edge table.
pub const EDGES_INPUT: &str = "3_merged_match_edges.tsv";
/// Annotated node table.
pub const NODES_OUTPUT: &str = "4_match_nodes_preprocessed.tsv";
/// Conflict-filtered edge table.
pub const EDGES_OUTPUT: &str = "4_match_edges_preprocessed.tsv";
/// `member_id` → `cluster_id` table.
pub const MEMBER_MAP_OUTPUT: &str = "4_cluster_member_map.tsv";

/// A loaded match graph together with the column layouts it was read with.
#[derive(Debug, Clone)]
pub struct MatchTables {
    pub graph: MatchGraph,
    pub node_layout: NodeLayout,
    pub edge_layout: EdgeLayout,
    pub report: LoadReport,
}

/// Paths of the tables written by [`write_match_tables`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub nodes: PathBuf,
    pub edges: PathBuf,
    pub member_map: PathBuf,
}

/// Reads the node and edge tables from `input_dir` and builds the graph.
pub fn load_match_tables(input_dir: &Path, mode: ReferenceMode) -> Result<MatchTables, StorageError> {
    let nodes_path = input_dir.join(NODES_INPUT);
    let edges_path = input_dir.join(EDGES_INPUT);

    let (node_layout, nodes) = tsv::read_nodes(open(&nodes_path)?)?;
    tracing::info!(path = %nodes_path.display(), rows = nodes.len(), "read node table");

    let (edge_layout, edges) = tsv::read_edges(open(&edges_path)?)?;
    tracing::info!(path = %edges_path.display(), rows = edges.len(), "read edge table");

    let (graph, report) = MatchGraph::from_records(nodes, edges, mode)?;

    Ok(MatchTables {
        graph,
        node_layout,
        edge_layout,
        report,
    })
}

/// Writes the annotated nodes, filtered edges and member map into
/// `output_dir`, creating it if needed.
pub fn write_match_tables(output_dir: &Path, tables: &MatchTables) -> Result<OutputPaths, StorageError> {
    fs::create_dir_all(output_dir).map_err(|e| StorageError::io(output_dir, e))?;

    let paths = OutputPaths {
        nodes: output_dir.join(NODES_OUTPUT),
        edges: output_dir.join(EDGES_OUTPUT),
        member_map: output_dir.join(MEMBER_MAP_OUTPUT),
    };

    tsv::write_nodes(create(&paths.nodes)?, &tables.node_layout, &tables.graph)?;
    tsv::write_edges(create(&paths.edges)?, &tables.edge_layout, &tables.graph)?;
    tsv::write_member_map(create(&paths.member_map)?, &tables.graph)?;

    tracing::info!(
        dir = %output_dir.display(),
        nodes = tables.graph.node_count(),
        edges = tables.graph.edge_count(),
        "wrote clustering outputs"
    );
    Ok(paths)
}

fn open(path: &Path) -> Result<File, StorageError> {
    File::open(path).map_err(|e| StorageError::io(path, e))
}

fn create(path: &Path) -> Result<File, StorageError> {
    File::create(path).map_err(|e| StorageError::io(path, e))
}
