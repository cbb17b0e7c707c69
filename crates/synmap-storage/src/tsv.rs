//! Tab-separated node, edge and member-map tables.
//!
//! Node and edge tables are read with whatever column order the upstream
//! step produced. The order is captured in a [`NodeLayout`] / [`EdgeLayout`]
//! and reused when the tables are written back, so downstream consumers see
//! the same shape. Unrecognized columns are carried through untouched.
//! Derived columns (`cluster_id`, `category`, `major_branch` on nodes,
//! `weight` on edges) are overwritten in place or appended.
//!
//! `category_sri` and `category_kg2pre` are accepted as the names of the
//! first and second category source.
//!
//! An empty cell is a null.

use std::io;

use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};

use synmap_core::{EdgeRecord, MatchGraph, MatchNode};

use crate::error::StorageError;

const NODE_TABLE: &str = "node";
const EDGE_TABLE: &str = "edge";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeColumn {
    Id,
    ClusterId,
    CategorySourceA,
    CategorySourceB,
    /// Recomputed from the two category sources on output.
    Category,
    /// Recomputed by branch assignment on output.
    MajorBranch,
    /// Index into `MatchNode::extra`.
    Extra(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeColumn {
    Id,
    Subject,
    Predicate,
    Object,
    /// Recomputed from the predicate on output.
    Weight,
    /// Index into `EdgeRecord::provenance`.
    Provenance(usize),
}

/// Column layout of a node table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLayout {
    header: Vec<String>,
    columns: Vec<NodeColumn>,
}

impl NodeLayout {
    /// Maps a header row onto node fields. `id` is required.
    pub fn from_header(header: &StringRecord) -> Result<Self, StorageError> {
        let mut extra = 0;
        let columns: Vec<NodeColumn> = header
            .iter()
            .map(|name| match name {
                "id" => NodeColumn::Id,
                "cluster_id" => NodeColumn::ClusterId,
                "category_source_a" | "category_sri" => NodeColumn::CategorySourceA,
                "category_source_b" | "category_kg2pre" => NodeColumn::CategorySourceB,
                "category" => NodeColumn::Category,
                "major_branch" => NodeColumn::MajorBranch,
                _ => {
                    extra += 1;
                    NodeColumn::Extra(extra - 1)
                }
            })
            .collect();

        if !columns.contains(&NodeColumn::Id) {
            return Err(StorageError::MissingColumn {
                table: NODE_TABLE,
                column: "id",
            });
        }
        if !columns
            .iter()
            .any(|c| matches!(c, NodeColumn::CategorySourceA | NodeColumn::CategorySourceB))
        {
            tracing::warn!(
                "node table has no category column; every node starts without a branch"
            );
        }

        Ok(NodeLayout {
            header: header.iter().map(str::to_string).collect(),
            columns,
        })
    }

    /// Column names as written: the input order, followed by `cluster_id`,
    /// `category` and `major_branch` for whichever of them the input lacked.
    pub fn output_header(&self) -> Vec<&str> {
        self.output_columns().into_iter().map(|(name, _)| name).collect()
    }

    fn output_columns(&self) -> Vec<(&str, NodeColumn)> {
        let mut columns: Vec<(&str, NodeColumn)> = self
            .header
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().copied())
            .collect();
        for (name, column) in [
            ("cluster_id", NodeColumn::ClusterId),
            ("category", NodeColumn::Category),
            ("major_branch", NodeColumn::MajorBranch),
        ] {
            if !self.columns.contains(&column) {
                columns.push((name, column));
            }
        }
        columns
    }

    fn parse_row(&self, record: &StringRecord) -> Result<(String, MatchNode), StorageError> {
        let mut id = None;
        let mut node = MatchNode::new();
        for (column, value) in self.columns.iter().zip(record.iter()) {
            match column {
                NodeColumn::Id => id = cell(value),
                NodeColumn::ClusterId => node.cluster_id = cell(value),
                NodeColumn::CategorySourceA => node.category_source_a = cell(value),
                NodeColumn::CategorySourceB => node.category_source_b = cell(value),
                NodeColumn::Category | NodeColumn::MajorBranch => {}
                NodeColumn::Extra(_) => node.extra.push(value.to_string()),
            }
        }
        let id = id.ok_or_else(|| StorageError::MissingValue {
            table: NODE_TABLE,
            line: line_of(record),
            column: "id",
        })?;
        Ok((id, node))
    }
}

/// Column layout of an edge table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLayout {
    header: Vec<String>,
    columns: Vec<EdgeColumn>,
}

impl EdgeLayout {
    /// Maps a header row onto edge fields. `id`, `subject`, `predicate` and
    /// `object` are required; everything else is provenance.
    pub fn from_header(header: &StringRecord) -> Result<Self, StorageError> {
        let mut provenance = 0;
        let columns: Vec<EdgeColumn> = header
            .iter()
            .map(|name| match name {
                "id" => EdgeColumn::Id,
                "subject" => EdgeColumn::Subject,
                "predicate" => EdgeColumn::Predicate,
                "object" => EdgeColumn::Object,
                "weight" => EdgeColumn::Weight,
                _ => {
                    provenance += 1;
                    EdgeColumn::Provenance(provenance - 1)
                }
            })
            .collect();

        for (column, name) in [
            (EdgeColumn::Id, "id"),
            (EdgeColumn::Subject, "subject"),
            (EdgeColumn::Predicate, "predicate"),
            (EdgeColumn::Object, "object"),
        ] {
            if !columns.contains(&column) {
                return Err(StorageError::MissingColumn {
                    table: EDGE_TABLE,
                    column: name,
                });
            }
        }

        Ok(EdgeLayout {
            header: header.iter().map(str::to_string).collect(),
            columns,
        })
    }

    /// Column names as written: the input order, followed by `weight` if
    /// the input lacked it.
    pub fn output_header(&self) -> Vec<&str> {
        self.output_columns().into_iter().map(|(name, _)| name).collect()
    }

    fn output_columns(&self) -> Vec<(&str, EdgeColumn)> {
        let mut columns: Vec<(&str, EdgeColumn)> = self
            .header
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().copied())
            .collect();
        if !self.columns.contains(&EdgeColumn::Weight) {
            columns.push(("weight", EdgeColumn::Weight));
        }
        columns
    }

    fn parse_row(&self, record: &StringRecord) -> Result<EdgeRecord, StorageError> {
        let mut edge = EdgeRecord::new("", "", "", "");
        for (column, value) in self.columns.iter().zip(record.iter()) {
            match column {
                EdgeColumn::Id => edge.id = value.to_string(),
                EdgeColumn::Subject => edge.subject = value.to_string(),
                EdgeColumn::Predicate => edge.predicate = value.to_string(),
                EdgeColumn::Object => edge.object = value.to_string(),
                EdgeColumn::Weight => {}
                EdgeColumn::Provenance(_) => edge.provenance.push(value.to_string()),
            }
        }
        for (value, column) in [
            (&edge.id, "id"),
            (&edge.subject, "subject"),
            (&edge.predicate, "predicate"),
            (&edge.object, "object"),
        ] {
            if value.is_empty() {
                return Err(StorageError::MissingValue {
                    table: EDGE_TABLE,
                    line: line_of(record),
                    column,
                });
            }
        }
        Ok(edge)
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Reads a node table.
pub fn read_nodes<R: io::Read>(reader: R) -> Result<(NodeLayout, Vec<(String, MatchNode)>), StorageError> {
    let mut reader = tsv_reader(reader);
    let layout = NodeLayout::from_header(reader.headers()?)?;

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        rows.push(layout.parse_row(&record)?);
    }
    Ok((layout, rows))
}

/// Reads an edge table.
pub fn read_edges<R: io::Read>(reader: R) -> Result<(EdgeLayout, Vec<EdgeRecord>), StorageError> {
    let mut reader = tsv_reader(reader);
    let layout = EdgeLayout::from_header(reader.headers()?)?;

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        rows.push(layout.parse_row(&record)?);
    }
    Ok((layout, rows))
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Writes every node of `graph` in `layout`'s output column order.
pub fn write_nodes<W: io::Write>(
    writer: W,
    layout: &NodeLayout,
    graph: &MatchGraph,
) -> Result<(), StorageError> {
    let columns = layout.output_columns();
    let mut writer = tsv_writer(writer);
    writer.write_record(columns.iter().map(|(name, _)| *name))?;

    for (_, key, node) in graph.nodes() {
        writer.write_record(columns.iter().map(|&(_, column)| node_value(column, key, node)))?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes the edges of `graph` in `layout`'s output column order, with each
/// edge's predicate weight in the `weight` column.
pub fn write_edges<W: io::Write>(
    writer: W,
    layout: &EdgeLayout,
    graph: &MatchGraph,
) -> Result<(), StorageError> {
    let columns = layout.output_columns();
    let mut writer = tsv_writer(writer);
    writer.write_record(columns.iter().map(|(name, _)| *name))?;

    for edge in graph.edges() {
        let subject = graph.node_key(edge.subject).unwrap_or_default();
        let object = graph.node_key(edge.object).unwrap_or_default();
        let weight = edge.weight().map(|w| w.to_string()).unwrap_or_default();
        writer.write_record(columns.iter().map(|&(_, column)| match column {
            EdgeColumn::Id => edge.id.as_str(),
            EdgeColumn::Subject => subject,
            EdgeColumn::Predicate => edge.predicate.as_str(),
            EdgeColumn::Object => object,
            EdgeColumn::Weight => weight.as_str(),
            EdgeColumn::Provenance(i) => edge.provenance.get(i).map_or("", String::as_str),
        }))?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes the two-column `member_id`/`cluster_id` table, one row per node.
pub fn write_member_map<W: io::Write>(writer: W, graph: &MatchGraph) -> Result<(), StorageError> {
    let mut writer = tsv_writer(writer);
    writer.write_record(["member_id", "cluster_id"])?;
    for (_, key, node) in graph.nodes() {
        writer.write_record([key, node.cluster_id.as_deref().unwrap_or_default()])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn node_value<'a>(column: NodeColumn, key: &'a str, node: &'a MatchNode) -> &'a str {
    match column {
        NodeColumn::Id => key,
        NodeColumn::ClusterId => node.cluster_id.as_deref().unwrap_or_default(),
        NodeColumn::CategorySourceA => node.category_source_a.as_deref().unwrap_or_default(),
        NodeColumn::CategorySourceB => node.category_source_b.as_deref().unwrap_or_default(),
        NodeColumn::Category => node.category().unwrap_or_default(),
        NodeColumn::MajorBranch => node.major_branch.as_deref().unwrap_or_default(),
        NodeColumn::Extra(i) => node.extra.get(i).map_or("", String::as_str),
    }
}

fn tsv_reader<R: io::Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new().delimiter(b'\t').from_reader(reader)
}

fn tsv_writer<W: io::Write>(writer: W) -> Writer<W> {
    WriterBuilder::new().delimiter(b'\t').from_writer(writer)
}

fn cell(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |pos| pos.line())
}

#[cfg(test)]
mod tests {
    use super::*;
    use synmap_core::ReferenceMode;

    const NODES: &str = "\
id\tname\tcluster_id\tcategory_source_a\tcategory_source_b
CHEBI:15365\taspirin\t\tbiolink:SmallMolecule\t
DRUGBANK:DB00945\tAcetylsalicylic acid\t\t\tbiolink:Drug
MONDO:0005148\ttype 2 diabetes\tMONDO:0005148\tbiolink:Disease\tbiolink:Disease
";

    const EDGES: &str = "\
subject\tpredicate\tobject\tid\tprimary_knowledge_source
CHEBI:15365\tbiolink:same_as\tDRUGBANK:DB00945\te1\tinfores:sri-node-normalizer
MONDO:0005148\tbiolink:close_match\tCHEBI:15365\te2\tinfores:ontobio
";

    fn load() -> (NodeLayout, EdgeLayout, MatchGraph) {
        let (node_layout, nodes) = read_nodes(NODES.as_bytes()).unwrap();
        let (edge_layout, edges) = read_edges(EDGES.as_bytes()).unwrap();
        let (graph, _) = MatchGraph::from_records(nodes, edges, ReferenceMode::Strict).unwrap();
        (node_layout, edge_layout, graph)
    }

    fn written<F>(write: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<(), StorageError>,
    {
        let mut out = Vec::new();
        write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn empty_cells_read_as_null() {
        let (_, rows) = read_nodes(NODES.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);

        let (id, aspirin) = &rows[0];
        assert_eq!(id, "CHEBI:15365");
        assert_eq!(aspirin.cluster_id, None);
        assert_eq!(aspirin.category_source_b, None);
        assert_eq!(aspirin.extra, vec!["aspirin".to_string()]);

        let (_, drug) = &rows[1];
        assert_eq!(drug.category(), Some("biolink:Drug"));
    }

    #[test]
    fn node_output_appends_derived_columns() {
        let (layout, _, mut graph) = load();
        let aspirin = graph.node_id("CHEBI:15365").unwrap();
        let node = graph.node_mut(aspirin).unwrap();
        node.cluster_id = Some("CHEBI:15365".into());
        node.major_branch = Some("biolink:ChemicalEntity".into());

        assert_eq!(
            layout.output_header(),
            vec![
                "id",
                "name",
                "cluster_id",
                "category_source_a",
                "category_source_b",
                "category",
                "major_branch"
            ]
        );

        let out = written(|w| write_nodes(w, &layout, &graph));
        let first_row = out.lines().nth(1).unwrap();
        assert_eq!(
            first_row,
            "CHEBI:15365\taspirin\tCHEBI:15365\tbiolink:SmallMolecule\t\tbiolink:SmallMolecule\tbiolink:ChemicalEntity"
        );
    }

    #[test]
    fn existing_derived_columns_are_overwritten_in_place() {
        let input = "id\tmajor_branch\tcategory_source_a\nA\tstale\tbiolink:Gene\n";
        let (layout, rows) = read_nodes(input.as_bytes()).unwrap();
        let (mut graph, _) =
            MatchGraph::from_records(rows, Vec::new(), ReferenceMode::Strict).unwrap();
        let node = graph.node_mut(synmap_core::NodeId(0)).unwrap();
        node.major_branch = Some("biolink:GeneticOrMolecularBiologicalEntity".into());
        node.cluster_id = Some("A".into());

        let out = written(|w| write_nodes(w, &layout, &graph));
        assert_eq!(
            out,
            "id\tmajor_branch\tcategory_source_a\tcluster_id\tcategory\n\
             A\tbiolink:GeneticOrMolecularBiologicalEntity\tbiolink:Gene\tA\tbiolink:Gene\n"
        );
    }

    #[test]
    fn edges_keep_input_column_order_and_gain_a_weight() {
        let (_, layout, graph) = load();
        let out = written(|w| write_edges(w, &layout, &graph));
        assert_eq!(
            out,
            "subject\tpredicate\tobject\tid\tprimary_knowledge_source\tweight\n\
             CHEBI:15365\tbiolink:same_as\tDRUGBANK:DB00945\te1\tinfores:sri-node-normalizer\t1.0\n\
             MONDO:0005148\tbiolink:close_match\tCHEBI:15365\te2\tinfores:ontobio\t0.5\n"
        );
    }

    #[test]
    fn existing_weight_column_is_recomputed_in_place() {
        let input = "id\tweight\tsubject\tpredicate\tobject\n\
                     e1\t9.9\tA\tbiolink:has_name_similarity\tB\n";
        let (layout, edges) = read_edges(input.as_bytes()).unwrap();
        assert!(edges[0].provenance.is_empty());
        let nodes = vec![
            ("A".to_string(), MatchNode::new()),
            ("B".to_string(), MatchNode::new()),
        ];
        let (graph, _) = MatchGraph::from_records(nodes, edges, ReferenceMode::Strict).unwrap();

        assert_eq!(
            layout.output_header(),
            vec!["id", "weight", "subject", "predicate", "object"]
        );
        let out = written(|w| write_edges(w, &layout, &graph));
        assert_eq!(
            out.lines().nth(1),
            Some("e1\t0.2\tA\tbiolink:has_name_similarity\tB")
        );
    }

    #[test]
    fn source_specific_category_headers_are_recognized() {
        let input = "id\tcategory_kg2pre\tcategory_sri\n\
                     A\tbiolink:Protein\tbiolink:Gene\n\
                     B\tbiolink:Drug\t\n";
        let (layout, rows) = read_nodes(input.as_bytes()).unwrap();

        let (_, a) = &rows[0];
        assert_eq!(a.category_source_a.as_deref(), Some("biolink:Gene"));
        assert_eq!(a.category_source_b.as_deref(), Some("biolink:Protein"));
        assert_eq!(a.category(), Some("biolink:Gene"));
        assert!(a.extra.is_empty());
        assert_eq!(rows[1].1.category(), Some("biolink:Drug"));

        assert_eq!(
            layout.output_header(),
            vec![
                "id",
                "category_kg2pre",
                "category_sri",
                "cluster_id",
                "category",
                "major_branch"
            ]
        );
    }

    #[test]
    fn member_map_lists_every_node() {
        let (_, _, mut graph) = load();
        let ids: Vec<_> = graph.nodes().map(|(id, _, _)| id).collect();
        for id in ids {
            graph.node_mut(id).unwrap().cluster_id = Some("CHEBI:15365".into());
        }

        let out = written(|w| write_member_map(w, &graph));
        insta::assert_snapshot!(out, @r"
member_id	cluster_id
CHEBI:15365	CHEBI:15365
DRUGBANK:DB00945	CHEBI:15365
MONDO:0005148	CHEBI:15365
");
    }

    #[test]
    fn missing_required_edge_column_is_reported() {
        let input = "id\tsubject\tobject\ne1\tA\tB\n";
        match read_edges(input.as_bytes()) {
            Err(StorageError::MissingColumn { table, column }) => {
                assert_eq!(table, "edge");
                assert_eq!(column, "predicate");
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn empty_node_id_names_the_line() {
        let input = "id\tcluster_id\nA\t\n\tX\n";
        match read_nodes(input.as_bytes()) {
            Err(StorageError::MissingValue { table, line, column }) => {
                assert_eq!(table, "node");
                assert_eq!(line, 3);
                assert_eq!(column, "id");
            }
            other => panic!("expected MissingValue, got {other:?}"),
        }
    }

    #[test]
    fn ragged_row_is_a_table_error() {
        let input = "id\tcluster_id\nA\tB\tC\n";
        assert!(matches!(read_nodes(input.as_bytes()), Err(StorageError::Csv(_))));
    }
}
