//! Tree file codec: flat CSV rows with an integrity checksum
//!
//! Layout of a tree file:
//!
//! ```text
//! # <warning comment, tree name, timestamp>
//! id,name,imageReference,gender,kind,childOrder,parentId,spouseOrder,childIds,checksum
//! <one row per person>
//! ```
//!
//! The checksum covers the JSON encoding of every row minus the checksum
//! column, so any edit to a data cell is detected on import. Positions are
//! not stored; layout recomputes them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};
use crate::graph::project_edges;
use crate::model::*;

/// Separator between ids inside the `childIds` cell.
pub const CHILD_ID_DELIMITER: &str = ";";

/// Prefix of comment lines; skipped on import.
pub const COMMENT_PREFIX: u8 = b'#';

/// One exported row, every cell kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeRow {
    pub id: String,
    pub name: String,
    pub image_reference: String,
    pub gender: String,
    pub kind: String,
    pub child_order: String,
    pub parent_id: String,
    pub spouse_order: String,
    pub child_ids: String,
}

/// A row as it appears in the file, checksum included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeRecord {
    pub id: String,
    pub name: String,
    pub image_reference: String,
    pub gender: String,
    pub kind: String,
    pub child_order: String,
    pub parent_id: String,
    pub spouse_order: String,
    pub child_ids: String,
    pub checksum: String,
}

impl TreeRecord {
    pub fn new(row: TreeRow, checksum: String) -> Self {
        TreeRecord {
            id: row.id,
            name: row.name,
            image_reference: row.image_reference,
            gender: row.gender,
            kind: row.kind,
            child_order: row.child_order,
            parent_id: row.parent_id,
            spouse_order: row.spouse_order,
            child_ids: row.child_ids,
            checksum,
        }
    }

    /// Strip the checksum column.
    pub fn into_row(self) -> TreeRow {
        TreeRow {
            id: self.id,
            name: self.name,
            image_reference: self.image_reference,
            gender: self.gender,
            kind: self.kind,
            child_order: self.child_order,
            parent_id: self.parent_id,
            spouse_order: self.spouse_order,
            child_ids: self.child_ids,
        }
    }
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedTree {
    pub nodes: Vec<PersonNode>,
    pub edges: Vec<Edge>,
}

impl TreeRow {
    pub fn from_node(node: &PersonNode) -> Self {
        TreeRow {
            id: node.id.to_string(),
            name: node.name.clone(),
            image_reference: node.image_reference.clone(),
            gender: node.gender.map(|g| g.as_str().to_string()).unwrap_or_default(),
            kind: node.kind.as_str().to_string(),
            child_order: node.child_order.map(|o| o.to_string()).unwrap_or_default(),
            parent_id: node.parent_id.as_ref().map(|p| p.to_string()).unwrap_or_default(),
            spouse_order: node.spouse_order.map(|o| o.to_string()).unwrap_or_default(),
            child_ids: node
                .child_ids
                .iter()
                .map(NodeId::as_str)
                .collect::<Vec<_>>()
                .join(CHILD_ID_DELIMITER),
        }
    }

    /// Rebuild a node. Empty optional cells become `None`/empty.
    pub fn to_node(&self, line: usize) -> Result<PersonNode> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(TreeError::parse(format!("row {line}: empty id")));
        }
        let kind = NodeKind::parse(&self.kind)
            .ok_or_else(|| TreeError::parse(format!("row {line}: unknown kind {:?}", self.kind)))?;
        let gender = match self.gender.trim() {
            "" => None,
            raw => Some(
                Gender::parse(raw)
                    .ok_or_else(|| TreeError::parse(format!("row {line}: unknown gender {raw:?}")))?,
            ),
        };

        let mut node = PersonNode::new(NodeId::new(id), kind, gender, self.name.clone());
        node.image_reference = self.image_reference.clone();
        node.parent_id = optional_id(&self.parent_id);
        node.child_ids = self
            .child_ids
            .split(CHILD_ID_DELIMITER)
            .filter_map(optional_id)
            .collect();
        node.child_order = parse_order(&self.child_order, "childOrder", line)?;
        node.spouse_order = parse_order(&self.spouse_order, "spouseOrder", line)?;
        Ok(node)
    }
}

fn optional_id(raw: &str) -> Option<NodeId> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| NodeId::new(raw))
}

fn parse_order(raw: &str, column: &str, line: usize) -> Result<Option<u32>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| TreeError::parse(format!("row {line}: {column} {raw:?} is not a number")))
}

/// 32-bit polynomial rolling hash, rendered as 8 hex digits. Not
/// cryptographic; it only has to catch accidental or manual edits.
pub fn rolling_hash(input: &str) -> String {
    let hash = input
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
    format!("{hash:08x}")
}

/// Checksum over the JSON encoding of the rows, in order.
pub fn compute_checksum(rows: &[TreeRow]) -> Result<String> {
    let encoded = serde_json::to_string(rows)
        .map_err(|e| TreeError::parse(format!("cannot encode rows: {e}")))?;
    Ok(rolling_hash(&encoded))
}

/// Flatten nodes into rows, each carrying the checksum of the whole set.
pub fn export_rows(nodes: &[PersonNode]) -> Result<Vec<TreeRecord>> {
    let rows: Vec<TreeRow> = nodes.iter().map(TreeRow::from_node).collect();
    let checksum = compute_checksum(&rows)?;
    Ok(rows
        .into_iter()
        .map(|row| TreeRecord::new(row, checksum.clone()))
        .collect())
}

/// Verify the checksum and rebuild nodes and edges.
///
/// Edges come from `parent_id` only; links to ids that are not in the file
/// produce no edge and no error.
pub fn import_rows(records: Vec<TreeRecord>) -> Result<ImportedTree> {
    let Some(expected) = records.first().map(|r| r.checksum.trim().to_string()) else {
        return Err(TreeError::parse("the file contains no people"));
    };

    let rows: Vec<TreeRow> = records.into_iter().map(TreeRecord::into_row).collect();
    let actual = compute_checksum(&rows)?;
    if actual != expected {
        tracing::warn!("Tree file checksum mismatch: expected {}, computed {}", expected, actual);
        return Err(TreeError::ImportChecksumMismatch { expected, actual });
    }

    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let node = row.to_node(i + 1)?;
        if !seen.insert(node.id.clone()) {
            return Err(TreeError::parse(format!("row {}: duplicate id {}", i + 1, node.id)));
        }
        nodes.push(node);
    }

    let roots = nodes.iter().filter(|n| n.is_root()).count();
    if roots != 1 {
        return Err(TreeError::parse(format!("expected exactly one root, found {roots}")));
    }

    let edges = project_edges(&nodes);
    tracing::info!("Imported {} people, {} relationships", nodes.len(), edges.len());
    Ok(ImportedTree { nodes, edges })
}

/// Render the full file text.
pub fn write_tree(tree_name: &str, nodes: &[PersonNode]) -> Result<String> {
    let records = export_rows(nodes)?;

    let mut out = Vec::new();
    let comment = format!(
        "{} {} exported {}. Machine-generated: do not edit by hand, the checksum column will reject modified files.\n",
        COMMENT_PREFIX as char,
        tree_name.replace(['\r', '\n'], " "),
        chrono::Utc::now().to_rfc3339(),
    );
    out.extend_from_slice(comment.as_bytes());

    {
        let mut writer = csv::Writer::from_writer(&mut out);
        if records.is_empty() {
            writer
                .write_record(HEADER)
                .map_err(|e| TreeError::parse(format!("cannot write header: {e}")))?;
        }
        for record in &records {
            writer
                .serialize(record)
                .map_err(|e| TreeError::parse(format!("cannot write row: {e}")))?;
        }
        writer
            .flush()
            .map_err(|e| TreeError::parse(format!("cannot write rows: {e}")))?;
    }

    String::from_utf8(out).map_err(|e| TreeError::parse(format!("exported text is not UTF-8: {e}")))
}

/// Tree name recorded in the leading comment line, if any.
pub fn tree_name(text: &str) -> Option<String> {
    let comment = text.lines().next()?.strip_prefix(COMMENT_PREFIX as char)?;
    let (name, _) = comment.rsplit_once(" exported ")?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Column names, in file order.
pub const HEADER: [&str; 10] = [
    "id",
    "name",
    "imageReference",
    "gender",
    "kind",
    "childOrder",
    "parentId",
    "spouseOrder",
    "childIds",
    "checksum",
];

/// Parse file text into records without validating the checksum.
///
/// A row whose cell count differs from the header's can only come from an
/// edit after export (a stray `,` or line break inside a cell), so it is
/// reported as a checksum mismatch rather than a parse error.
pub fn parse_records(text: &str) -> Result<Vec<TreeRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(COMMENT_PREFIX))
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| TreeError::parse(format!("cannot read header: {e}")))?
        .clone();
    let missing: Vec<&str> = HEADER
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h.trim() == *column))
        .collect();
    if !missing.is_empty() {
        return Err(TreeError::parse(format!("missing columns: {}", missing.join(", "))));
    }

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let raw = result.map_err(|e| TreeError::parse(format!("row {}: {e}", i + 1)))?;
        if raw.len() != headers.len() {
            tracing::warn!("Tree file row {} has {} cells, header has {}", i + 1, raw.len(), headers.len());
            return Err(TreeError::ImportChecksumMismatch {
                expected: format!("{} cells per row", headers.len()),
                actual: format!("{} cells in row {}", raw.len(), i + 1),
            });
        }
        let record: TreeRecord = raw
            .deserialize(Some(&headers))
            .map_err(|e| TreeError::parse(format!("row {}: {e}", i + 1)))?;
        records.push(record);
    }
    Ok(records)
}

/// Parse, verify and rebuild a tree from file text.
pub fn read_tree(text: &str) -> Result<ImportedTree> {
    import_rows(parse_records(text)?)
}
