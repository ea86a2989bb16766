//! Core data structures for the family graph

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, stable identifier for a person node.
///
/// The engine never inspects the contents; it only relies on uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(raw: impl Into<String>) -> Self {
        NodeId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(raw: &str) -> Self {
        NodeId(raw.to_string())
    }
}

/// Structural category of a person in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The single ancestor with no parent.
    Root,
    /// A partner attached to a root or child; bears children.
    Spouse,
    /// A descendant attached to a spouse.
    Child,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Spouse => "spouse",
            NodeKind::Child => "child",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "root" => Some(NodeKind::Root),
            "spouse" => Some(NodeKind::Spouse),
            "child" => Some(NodeKind::Child),
            _ => None,
        }
    }

    /// Whether a node of this kind may take a spouse.
    pub fn can_marry(&self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Child)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-left corner of a node box, in drawing units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A single person in the family graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// `None` when the gender is unknown (e.g. imported from an empty cell).
    pub gender: Option<Gender>,
    pub name: String,
    pub image_reference: String,
    /// Owning node: the bearing spouse for a child, the partner for a spouse.
    pub parent_id: Option<NodeId>,
    /// Owned children first, then any ids inherited through a reconnect.
    pub child_ids: Vec<NodeId>,
    /// 1-based rank among siblings. Only set on connected children.
    pub child_order: Option<u32>,
    /// 1-based rank among co-spouses. Only set on connected spouses.
    pub spouse_order: Option<u32>,
    /// Derived by the layout engine; never part of relationship logic.
    #[serde(default)]
    pub position: Position,
}

impl PersonNode {
    /// Create a detached node with no relationships.
    pub fn new(id: NodeId, kind: NodeKind, gender: Option<Gender>, name: impl Into<String>) -> Self {
        PersonNode {
            id,
            kind,
            gender,
            name: name.into(),
            image_reference: String::new(),
            parent_id: None,
            child_ids: Vec::new(),
            child_order: None,
            spouse_order: None,
            position: Position::default(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Root
    }

    pub fn is_orphan(&self) -> bool {
        self.kind != NodeKind::Root && self.parent_id.is_none()
    }

    /// Equality over the fields governed by the graph invariants
    /// (position and display attributes excluded).
    pub fn same_structure(&self, other: &PersonNode) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && self.gender == other.gender
            && self.parent_id == other.parent_id
            && self.child_ids == other.child_ids
            && self.child_order == other.child_order
            && self.spouse_order == other.spouse_order
    }
}

/// A drawable connection, always derived from a node's `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Edge { source, target }
    }

    /// Whether this edge connects `a` and `b` in either direction.
    pub fn connects(&self, a: &NodeId, b: &NodeId) -> bool {
        (&self.source == a && &self.target == b) || (&self.source == b && &self.target == a)
    }
}

/// Partial update of a node's attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeUpdate {
    pub name: Option<String>,
    pub image_reference: Option<String>,
    pub child_order: Option<u32>,
    pub spouse_order: Option<u32>,
}

impl AttributeUpdate {
    pub fn touches_order(&self) -> bool {
        self.child_order.is_some() || self.spouse_order.is_some()
    }
}
