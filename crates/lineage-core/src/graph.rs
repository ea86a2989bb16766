//! Graph store: the canonical node set with edges derived on demand

use std::collections::{HashMap, HashSet};

use crate::model::*;

/// The family graph. Nodes keep insertion order so that export and layout
/// are reproducible; edges are a projection of `parent_id` and are never stored.
#[derive(Clone, Default, PartialEq)]
pub struct Graph {
    nodes: Vec<PersonNode>,
    index: HashMap<NodeId, usize>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("node_count", &self.nodes.len())
            .field("edge_count", &self.edges().len())
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    /// Build a graph from a full node vector.
    pub fn from_nodes(nodes: Vec<PersonNode>) -> Self {
        let mut graph = Graph::new();
        graph.replace(nodes);
        graph
    }

    /// Atomically swap in a complete next state.
    pub fn replace(&mut self, nodes: Vec<PersonNode>) {
        self.index = nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| (node.id.clone(), slot))
            .collect();
        self.nodes = nodes;
    }

    /// Get a node by ID.
    pub fn node(&self, id: &NodeId) -> Option<&PersonNode> {
        self.index.get(id).map(|&slot| &self.nodes[slot])
    }

    /// Slot of a node in insertion order.
    pub fn position_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[PersonNode] {
        &self.nodes
    }

    /// Clone of the node vector, the starting point for every mutation.
    pub fn snapshot(&self) -> Vec<PersonNode> {
        self.nodes.clone()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Edges derived from `parent_id`, in node order.
    pub fn edges(&self) -> Vec<Edge> {
        project_edges(&self.nodes)
    }

    /// Check if an edge exists between two nodes, in either direction.
    pub fn has_edge_between(&self, a: &NodeId, b: &NodeId) -> bool {
        let points_to = |from: &NodeId, to: &NodeId| {
            self.node(from)
                .is_some_and(|n| n.parent_id.as_ref() == Some(to))
        };
        points_to(a, b) || points_to(b, a)
    }

    /// The single root node, if present.
    pub fn root(&self) -> Option<&PersonNode> {
        self.nodes.iter().find(|n| n.is_root())
    }

    /// Spouses married to `id`, in node order.
    pub fn spouses_of<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a PersonNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.kind == NodeKind::Spouse && n.parent_id.as_ref() == Some(id))
    }

    /// Children borne by `id`, in node order.
    pub fn children_of<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a PersonNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.kind == NodeKind::Child && n.parent_id.as_ref() == Some(id))
    }

    /// Every node reachable by following `parent_id` upward from `id`.
    pub fn ancestors(&self, id: &NodeId) -> HashSet<NodeId> {
        let mut ancestors = HashSet::new();
        let mut current = self.node(id).and_then(|n| n.parent_id.clone());

        while let Some(parent) = current {
            if !ancestors.insert(parent.clone()) {
                break;
            }
            current = self.node(&parent).and_then(|n| n.parent_id.clone());
        }

        ancestors
    }

    /// Case-insensitive substring search over names, in node order.
    pub fn find_by_name(&self, query: &str) -> Vec<&PersonNode> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.nodes
            .iter()
            .filter(|n| n.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Non-root nodes left without a parent by a delete.
    pub fn orphans(&self) -> impl Iterator<Item = &PersonNode> {
        self.nodes.iter().filter(|n| n.is_orphan())
    }

    /// Verify the structural invariants. Returns one message per violation.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let roots: Vec<_> = self.nodes.iter().filter(|n| n.is_root()).collect();
        if roots.len() != 1 {
            problems.push(format!("expected exactly one root, found {}", roots.len()));
        }
        for root in &roots {
            if root.parent_id.is_some() {
                problems.push(format!("root {} has a parent", root.id));
            }
        }

        for node in &self.nodes {
            let Some(parent_id) = &node.parent_id else {
                if node.child_order.is_some() || node.spouse_order.is_some() {
                    problems.push(format!("unconnected node {} still carries an order", node.id));
                }
                continue;
            };
            let Some(parent) = self.node(parent_id) else {
                problems.push(format!("{} points to missing parent {}", node.id, parent_id));
                continue;
            };
            match node.kind {
                NodeKind::Spouse if !parent.kind.can_marry() => problems.push(format!(
                    "spouse {} is attached to {} {}",
                    node.id, parent.kind, parent.id
                )),
                NodeKind::Child if parent.kind != NodeKind::Spouse => problems.push(format!(
                    "child {} is attached to {} {}",
                    node.id, parent.kind, parent.id
                )),
                NodeKind::Child if node.child_order.is_none() => {
                    problems.push(format!("child {} has no child order", node.id))
                }
                NodeKind::Spouse if node.spouse_order.is_none() => {
                    problems.push(format!("spouse {} has no spouse order", node.id))
                }
                _ => {}
            }
        }

        for parent in &self.nodes {
            let mut seen = HashSet::new();
            for id in &parent.child_ids {
                if !seen.insert(id) {
                    problems.push(format!("{} lists child {} twice", parent.id, id));
                }
                if !self.contains(id) {
                    problems.push(format!("{} lists missing child {}", parent.id, id));
                }
            }

            let owned: Vec<&NodeId> = parent
                .child_ids
                .iter()
                .filter(|id| self.node(id).is_some_and(|c| c.parent_id.as_ref() == Some(&parent.id)))
                .collect();
            for child in self.children_of(&parent.id) {
                if !owned.contains(&&child.id) {
                    problems.push(format!("{} is missing from {}'s child list", child.id, parent.id));
                }
            }
            if parent.child_ids.iter().take(owned.len()).collect::<Vec<_>>() != owned {
                problems.push(format!("{} lists inherited children before its own", parent.id));
            }
            for (rank, id) in owned.iter().enumerate() {
                let order = self.node(id).and_then(|c| c.child_order);
                if order != Some(rank as u32 + 1) {
                    problems.push(format!(
                        "child {} of {} has order {:?}, expected {}",
                        id,
                        parent.id,
                        order,
                        rank + 1
                    ));
                }
            }

            let mut spouse_orders: Vec<u32> =
                self.spouses_of(&parent.id).filter_map(|s| s.spouse_order).collect();
            spouse_orders.sort_unstable();
            if spouse_orders.iter().enumerate().any(|(i, &o)| o != i as u32 + 1) {
                problems.push(format!(
                    "spouse orders of {} are not contiguous: {:?}",
                    parent.id, spouse_orders
                ));
            }
        }

        let mut pairs = HashSet::new();
        for node in &self.nodes {
            let Some(parent) = node.parent_id.as_ref().filter(|p| self.contains(p)) else {
                continue;
            };
            if !pairs.insert(ordered_pair(parent, &node.id)) {
                problems.push(format!("duplicate edge between {} and {}", parent, node.id));
            }
        }

        for node in &self.nodes {
            if self.ancestors(&node.id).contains(&node.id) {
                problems.push(format!("{} is its own ancestor", node.id));
            }
        }

        problems
    }
}

/// Derive the edge set from `parent_id` links. Links to unknown nodes and
/// repeated unordered pairs produce no edge.
pub fn project_edges(nodes: &[PersonNode]) -> Vec<Edge> {
    let ids: HashSet<&NodeId> = nodes.iter().map(|n| &n.id).collect();
    let mut pairs = HashSet::new();
    let mut edges = Vec::new();

    for node in nodes {
        let Some(parent) = &node.parent_id else {
            continue;
        };
        if !ids.contains(parent) || parent == &node.id {
            continue;
        }
        if pairs.insert(ordered_pair(parent, &node.id)) {
            edges.push(Edge::new(parent.clone(), node.id.clone()));
        }
    }

    edges
}

fn ordered_pair<'a>(a: &'a NodeId, b: &'a NodeId) -> (&'a NodeId, &'a NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}
