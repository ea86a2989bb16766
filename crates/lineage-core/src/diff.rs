//! Graph diff computation for re-rendering after a mutation

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::model::*;

/// What changed between two graph states.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDiff {
    /// Monotonically increasing diff sequence number.
    pub sequence: u64,
    /// Nodes added in this update, in creation order.
    pub added_nodes: Vec<NodeId>,
    /// Nodes removed in this update.
    pub removed_nodes: Vec<NodeId>,
    /// Nodes present before and after whose fields changed.
    pub modified_nodes: Vec<NodeId>,
    pub added_edges: Vec<Edge>,
    pub removed_edges: Vec<Edge>,
}

impl GraphDiff {
    /// Create an empty diff with given sequence number.
    pub fn new(sequence: u64) -> Self {
        GraphDiff {
            sequence,
            ..GraphDiff::default()
        }
    }

    /// Check if this diff is empty (no changes).
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.modified_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
    }
}

/// Sequencing state for successive diffs.
#[derive(Debug, Default)]
pub struct DiffEngine {
    sequence: u64,
}

impl DiffEngine {
    pub fn new() -> Self {
        DiffEngine { sequence: 0 }
    }

    /// Compute the difference between two graph states. `created` lists the
    /// ids the mutation generated so they are reported in creation order.
    pub fn compute_diff(&mut self, old_graph: &Graph, new_graph: &Graph, created: &[NodeId]) -> GraphDiff {
        self.sequence += 1;
        let mut diff = GraphDiff::new(self.sequence);

        diff.added_nodes.extend(created.iter().filter(|id| new_graph.contains(id)).cloned());
        for node in new_graph.nodes() {
            match old_graph.node(&node.id) {
                None if !created.contains(&node.id) => diff.added_nodes.push(node.id.clone()),
                Some(old) if old != node => diff.modified_nodes.push(node.id.clone()),
                _ => {}
            }
        }

        for node in old_graph.nodes() {
            if !new_graph.contains(&node.id) {
                diff.removed_nodes.push(node.id.clone());
            }
        }

        let old_edges: HashSet<Edge> = old_graph.edges().into_iter().collect();
        let new_edges = new_graph.edges();
        let new_set: HashSet<&Edge> = new_edges.iter().collect();

        diff.added_edges = new_edges.iter().filter(|e| !old_edges.contains(*e)).cloned().collect();
        diff.removed_edges = old_graph
            .edges()
            .into_iter()
            .filter(|e| !new_set.contains(e))
            .collect();

        diff
    }

    /// Get current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}
