//! Layered tree layout
//!
//! Ranks follow parent depth: a root sits on rank 0, its spouses on rank 1,
//! their children on rank 2, and so on. Within a rank, siblings keep their
//! `spouse_order` / `child_order`. Every subtree owns a horizontal interval
//! at least as wide as its own box and its children's intervals together,
//! and each node is centered in its interval, so boxes never overlap.
//!
//! Disconnected parts (orphans left by a delete) are laid out as separate
//! trees to the right of the main one. The output only depends on the input
//! order and contents.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::config::LayoutConfig;
use crate::model::*;

/// Compute positions for every node; returns the nodes with `position` set.
pub fn layout(nodes: &[PersonNode], edges: &[Edge], config: &LayoutConfig) -> Vec<PersonNode> {
    let mut hierarchy = Hierarchy::build(nodes, edges);
    let order = hierarchy.forest_order(nodes);

    let mut widths = vec![0.0; nodes.len()];
    let mut placed = vec![false; nodes.len()];
    let mut positions = vec![Position::default(); nodes.len()];
    let mut cursor = 0.0;

    for root in order {
        if placed[root.index()] {
            continue;
        }
        if hierarchy.parent(root).is_some() {
            // Only reachable through a parent cycle; cut it here.
            tracing::warn!("Parent cycle through {}; laying it out from there", nodes[root.index()].id);
            hierarchy.detach(root);
        }
        let width = subtree_width(&hierarchy, nodes, config, root, &mut widths, &mut vec![false; nodes.len()]);
        place(&hierarchy, nodes, config, root, cursor, 0, &widths, &mut positions, &mut placed);
        cursor += width + config.sibling_gap;
    }

    tracing::debug!("Laid out {} people across width {}", nodes.len(), cursor);
    nodes
        .iter()
        .zip(positions)
        .map(|(node, position)| PersonNode {
            position,
            ..node.clone()
        })
        .collect()
}

/// Tree view over the edge set: one parent per node (first incoming edge wins).
struct Hierarchy {
    graph: DiGraph<usize, ()>,
    order_keys: Vec<(u32, usize)>,
}

impl Hierarchy {
    fn build(nodes: &[PersonNode], edges: &[Edge]) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut slots: HashMap<&NodeId, NodeIndex> = HashMap::with_capacity(nodes.len());
        for (slot, node) in nodes.iter().enumerate() {
            slots.insert(&node.id, graph.add_node(slot));
        }

        for edge in edges {
            let (Some(&source), Some(&target)) = (slots.get(&edge.source), slots.get(&edge.target)) else {
                continue;
            };
            let has_parent = graph.edges_directed(target, Direction::Incoming).next().is_some();
            if source != target && !has_parent {
                graph.add_edge(source, target, ());
            }
        }

        if petgraph::algo::is_cyclic_directed(&graph) {
            tracing::warn!("Family graph contains a parent cycle");
        }

        let order_keys = nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| {
                let rank = match node.kind {
                    NodeKind::Spouse => node.spouse_order,
                    NodeKind::Child => node.child_order,
                    NodeKind::Root => None,
                };
                (rank.unwrap_or(0), slot)
            })
            .collect();

        Hierarchy { graph, order_keys }
    }

    fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .next()
            .map(|e| e.source())
    }

    fn detach(&mut self, node: NodeIndex) {
        if let Some(edge) = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .next()
            .map(|e| e.id())
        {
            self.graph.remove_edge(edge);
        }
    }

    /// Children ordered by rank, then by node order.
    fn children(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self.graph.neighbors_directed(node, Direction::Outgoing).collect();
        children.sort_by_key(|c| self.order_keys[c.index()]);
        children
    }

    /// Tree roots: the family head first, then orphans, then (only for
    /// malformed input) every remaining node in node order as a fallback.
    fn forest_order(&self, nodes: &[PersonNode]) -> Vec<NodeIndex> {
        let mut roots: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&n| self.parent(n).is_none())
            .collect();
        roots.sort_by_key(|n| (!nodes[n.index()].is_root(), n.index()));
        roots.extend(self.graph.node_indices());
        roots
    }
}

fn box_width(node: &PersonNode, config: &LayoutConfig) -> f64 {
    match node.kind {
        NodeKind::Spouse => config.spouse_width,
        NodeKind::Root | NodeKind::Child => config.node_width,
    }
}

fn subtree_width(
    hierarchy: &Hierarchy,
    nodes: &[PersonNode],
    config: &LayoutConfig,
    node: NodeIndex,
    widths: &mut [f64],
    visiting: &mut [bool],
) -> f64 {
    visiting[node.index()] = true;
    let children: Vec<NodeIndex> = hierarchy
        .children(node)
        .into_iter()
        .filter(|c| !visiting[c.index()])
        .collect();

    let mut span = 0.0;
    for (i, &child) in children.iter().enumerate() {
        if i > 0 {
            span += config.sibling_gap;
        }
        span += subtree_width(hierarchy, nodes, config, child, widths, visiting);
    }

    let width = box_width(&nodes[node.index()], config).max(span);
    widths[node.index()] = width;
    width
}

#[allow(clippy::too_many_arguments)]
fn place(
    hierarchy: &Hierarchy,
    nodes: &[PersonNode],
    config: &LayoutConfig,
    node: NodeIndex,
    left: f64,
    depth: u32,
    widths: &[f64],
    positions: &mut [Position],
    placed: &mut [bool],
) {
    placed[node.index()] = true;
    let width = widths[node.index()];
    let center = left + width / 2.0;
    positions[node.index()] = Position {
        x: center - box_width(&nodes[node.index()], config) / 2.0,
        y: f64::from(depth) * (config.node_height + config.rank_gap),
    };

    let children: Vec<NodeIndex> = hierarchy
        .children(node)
        .into_iter()
        .filter(|c| !placed[c.index()])
        .collect();
    let span: f64 = children.iter().map(|c| widths[c.index()]).sum::<f64>()
        + config.sibling_gap * children.len().saturating_sub(1) as f64;

    let mut child_left = left + (width - span) / 2.0;
    for child in children {
        place(hierarchy, nodes, config, child, child_left, depth + 1, widths, positions, placed);
        child_left += widths[child.index()] + config.sibling_gap;
    }
}
