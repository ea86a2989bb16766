//! Plain-text outline of a family graph

use std::collections::HashSet;

use termtree::Tree;

use crate::graph::Graph;
use crate::model::*;

/// Render the tree as an indented outline, family head first, followed by
/// any disconnected people.
pub fn render_outline(graph: &Graph) -> String {
    let mut seen = HashSet::new();
    let mut out = String::new();

    if let Some(root) = graph.root() {
        push_tree(&mut out, subtree(graph, root, &mut seen));
    }

    let rest: Vec<&PersonNode> = graph.nodes().iter().filter(|n| !seen.contains(&n.id)).collect();
    if !rest.is_empty() {
        out.push_str("Disconnected:\n");
        // Heads of disconnected parts first so their descendants nest below them.
        let (heads, tail): (Vec<&PersonNode>, Vec<&PersonNode>) = rest
            .into_iter()
            .partition(|n| !n.parent_id.as_ref().is_some_and(|p| graph.contains(p)));
        for node in heads.into_iter().chain(tail) {
            if !seen.contains(&node.id) {
                push_tree(&mut out, subtree(graph, node, &mut seen));
            }
        }
    }

    out
}

fn push_tree(out: &mut String, tree: Tree<String>) {
    out.push_str(tree.to_string().trim_end_matches('\n'));
    out.push('\n');
}

fn label(node: &PersonNode) -> String {
    let rank = match node.kind {
        NodeKind::Spouse => node.spouse_order,
        NodeKind::Child => node.child_order,
        NodeKind::Root => None,
    };
    let mut details = node.kind.to_string();
    if let Some(rank) = rank {
        details.push_str(&format!(" {rank}"));
    }
    if let Some(gender) = node.gender {
        details.push_str(&format!(", {gender}"));
    }
    format!("{} ({}) [{}]", node.name, details, node.id)
}

fn subtree<'a>(graph: &'a Graph, node: &'a PersonNode, seen: &mut HashSet<&'a NodeId>) -> Tree<String> {
    seen.insert(&node.id);

    let mut below: Vec<&PersonNode> = graph
        .nodes()
        .iter()
        .filter(|n| n.parent_id.as_ref() == Some(&node.id) && !seen.contains(&n.id))
        .collect();
    below.sort_by_key(|n| {
        let rank = n.spouse_order.or(n.child_order).unwrap_or(0);
        (rank, graph.position_of(&n.id))
    });

    let mut leaves = Vec::with_capacity(below.len());
    for next in below {
        if !seen.contains(&next.id) {
            leaves.push(subtree(graph, next, seen));
        }
    }
    Tree::new(label(node)).with_leaves(leaves)
}
