//! Sibling and co-spouse order reconciliation

use std::collections::{HashMap, HashSet};

use crate::model::{NodeId, NodeKind, PersonNode};

/// Rewrite `child_order`, `spouse_order` and `child_ids` so that every
/// parent's ranks are contiguous from 1 and match its child list.
///
/// Children are ranked by their current `child_order` (missing counts as 0),
/// ties keep their current list position. Ids inherited from an absorbed
/// spouse stay after the owned children; ids of nodes that no longer exist
/// are dropped. Running this twice changes nothing the second time.
///
/// Returns whether anything changed.
pub fn normalize(nodes: &mut [PersonNode]) -> bool {
    let index: HashMap<NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(slot, node)| (node.id.clone(), slot))
        .collect();
    let before: Vec<PersonNode> = nodes.to_vec();

    let connected = |node: &PersonNode| {
        node.parent_id
            .as_ref()
            .is_some_and(|p| index.contains_key(p) && p != &node.id)
    };

    // Owned children and spouses per parent slot, in node order.
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut spouses: HashMap<usize, Vec<usize>> = HashMap::new();
    for (slot, node) in nodes.iter().enumerate() {
        if !connected(node) {
            continue;
        }
        let Some(parent_slot) = node.parent_id.as_ref().and_then(|p| index.get(p).copied()) else {
            continue;
        };
        match node.kind {
            NodeKind::Child => children.entry(parent_slot).or_default().push(slot),
            NodeKind::Spouse => spouses.entry(parent_slot).or_default().push(slot),
            NodeKind::Root => {}
        }
    }

    for node in nodes.iter_mut() {
        let is_connected = connected(node);
        if !(is_connected && node.kind == NodeKind::Child) {
            node.child_order = None;
        }
        if !(is_connected && node.kind == NodeKind::Spouse) {
            node.spouse_order = None;
        }
    }

    for parent_slot in 0..nodes.len() {
        let owned = children.remove(&parent_slot).unwrap_or_default();
        let owned_set: HashSet<usize> = owned.iter().copied().collect();

        // Current list order first, then anything the list forgot.
        let mut ranked: Vec<usize> = Vec::with_capacity(owned.len());
        let mut placed = HashSet::new();
        for id in &nodes[parent_slot].child_ids {
            if let Some(&slot) = index.get(id) {
                if owned_set.contains(&slot) && placed.insert(slot) {
                    ranked.push(slot);
                }
            }
        }
        for slot in owned {
            if placed.insert(slot) {
                ranked.push(slot);
            }
        }
        ranked.sort_by_key(|&slot| nodes[slot].child_order.unwrap_or(0));

        let mut child_ids: Vec<NodeId> = Vec::with_capacity(nodes[parent_slot].child_ids.len());
        for (rank, &slot) in ranked.iter().enumerate() {
            nodes[slot].child_order = Some(rank as u32 + 1);
            child_ids.push(nodes[slot].id.clone());
        }

        let mut seen: HashSet<NodeId> = child_ids.iter().cloned().collect();
        for id in &nodes[parent_slot].child_ids {
            if index.contains_key(id) && id != &nodes[parent_slot].id && seen.insert(id.clone()) {
                child_ids.push(id.clone());
            }
        }
        nodes[parent_slot].child_ids = child_ids;
    }

    for (_, mut partners) in spouses {
        partners.sort_by_key(|&slot| (nodes[slot].spouse_order.unwrap_or(0), slot));
        for (rank, slot) in partners.into_iter().enumerate() {
            nodes[slot].spouse_order = Some(rank as u32 + 1);
        }
    }

    let changed = before.as_slice() != &*nodes;
    if changed {
        tracing::debug!("Normalized sibling and spouse order");
    }
    changed
}

/// Move `node_id` to rank `target` (clamped) among its siblings and renumber
/// the rest around it. A following [`normalize`] pass keeps the result.
pub(crate) fn shift_child_rank(nodes: &mut [PersonNode], node_id: &NodeId, target: u32) {
    shift_rank(nodes, node_id, target, NodeKind::Child);
}

/// Same as [`shift_child_rank`] for co-spouses.
pub(crate) fn shift_spouse_rank(nodes: &mut [PersonNode], node_id: &NodeId, target: u32) {
    shift_rank(nodes, node_id, target, NodeKind::Spouse);
}

fn shift_rank(nodes: &mut [PersonNode], node_id: &NodeId, target: u32, kind: NodeKind) {
    let Some(parent) = nodes
        .iter()
        .find(|n| &n.id == node_id && n.kind == kind)
        .and_then(|n| n.parent_id.clone())
    else {
        return;
    };

    let mut members: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.kind == kind && n.parent_id.as_ref() == Some(&parent))
        .map(|(slot, _)| slot)
        .collect();
    members.sort_by_key(|&slot| (rank(&nodes[slot], kind).unwrap_or(0), slot));

    let Some(from) = members.iter().position(|&slot| &nodes[slot].id == node_id) else {
        return;
    };
    let moved = members.remove(from);
    let to = (target.max(1) as usize - 1).min(members.len());
    members.insert(to, moved);

    for (i, slot) in members.into_iter().enumerate() {
        set_rank(&mut nodes[slot], kind, i as u32 + 1);
    }
}

fn rank(node: &PersonNode, kind: NodeKind) -> Option<u32> {
    match kind {
        NodeKind::Child => node.child_order,
        NodeKind::Spouse => node.spouse_order,
        NodeKind::Root => None,
    }
}

fn set_rank(node: &mut PersonNode, kind: NodeKind, value: u32) {
    match kind {
        NodeKind::Child => node.child_order = Some(value),
        NodeKind::Spouse => node.spouse_order = Some(value),
        NodeKind::Root => {}
    }
}
