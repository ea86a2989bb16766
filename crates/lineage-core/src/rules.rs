//! Relationship rules: validated, all-or-nothing graph mutations
//!
//! Every operation reads the current [`Graph`], validates the request, and
//! only then builds the complete next node vector. Nothing here touches the
//! store; the caller commits the returned [`Mutation`] with `Graph::replace`.

use crate::error::{Result, TreeError};
use crate::graph::Graph;
use crate::model::*;
use crate::ordering;

/// Default display names for freshly created people.
pub const FAMILY_HEAD_NAME: &str = "Family Head";
pub const NEW_SPOUSE_NAME: &str = "New Spouse";
pub const NEW_SON_NAME: &str = "New Son";
pub const NEW_DAUGHTER_NAME: &str = "New Daughter";

/// A fully computed next state.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub nodes: Vec<PersonNode>,
    /// Ids created by this mutation, in creation order.
    pub created: Vec<NodeId>,
}

impl Mutation {
    fn finish(mut nodes: Vec<PersonNode>, created: Vec<NodeId>) -> Self {
        ordering::normalize(&mut nodes);
        Mutation { nodes, created }
    }
}

/// Gender given to a new spouse: the opposite of the partner, or female when
/// the partner's gender is unknown.
pub fn spouse_gender_for(partner: &PersonNode) -> Gender {
    partner.gender.map_or(Gender::Female, |g| g.opposite())
}

/// Marry a new spouse to a root or child.
pub fn add_spouse(graph: &Graph, parent_id: &NodeId, new_id: NodeId) -> Result<Mutation> {
    let parent = existing(graph, parent_id)?;
    if !parent.kind.can_marry() {
        return Err(TreeError::InvalidParent {
            id: parent.id.clone(),
            kind: parent.kind,
            action: "take a spouse",
        });
    }

    let mut spouse = PersonNode::new(
        new_id.clone(),
        NodeKind::Spouse,
        Some(spouse_gender_for(parent)),
        NEW_SPOUSE_NAME,
    );
    spouse.parent_id = Some(parent.id.clone());
    spouse.spouse_order = Some(graph.spouses_of(parent_id).count() as u32 + 1);

    let mut nodes = graph.snapshot();
    nodes.push(spouse);
    Ok(Mutation::finish(nodes, vec![new_id]))
}

/// Add a child borne by a spouse.
pub fn add_child(graph: &Graph, spouse_id: &NodeId, gender: Gender, new_id: NodeId) -> Result<Mutation> {
    let spouse = existing(graph, spouse_id)?;
    if spouse.kind != NodeKind::Spouse {
        return Err(TreeError::InvalidParent {
            id: spouse.id.clone(),
            kind: spouse.kind,
            action: "bear children",
        });
    }

    let name = match gender {
        Gender::Male => NEW_SON_NAME,
        Gender::Female => NEW_DAUGHTER_NAME,
    };
    let mut child = PersonNode::new(new_id.clone(), NodeKind::Child, Some(gender), name);
    child.parent_id = Some(spouse.id.clone());
    child.child_order = Some(graph.children_of(spouse_id).count() as u32 + 1);

    let mut nodes = graph.snapshot();
    if let Some(parent) = nodes.iter_mut().find(|n| &n.id == spouse_id) {
        parent.child_ids.push(new_id.clone());
    }
    nodes.push(child);
    Ok(Mutation::finish(nodes, vec![new_id]))
}

/// Apply a user-drawn edge from `source_id` to `target_id`.
///
/// Only two directions are legal: spouse to child (re-parent the child) and
/// child to spouse (re-marry the spouse, bringing their descendants along).
pub fn reconnect(graph: &Graph, source_id: &NodeId, target_id: &NodeId) -> Result<Mutation> {
    let (Some(source), Some(target)) = (graph.node(source_id), graph.node(target_id)) else {
        return Err(TreeError::connection(source_id, target_id, "both endpoints must exist"));
    };
    if source_id == target_id {
        return Err(TreeError::connection(source_id, target_id, "a person cannot connect to themselves"));
    }

    match (source.kind, target.kind) {
        (NodeKind::Spouse, NodeKind::Child) => attach_child(graph, source, target),
        (NodeKind::Child, NodeKind::Spouse) => marry(graph, source, target),
        (from, to) => Err(TreeError::connection(
            source_id,
            target_id,
            format!("a {from} cannot be connected to a {to}; draw spouse to child or child to spouse"),
        )),
    }
}

fn attach_child(graph: &Graph, spouse: &PersonNode, child: &PersonNode) -> Result<Mutation> {
    if graph.has_edge_between(&spouse.id, &child.id) {
        return Err(TreeError::DuplicateEdge(spouse.id.clone(), child.id.clone()));
    }
    if graph.ancestors(&spouse.id).contains(&child.id) {
        return Err(TreeError::connection(
            &spouse.id,
            &child.id,
            "the child is an ancestor of the spouse",
        ));
    }

    let rank = graph.children_of(&spouse.id).count() as u32 + 1;
    let mut nodes = graph.snapshot();
    detach(&mut nodes, child);
    for node in nodes.iter_mut() {
        if node.id == child.id {
            node.parent_id = Some(spouse.id.clone());
            node.child_order = Some(rank);
        } else if node.id == spouse.id && !node.child_ids.contains(&child.id) {
            node.child_ids.push(child.id.clone());
        }
    }

    tracing::debug!("Re-parented child {} under spouse {}", child.id, spouse.id);
    Ok(Mutation::finish(nodes, Vec::new()))
}

fn marry(graph: &Graph, child: &PersonNode, spouse: &PersonNode) -> Result<Mutation> {
    if let (Some(a), Some(b)) = (child.gender, spouse.gender) {
        if a == b {
            return Err(TreeError::GenderConflict { gender: a });
        }
    }
    if spouse.parent_id.as_ref() == Some(&child.id) {
        return Err(TreeError::DuplicateEdge(child.id.clone(), spouse.id.clone()));
    }
    if graph.ancestors(&child.id).contains(&spouse.id) {
        return Err(TreeError::connection(
            &child.id,
            &spouse.id,
            "the spouse is an ancestor of the child",
        ));
    }

    let rank = graph.spouses_of(&child.id).count() as u32 + 1;
    let inherited = spouse.child_ids.clone();
    let mut nodes = graph.snapshot();
    detach(&mut nodes, spouse);
    for node in nodes.iter_mut() {
        if node.id == spouse.id {
            node.parent_id = Some(child.id.clone());
            node.spouse_order = Some(rank);
        } else if node.id == child.id {
            for id in &inherited {
                if !node.child_ids.contains(id) {
                    node.child_ids.push(id.clone());
                }
            }
        }
    }

    tracing::debug!("Married spouse {} to {}", spouse.id, child.id);
    Ok(Mutation::finish(nodes, Vec::new()))
}

/// Drop `node` from its current parent's child list.
fn detach(nodes: &mut [PersonNode], node: &PersonNode) {
    let Some(old_parent) = &node.parent_id else {
        return;
    };
    if let Some(parent) = nodes.iter_mut().find(|n| &n.id == old_parent) {
        parent.child_ids.retain(|id| id != &node.id);
    }
}

/// Remove a person. Descendants are orphaned, not deleted: every reference to
/// the removed id is cleared and the rest of the graph stays as it was.
pub fn delete_node(graph: &Graph, id: &NodeId) -> Result<Mutation> {
    let node = existing(graph, id)?;
    if node.is_root() {
        return Err(TreeError::ProtectedNode(id.clone()));
    }

    let nodes: Vec<PersonNode> = graph
        .nodes()
        .iter()
        .filter(|n| &n.id != id)
        .cloned()
        .map(|mut n| {
            n.child_ids.retain(|c| c != id);
            if n.parent_id.as_ref() == Some(id) {
                n.parent_id = None;
            }
            n
        })
        .collect();

    Ok(Mutation::finish(nodes, Vec::new()))
}

/// Insert a generation above the current root: a new root, married to a new
/// spouse, who bears the old root as their first child.
pub fn add_new_root(
    graph: &Graph,
    gender: Option<Gender>,
    root_id: NodeId,
    spouse_id: NodeId,
) -> Result<Mutation> {
    let root = PersonNode::new(root_id.clone(), NodeKind::Root, gender, FAMILY_HEAD_NAME);
    let mut spouse = PersonNode::new(
        spouse_id.clone(),
        NodeKind::Spouse,
        Some(spouse_gender_for(&root)),
        NEW_SPOUSE_NAME,
    );
    spouse.parent_id = Some(root_id.clone());
    spouse.spouse_order = Some(1);

    let mut nodes = graph.snapshot();
    if let Some(old_root) = nodes.iter_mut().find(|n| n.is_root()) {
        old_root.kind = NodeKind::Child;
        old_root.parent_id = Some(spouse_id.clone());
        old_root.child_order = Some(1);
        spouse.child_ids.push(old_root.id.clone());
    }

    // The new generation goes first so that export lists the root at the top.
    nodes.insert(0, spouse);
    nodes.insert(0, root);
    Ok(Mutation::finish(nodes, vec![root_id, spouse_id]))
}

/// Update display attributes and, when supplied, move the node to a new
/// sibling or co-spouse rank.
pub fn update_attributes(graph: &Graph, id: &NodeId, update: &AttributeUpdate) -> Result<Mutation> {
    let node = existing(graph, id)?;
    let kind = node.kind;

    let mut nodes = graph.snapshot();
    if let Some(target) = nodes.iter_mut().find(|n| &n.id == id) {
        if let Some(name) = &update.name {
            target.name = name.clone();
        }
        if let Some(image) = &update.image_reference {
            target.image_reference = image.clone();
        }
    }

    match (kind, update.child_order, update.spouse_order) {
        (NodeKind::Child, Some(rank), _) => ordering::shift_child_rank(&mut nodes, id, rank),
        (NodeKind::Spouse, _, Some(rank)) => ordering::shift_spouse_rank(&mut nodes, id, rank),
        (_, None, None) => {}
        _ => tracing::debug!("Ignoring order update for {} {}", kind, id),
    }

    Ok(Mutation::finish(nodes, Vec::new()))
}

fn existing<'a>(graph: &'a Graph, id: &NodeId) -> Result<&'a PersonNode> {
    graph.node(id).ok_or_else(|| TreeError::NodeNotFound(id.clone()))
}
