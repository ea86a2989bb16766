//! Test utilities for Lineage

use crate::editor::FamilyTree;
use crate::ids::SequentialIds;
use crate::model::{AttributeUpdate, Gender, NodeId};
use crate::diff::GraphDiff;

/// Ids of the people in [`create_family`].
pub struct Family {
    pub obi: NodeId,
    pub ada: NodeId,
    pub chike: NodeId,
    pub ngozi: NodeId,
    pub ifeoma: NodeId,
    pub amara: NodeId,
    pub kemi: NodeId,
}

/// A tree with a single male family head named "A" and sequential ids.
pub fn create_single_root() -> FamilyTree {
    let mut tree = FamilyTree::with_ids("Test Tree", Some(Gender::Male), Box::new(SequentialIds::new("n")));
    let root = tree.root_id().cloned().unwrap();
    rename(&mut tree, &root, "A");
    tree
}

/// The first id a diff reports as created.
pub fn created(diff: &GraphDiff) -> NodeId {
    diff.added_nodes.first().cloned().expect("diff should add a node")
}

pub fn rename(tree: &mut FamilyTree, id: &NodeId, name: &str) {
    let update = AttributeUpdate {
        name: Some(name.to_string()),
        ..AttributeUpdate::default()
    };
    tree.update_attributes(id, &update).unwrap();
}

/// Three generations:
///
/// ```text
/// Obi (root, male)
/// ├── Ada (spouse 1)
/// │   ├── Chike (child 1, male)
/// │   │   └── Ifeoma (spouse 1)
/// │   │       └── Amara (child 1, female)
/// │   └── Ngozi (child 2, female)
/// └── Kemi (spouse 2)
/// ```
pub fn create_family() -> (FamilyTree, Family) {
    let mut tree = FamilyTree::with_ids("Okafor", Some(Gender::Male), Box::new(SequentialIds::new("n")));
    let obi = tree.root_id().cloned().unwrap();
    rename(&mut tree, &obi, "Obi");

    let ada = created(&tree.add_spouse(&obi).unwrap());
    rename(&mut tree, &ada, "Ada");
    let chike = created(&tree.add_child(&ada, Gender::Male).unwrap());
    rename(&mut tree, &chike, "Chike");
    let ngozi = created(&tree.add_child(&ada, Gender::Female).unwrap());
    rename(&mut tree, &ngozi, "Ngozi");
    let ifeoma = created(&tree.add_spouse(&chike).unwrap());
    rename(&mut tree, &ifeoma, "Ifeoma");
    let amara = created(&tree.add_child(&ifeoma, Gender::Female).unwrap());
    rename(&mut tree, &amara, "Amara");
    let kemi = created(&tree.add_spouse(&obi).unwrap());
    rename(&mut tree, &kemi, "Kemi");

    let family = Family {
        obi,
        ada,
        chike,
        ngozi,
        ifeoma,
        amara,
        kemi,
    };
    (tree, family)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_family() {
        let (tree, family) = create_family();
        assert_eq!(tree.graph().node_count(), 7);
        assert_eq!(family.obi, NodeId::from("n1"));
        assert_eq!(family.kemi, NodeId::from("n7"));
        assert!(tree.graph().check_invariants().is_empty());
    }
}
