//! Editing session: the mutation interface consumed by a UI or the CLI
//!
//! `FamilyTree` owns the graph store and funnels every edit through the same
//! path: busy check, rule validation on a snapshot, normalization, one atomic
//! `replace`, diff. A failed edit returns before `replace`, so readers never
//! observe a partial state.

use crate::codec::{self, ImportedTree, TreeRecord};
use crate::config::{IdScheme, LayoutConfig, LineageConfig};
use crate::diff::{DiffEngine, GraphDiff};
use crate::error::{Result, TreeError};
use crate::graph::Graph;
use crate::ids::{IdGenerator, SequentialIds, UuidIds};
use crate::layout;
use crate::model::*;
use crate::ordering;
use crate::rules::{self, Mutation};

fn id_source(scheme: IdScheme) -> Box<dyn IdGenerator> {
    match scheme {
        IdScheme::Uuid => Box::new(UuidIds),
        IdScheme::Sequential => Box::new(SequentialIds::default()),
    }
}

pub struct FamilyTree {
    name: String,
    graph: Graph,
    ids: Box<dyn IdGenerator>,
    diffs: DiffEngine,
    layout_config: LayoutConfig,
    importing: bool,
}

impl std::fmt::Debug for FamilyTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FamilyTree")
            .field("name", &self.name)
            .field("graph", &self.graph)
            .field("importing", &self.importing)
            .finish()
    }
}

impl FamilyTree {
    /// Start a tree holding only its family head.
    pub fn new(name: impl Into<String>, root_gender: Option<Gender>) -> Self {
        Self::with_ids(name, root_gender, Box::new(UuidIds))
    }

    /// Start a tree with a specific id generator.
    pub fn with_ids(name: impl Into<String>, root_gender: Option<Gender>, mut ids: Box<dyn IdGenerator>) -> Self {
        let root = PersonNode::new(ids.next_id(), NodeKind::Root, root_gender, rules::FAMILY_HEAD_NAME);
        let mut tree = Self::blank(name, ids, LayoutConfig::default());
        tree.graph = Graph::from_nodes(vec![root]);
        tree
    }

    /// Start a tree as described by a config file.
    pub fn from_config(config: &LineageConfig, root_gender: Option<Gender>) -> Self {
        let mut tree = Self::with_ids(config.tree_name.clone(), root_gender, id_source(config.id_scheme));
        tree.layout_config = config.layout.clone();
        tree
    }

    /// An empty tree already in the busy state, for loading a file with the
    /// configured id scheme and layout. The graph stays empty until
    /// [`FamilyTree::complete_import`] succeeds.
    pub fn awaiting_import(config: &LineageConfig) -> Self {
        let mut tree = Self::blank(config.tree_name.clone(), id_source(config.id_scheme), config.layout.clone());
        tree.importing = true;
        tree
    }

    /// Load a tree from file text. Fails exactly when [`codec::read_tree`] does.
    pub fn from_text(name: impl Into<String>, text: &str, ids: Box<dyn IdGenerator>) -> Result<Self> {
        let mut tree = Self::blank(name, ids, LayoutConfig::default());
        tree.import_text(text)?;
        Ok(tree)
    }

    fn blank(name: impl Into<String>, ids: Box<dyn IdGenerator>, layout_config: LayoutConfig) -> Self {
        FamilyTree {
            name: name.into(),
            graph: Graph::new(),
            ids,
            diffs: DiffEngine::new(),
            layout_config,
            importing: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn root_id(&self) -> Option<&NodeId> {
        self.graph.root().map(|r| &r.id)
    }

    pub fn is_importing(&self) -> bool {
        self.importing
    }

    // ── Mutations ───────────────────────────────────────────

    pub fn add_spouse(&mut self, parent: &NodeId) -> Result<GraphDiff> {
        self.ensure_idle()?;
        let id = self.fresh_id();
        let mutation = rules::add_spouse(&self.graph, parent, id)?;
        Ok(self.commit("add spouse", mutation))
    }

    pub fn add_child(&mut self, spouse: &NodeId, gender: Gender) -> Result<GraphDiff> {
        self.ensure_idle()?;
        let id = self.fresh_id();
        let mutation = rules::add_child(&self.graph, spouse, gender, id)?;
        Ok(self.commit("add child", mutation))
    }

    pub fn reconnect(&mut self, source: &NodeId, target: &NodeId) -> Result<GraphDiff> {
        self.ensure_idle()?;
        let mutation = rules::reconnect(&self.graph, source, target).inspect_err(|e| {
            tracing::warn!("Rejected connection {} -> {}: {}", source, target, e);
        })?;
        Ok(self.commit("reconnect", mutation))
    }

    pub fn delete_node(&mut self, id: &NodeId) -> Result<GraphDiff> {
        self.ensure_idle()?;
        let mutation = rules::delete_node(&self.graph, id)?;
        Ok(self.commit("delete", mutation))
    }

    pub fn add_new_root(&mut self, gender: Option<Gender>) -> Result<GraphDiff> {
        self.ensure_idle()?;
        let root_id = self.fresh_id();
        let mut spouse_id = self.fresh_id();
        while spouse_id == root_id {
            spouse_id = self.fresh_id();
        }
        let mutation = rules::add_new_root(&self.graph, gender, root_id, spouse_id)?;
        Ok(self.commit("add new root", mutation))
    }

    /// Display attributes never affect structure; explicit orders do and
    /// therefore follow the same gate as structural edits.
    pub fn update_attributes(&mut self, id: &NodeId, update: &AttributeUpdate) -> Result<GraphDiff> {
        if update.touches_order() {
            self.ensure_idle()?;
        }
        let mutation = rules::update_attributes(&self.graph, id, update)?;
        Ok(self.commit("update", mutation))
    }

    /// Recompute every position ("format tree").
    pub fn format_tree(&mut self) -> GraphDiff {
        let nodes = layout::layout(self.graph.nodes(), &self.graph.edges(), &self.layout_config);
        self.commit("layout", Mutation { nodes, created: Vec::new() })
    }

    // ── Import / export ─────────────────────────────────────

    pub fn export_rows(&self) -> Result<Vec<TreeRecord>> {
        codec::export_rows(self.graph.nodes())
    }

    pub fn export_text(&self) -> Result<String> {
        let text = codec::write_tree(&self.name, self.graph.nodes())?;
        tracing::info!("Exported {} people", self.graph.node_count());
        Ok(text)
    }

    /// Enter the busy state while file contents are being fetched.
    pub fn begin_import(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.importing = true;
        Ok(())
    }

    /// Leave the busy state without touching the graph.
    pub fn abort_import(&mut self) {
        self.importing = false;
    }

    /// Validate and commit fetched file text, releasing the busy state
    /// either way.
    pub fn complete_import(&mut self, text: &str) -> Result<GraphDiff> {
        self.importing = false;
        self.import_text(text)
    }

    /// Replace the whole graph with the contents of a tree file.
    pub fn import_text(&mut self, text: &str) -> Result<GraphDiff> {
        let imported = codec::read_tree(text)?;
        Ok(self.commit_import(imported))
    }

    /// Replace the whole graph with already parsed rows.
    pub fn import_rows(&mut self, records: Vec<TreeRecord>) -> Result<GraphDiff> {
        let imported = codec::import_rows(records)?;
        Ok(self.commit_import(imported))
    }

    fn commit_import(&mut self, imported: ImportedTree) -> GraphDiff {
        let ImportedTree { mut nodes, .. } = imported;
        ordering::normalize(&mut nodes);
        let nodes = layout::layout(&nodes, &crate::graph::project_edges(&nodes), &self.layout_config);
        self.commit("import", Mutation { nodes, created: Vec::new() })
    }

    // ── Internals ───────────────────────────────────────────

    fn ensure_idle(&self) -> Result<()> {
        if self.importing {
            return Err(TreeError::Busy);
        }
        Ok(())
    }

    /// Draw ids until one is not already taken (imported files may hold
    /// ids from any scheme).
    fn fresh_id(&mut self) -> NodeId {
        loop {
            let id = self.ids.next_id();
            if !self.graph.contains(&id) {
                return id;
            }
        }
    }

    fn commit(&mut self, action: &str, mutation: Mutation) -> GraphDiff {
        let next = Graph::from_nodes(mutation.nodes);
        let diff = self.diffs.compute_diff(&self.graph, &next, &mutation.created);
        self.graph = next;
        tracing::debug!(
            "{}: +{} -{} ~{} nodes (diff #{})",
            action,
            diff.added_nodes.len(),
            diff.removed_nodes.len(),
            diff.modified_nodes.len(),
            diff.sequence
        );
        diff
    }
}
