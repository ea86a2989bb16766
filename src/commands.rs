//! CLI command implementations

use anyhow::Context;
use lineage_core::codec;
use lineage_core::{AttributeUpdate, FamilyTree, Gender, Graph, GraphDiff, LineageConfig, NodeId, TreeError};
use std::path::Path;

pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<LineageConfig> {
    let cwd = std::env::current_dir().context("Cannot determine the working directory")?;
    let config = LineageConfig::discover(explicit, &cwd)?;
    Ok(config)
}

/// Read a tree file through the editor's import gate.
async fn load(config: &LineageConfig, file: &Path) -> anyhow::Result<FamilyTree> {
    let mut tree = FamilyTree::awaiting_import(config);

    let text = match tokio::fs::read_to_string(file).await {
        Ok(text) => text,
        Err(e) => {
            tree.abort_import();
            return Err(e).with_context(|| format!("Cannot read tree file {}", file.display()));
        }
    };

    tree.complete_import(&text)
        .with_context(|| format!("Cannot load tree file {}", file.display()))?;
    if let Some(name) = codec::tree_name(&text) {
        tree.rename(name);
    }
    tracing::debug!("Loaded {} from {}", tree.name(), file.display());
    Ok(tree)
}

async fn save(tree: &FamilyTree, file: &Path) -> anyhow::Result<()> {
    let text = tree.export_text()?;
    tokio::fs::write(file, text)
        .await
        .with_context(|| format!("Cannot write tree file {}", file.display()))?;
    tracing::debug!("Saved {} people to {}", tree.graph().node_count(), file.display());
    Ok(())
}

/// Load, apply one edit, write back, and print the ids the edit created.
async fn edit<F>(config: &LineageConfig, file: &Path, apply: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut FamilyTree) -> Result<GraphDiff, TreeError>,
{
    let mut tree = load(config, file).await?;
    let diff = apply(&mut tree)?;
    save(&tree, file).await?;

    for id in &diff.added_nodes {
        println!("{id}");
    }
    tracing::info!(
        "{} added, {} removed, {} updated",
        diff.added_nodes.len(),
        diff.removed_nodes.len(),
        diff.modified_nodes.len()
    );
    Ok(())
}

pub async fn new_tree(
    config: &LineageConfig,
    file: &Path,
    name: Option<String>,
    gender: Option<Gender>,
    force: bool,
) -> anyhow::Result<()> {
    if !force && tokio::fs::try_exists(file).await.unwrap_or(false) {
        anyhow::bail!("{} already exists; pass --force to overwrite it", file.display());
    }

    let mut tree = FamilyTree::from_config(config, gender);
    if let Some(name) = name {
        tree.rename(name);
    }
    save(&tree, file).await?;

    if let Some(root) = tree.root_id() {
        println!("{root}");
    }
    tracing::info!("Created {} in {}", tree.name(), file.display());
    Ok(())
}

pub async fn show(config: &LineageConfig, file: &Path) -> anyhow::Result<()> {
    let tree = load(config, file).await?;
    println!("{}", tree.name());
    print!("{}", lineage_core::render_outline(tree.graph()));
    Ok(())
}

pub async fn add_spouse(config: &LineageConfig, file: &Path, partner: &str) -> anyhow::Result<()> {
    let partner = NodeId::from(partner);
    edit(config, file, |tree| tree.add_spouse(&partner)).await
}

pub async fn add_child(config: &LineageConfig, file: &Path, spouse: &str, gender: Gender) -> anyhow::Result<()> {
    let spouse = NodeId::from(spouse);
    edit(config, file, |tree| tree.add_child(&spouse, gender)).await
}

pub async fn connect(config: &LineageConfig, file: &Path, source: &str, target: &str) -> anyhow::Result<()> {
    let (source, target) = (NodeId::from(source), NodeId::from(target));
    edit(config, file, |tree| tree.reconnect(&source, &target)).await
}

pub async fn delete(config: &LineageConfig, file: &Path, id: &str) -> anyhow::Result<()> {
    let id = NodeId::from(id);
    edit(config, file, |tree| tree.delete_node(&id)).await
}

pub async fn new_root(config: &LineageConfig, file: &Path, gender: Option<Gender>) -> anyhow::Result<()> {
    edit(config, file, |tree| tree.add_new_root(gender)).await
}

pub async fn update(config: &LineageConfig, file: &Path, id: &str, update: AttributeUpdate) -> anyhow::Result<()> {
    let id = NodeId::from(id);
    edit(config, file, |tree| tree.update_attributes(&id, &update)).await
}

pub async fn search(config: &LineageConfig, file: &Path, query: &str) -> anyhow::Result<()> {
    let tree = load(config, file).await?;
    let found = tree.graph().find_by_name(query);
    for node in &found {
        println!("{}\t{}\t{}", node.id, node.kind, node.name);
    }
    tracing::info!("{} match(es) for {:?}", found.len(), query);
    Ok(())
}

pub async fn layout(config: &LineageConfig, file: &Path) -> anyhow::Result<()> {
    let mut tree = load(config, file).await?;
    tree.format_tree();

    let positions: Vec<serde_json::Value> = tree
        .graph()
        .nodes()
        .iter()
        .map(|node| {
            serde_json::json!({
                "id": node.id.as_str(),
                "name": node.name,
                "kind": node.kind.as_str(),
                "x": node.position.x,
                "y": node.position.y,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&positions)?);
    Ok(())
}

/// Report checksum and structural problems without loading into an editor.
pub async fn verify(file: &Path) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Cannot read tree file {}", file.display()))?;
    let records = codec::parse_records(&text)?;
    let checksum = records.first().map(|r| r.checksum.trim().to_string()).unwrap_or_default();
    let imported = codec::import_rows(records).with_context(|| format!("Cannot check {}", file.display()))?;
    println!("checksum ok ({checksum}), {} people", imported.nodes.len());

    let graph = Graph::from_nodes(imported.nodes);
    let orphans = graph.orphans().count();
    if orphans > 0 {
        println!("{orphans} disconnected people");
    }

    let problems = graph.check_invariants();
    if problems.is_empty() {
        println!("structure ok");
        return Ok(());
    }
    for problem in &problems {
        println!("problem: {problem}");
    }
    anyhow::bail!("{} structural problem(s) in {}", problems.len(), file.display())
}
