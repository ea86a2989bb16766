//! Integration tests for Lineage
//!
//! These drive the `lineage` binary against tree files in a temp directory,
//! and exercise the library's file round trip through `tokio::fs`.

use std::path::Path;
use std::process::{Command, Output};

use lineage_core::{FamilyTree, Gender, SequentialIds};
use tempfile::TempDir;

fn lineage(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lineage"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to execute lineage")
}

/// Run and return stdout, failing the test with stderr on a non-zero exit.
fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = lineage(dir, args);
    assert!(
        output.status.success(),
        "lineage {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// A temp dir whose `lineage.toml` asks for sequential ids.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("lineage.toml"),
        "tree_name = \"Okafor\"\nid_scheme = \"sequential\"\n",
    )
    .unwrap();
    dir
}

#[test]
fn test_cli_invocation() {
    let dir = TempDir::new().unwrap();
    let stdout = run_ok(dir.path(), &["--help"]);
    assert!(stdout.contains("lineage"));
    assert!(stdout.contains("Edit family trees stored as checksummed tree files"));
}

#[test]
fn test_cli_scenario() {
    let dir = workspace();
    let path = dir.path();

    assert_eq!(run_ok(path, &["new", "family.csv", "--gender", "male"]).trim(), "n1");
    assert_eq!(run_ok(path, &["add-spouse", "family.csv", "n1"]).trim(), "n2");
    assert_eq!(
        run_ok(path, &["add-child", "family.csv", "n2", "--gender", "male"]).trim(),
        "n3"
    );

    let before = std::fs::read_to_string(path.join("family.csv")).unwrap();
    let rejected = lineage(path, &["connect", "family.csv", "n3", "n2"]);
    assert!(!rejected.status.success());
    assert!(String::from_utf8_lossy(&rejected.stderr).contains("invalid connection"));
    assert_eq!(std::fs::read_to_string(path.join("family.csv")).unwrap(), before);

    run_ok(path, &["delete", "family.csv", "n2"]);
    let outline = run_ok(path, &["show", "family.csv"]);
    assert_eq!(
        outline,
        "Okafor\nFamily Head (root, male) [n1]\nDisconnected:\nNew Son (child, male) [n3]\n"
    );

    let report = run_ok(path, &["verify", "family.csv"]);
    assert!(report.contains("checksum ok"));
    assert!(report.contains("1 disconnected people"));
    assert!(report.contains("structure ok"));
}

#[test]
fn test_cli_refuses_protected_and_existing() {
    let dir = workspace();
    let path = dir.path();
    run_ok(path, &["new", "family.csv"]);

    let output = lineage(path, &["delete", "family.csv", "n1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot be deleted"));

    assert!(!lineage(path, &["new", "family.csv"]).status.success());
    run_ok(path, &["new", "family.csv", "--force", "--name", "Eze"]);
    assert!(run_ok(path, &["show", "family.csv"]).starts_with("Eze\n"));
}

#[test]
fn test_cli_rejects_tampered_file() {
    let dir = workspace();
    let path = dir.path();
    run_ok(path, &["new", "family.csv"]);
    run_ok(path, &["add-spouse", "family.csv", "n1"]);

    let file = path.join("family.csv");
    let text = std::fs::read_to_string(&file).unwrap();
    std::fs::write(&file, text.replacen("New Spouse", "Old Spouse", 1)).unwrap();

    let verify = lineage(path, &["verify", "family.csv"]);
    assert!(!verify.status.success());
    assert!(String::from_utf8_lossy(&verify.stderr).contains("checksum mismatch"));

    let show = lineage(path, &["show", "family.csv"]);
    assert!(!show.status.success());
    assert!(String::from_utf8_lossy(&show.stderr).contains("checksum mismatch"));
}

#[test]
fn test_cli_update_reorders_children() {
    let dir = workspace();
    let path = dir.path();
    run_ok(path, &["new", "family.csv", "--gender", "female"]);
    run_ok(path, &["add-spouse", "family.csv", "n1"]);
    run_ok(path, &["add-child", "family.csv", "n2", "--gender", "male"]);
    run_ok(path, &["add-child", "family.csv", "n2", "--gender", "female"]);
    run_ok(
        path,
        &["update", "family.csv", "n4", "--name", "Adaeze", "--child-order", "1"],
    );

    let outline = run_ok(path, &["show", "family.csv"]);
    let adaeze = outline.find("Adaeze (child 1, female) [n4]").unwrap();
    let son = outline.find("New Son (child 2, male) [n3]").unwrap();
    assert!(adaeze < son);
    assert!(outline.contains("New Spouse (spouse 1, male) [n2]"));

    let found = run_ok(path, &["search", "family.csv", "ada"]);
    assert_eq!(found, "n4\tchild\tAdaeze\n");
}

#[test]
fn test_cli_layout_json() {
    let dir = workspace();
    let path = dir.path();
    run_ok(path, &["new", "family.csv"]);
    run_ok(path, &["add-spouse", "family.csv", "n1"]);
    run_ok(path, &["add-spouse", "family.csv", "n1"]);

    let json = run_ok(path, &["layout", "family.csv"]);
    let positions: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(positions.len(), 3);
    assert_eq!(positions[0]["id"], "n1");
    assert_eq!(positions[0]["y"], 0.0);
    assert!(positions[1]["x"].as_f64().unwrap() < positions[2]["x"].as_f64().unwrap());
    assert_eq!(positions[1]["y"], positions[2]["y"]);
}

#[tokio::test]
async fn test_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("tree.csv");

    let mut tree = FamilyTree::with_ids("Round Trip", Some(Gender::Male), Box::new(SequentialIds::new("r")));
    let root = tree.root_id().cloned().unwrap();
    let spouse = tree.add_spouse(&root).unwrap().added_nodes[0].clone();
    tree.add_child(&spouse, Gender::Female).unwrap();
    tree.add_child(&spouse, Gender::Male).unwrap();
    tokio::fs::write(&file, tree.export_text().unwrap()).await.unwrap();

    let text = tokio::fs::read_to_string(&file).await.unwrap();
    let loaded = FamilyTree::from_text("Round Trip", &text, Box::new(SequentialIds::new("r"))).unwrap();
    assert_eq!(loaded.graph().node_count(), 4);
    for (a, b) in tree.graph().nodes().iter().zip(loaded.graph().nodes()) {
        assert!(a.same_structure(b), "{a:?} != {b:?}");
    }
    assert_eq!(loaded.graph().edges(), tree.graph().edges());
    assert!(loaded.graph().check_invariants().is_empty());
}

#[test]
fn test_cli_rejects_degenerate_layout_config() {
    let dir = workspace();
    let path = dir.path();
    run_ok(path, &["new", "family.csv"]);

    std::fs::write(
        path.join("lineage.toml"),
        "[layout]\nnode_width = 0.0\nspouse_width = 0.0\nsibling_gap = 0.0\n",
    )
    .unwrap();
    let output = lineage(path, &["layout", "family.csv"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("layout.node_width must be positive"));
}
