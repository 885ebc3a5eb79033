//! Exercises the cross-cutting invariants operations are expected to hold,
//! independent of any single operation's algorithm.

use gorefactor::config::WorkspaceConfig;
use gorefactor::ops::rename::RenameSymbolRequest;
use gorefactor::Engine;

fn module(dir: &std::path::Path, name: &str, source: &str) {
    std::fs::write(dir.join("go.mod"), "module example.com/app\n\ngo 1.22\n").unwrap();
    std::fs::write(dir.join(name), source).unwrap();
}

#[test]
fn every_generated_plan_has_pairwise_disjoint_changes_per_file() {
    let dir = tempfile::tempdir().unwrap();
    module(
        dir.path(),
        "a.go",
        "package main\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n\nfunc main() {\n\tAdd(1, 2)\n\tAdd(3, 4)\n}\n",
    );
    let engine = Engine::load_workspace(dir.path(), WorkspaceConfig::default()).unwrap();

    let plan = engine
        .rename_symbol(&RenameSymbolRequest { name: "Add".to_string(), new_name: "Sum".to_string(), package: None, allow_breaking: false })
        .unwrap();
    assert!(plan.validate_non_overlapping().is_ok());
}

#[test]
fn renaming_and_renaming_back_restores_the_original_bytes() {
    let dir = tempfile::tempdir().unwrap();
    module(
        dir.path(),
        "a.go",
        "package main\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n\nfunc main() {\n\tAdd(1, 2)\n}\n",
    );
    let original = std::fs::read_to_string(dir.path().join("a.go")).unwrap();
    let mut config = WorkspaceConfig::default();
    config.backup_before_write = false;
    let engine = Engine::load_workspace(dir.path(), config).unwrap();

    let there = engine
        .rename_symbol(&RenameSymbolRequest { name: "Add".to_string(), new_name: "Sum".to_string(), package: None, allow_breaking: false })
        .unwrap();
    engine.execute(&there).unwrap();

    let back = engine
        .rename_symbol(&RenameSymbolRequest { name: "Sum".to_string(), new_name: "Add".to_string(), package: None, allow_breaking: false })
        .unwrap();
    engine.execute(&back).unwrap();

    let restored = std::fs::read_to_string(dir.path().join("a.go")).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn a_plan_whose_old_text_disagrees_with_disk_leaves_every_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    module(
        dir.path(),
        "a.go",
        "package main\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n\nfunc main() {\n\tAdd(1, 2)\n}\n",
    );
    let engine = Engine::load_workspace(dir.path(), WorkspaceConfig::default()).unwrap();
    let mut plan = engine
        .rename_symbol(&RenameSymbolRequest { name: "Add".to_string(), new_name: "Sum".to_string(), package: None, allow_breaking: false })
        .unwrap();
    // Corrupt the last change's recorded old_text, simulating a plan built
    // against content the workspace no longer has.
    plan.changes.last_mut().unwrap().old_text = "Stale".to_string();
    let before = std::fs::read_to_string(dir.path().join("a.go")).unwrap();

    assert!(engine.execute(&plan).is_err());
    let after = std::fs::read_to_string(dir.path().join("a.go")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn an_acyclic_workspace_has_no_reported_cycles() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("go.mod"), "module example.com/app\n\ngo 1.22\n").unwrap();
    std::fs::create_dir_all(dir.path().join("lib")).unwrap();
    std::fs::write(dir.path().join("main.go"), "package main\n\nimport \"example.com/app/lib\"\n\nfunc main() {\n\tlib.Helper()\n}\n").unwrap();
    std::fs::write(dir.path().join("lib/lib.go"), "package lib\n\nfunc Helper() {}\n").unwrap();

    let engine = Engine::load_workspace(dir.path(), WorkspaceConfig::default()).unwrap();
    let plan = engine.analyze_dependencies().unwrap();
    assert!(plan.impact.issues.is_empty());
}
