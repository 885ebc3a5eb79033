//! End-to-end scenarios driven through the `Engine` façade, one per
//! concrete example in the operation design notes: a full module on disk,
//! a plan built and executed, and the resulting file contents checked.

use gorefactor::config::WorkspaceConfig;
use gorefactor::Engine;

use gorefactor::ops::change_signature::{ChangeSignatureRequest, SignatureChange};
use gorefactor::ops::analyze::FixCyclesRequest;
use gorefactor::ops::extract_function::ExtractFunctionRequest;
use gorefactor::ops::rename::{RenameMethodRequest, RenameSymbolRequest};

fn module(dir: &std::path::Path, files: &[(&str, &str)]) {
    std::fs::write(dir.join("go.mod"), "module example.com/app\n\ngo 1.22\n").unwrap();
    for (name, source) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, source).unwrap();
    }
}

#[test]
fn rename_updates_declaration_and_every_call_site() {
    let dir = tempfile::tempdir().unwrap();
    module(
        dir.path(),
        &[("a.go", "package main\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n\nfunc main() {\n\tAdd(1, 2)\n}\n")],
    );
    let engine = Engine::load_workspace(dir.path(), WorkspaceConfig::default()).unwrap();

    let plan = engine
        .rename_symbol(&RenameSymbolRequest {
            name: "Add".to_string(),
            new_name: "Sum".to_string(),
            package: None,
            allow_breaking: false,
        })
        .unwrap();
    assert_eq!(plan.changes.len(), 2);
    engine.execute(&plan).unwrap();

    let text = std::fs::read_to_string(dir.path().join("a.go")).unwrap();
    assert!(text.contains("func Sum"));
    assert!(text.contains("Sum(1, 2)"));
    assert!(!text.contains("Add"));
}

#[test]
fn extract_method_replaces_statements_with_a_call_and_appends_a_method() {
    let dir = tempfile::tempdir().unwrap();
    module(
        dir.path(),
        &[(
            "calc.go",
            "package x\n\ntype C struct {\n\tr int\n}\n\nfunc (c *C) Process(a, b int) {\n\tsum := a + b\n\tc.r = sum * 2\n}\n",
        )],
    );
    let engine = Engine::load_workspace(dir.path(), WorkspaceConfig::default()).unwrap();

    let plan = engine
        .extract_function(&ExtractFunctionRequest {
            file: dir.path().join("calc.go"),
            start_line: 8,
            end_line: 9,
            new_name: "computeResult".to_string(),
            receiver_type: Some("C".to_string()),
        })
        .unwrap();
    assert!(plan.changes.iter().any(|c| c.new_text.contains("c.computeResult(a, b)")));
    engine.execute(&plan).unwrap();

    let text = std::fs::read_to_string(dir.path().join("calc.go")).unwrap();
    assert!(text.contains("func (c *C) computeResult(a int, b int)"));
    assert!(text.contains("c.computeResult(a, b)"));
    assert!(text.contains("Process"));
}

#[test]
fn rename_method_propagates_to_every_implementation() {
    let dir = tempfile::tempdir().unwrap();
    module(
        dir.path(),
        &[(
            "w.go",
            "package x\n\ntype W interface {\n\tWriteData(s string) error\n}\n\ntype FileW struct{}\n\nfunc (f *FileW) WriteData(s string) error {\n\treturn nil\n}\n\ntype NetW struct{}\n\nfunc (n *NetW) WriteData(s string) error {\n\treturn nil\n}\n",
        )],
    );
    let engine = Engine::load_workspace(dir.path(), WorkspaceConfig::default()).unwrap();

    let plan = engine
        .rename_method(&RenameMethodRequest {
            receiver_type: "FileW".to_string(),
            method: "WriteData".to_string(),
            new_method: "Write".to_string(),
            package: None,
            propagate_to_implementations: true,
        })
        .unwrap();
    engine.execute(&plan).unwrap();

    let text = std::fs::read_to_string(dir.path().join("w.go")).unwrap();
    assert!(text.contains("func (f *FileW) Write("));
    assert!(text.contains("func (n *NetW) Write("));
}

#[test]
fn fix_cycles_without_auto_fix_reports_the_cycle() {
    let dir = tempfile::tempdir().unwrap();
    module(
        dir.path(),
        &[
            ("a/a.go", "package a\n\nimport \"example.com/app/b\"\n\nfunc UseB() {\n\tb.Helper()\n}\n\nfunc Helper() {}\n"),
            ("b/b.go", "package b\n\nimport \"example.com/app/a\"\n\nfunc Helper() {\n\ta.UseB()\n}\n"),
        ],
    );
    let engine = Engine::load_workspace(dir.path(), WorkspaceConfig::default()).unwrap();

    let plan = engine.fix_cycles(&FixCyclesRequest { auto_fix: false }).unwrap();
    assert!(!plan.impact.issues.is_empty());
    assert!(plan.changes.is_empty());
}

#[test]
fn change_signature_add_param_rewrites_declaration_and_call_sites() {
    let dir = tempfile::tempdir().unwrap();
    module(
        dir.path(),
        &[(
            "greet.go",
            "package main\n\nfunc Greet(name string) string {\n\treturn name\n}\n\nfunc main() {\n\tGreet(\"Ada\")\n}\n",
        )],
    );
    let engine = Engine::load_workspace(dir.path(), WorkspaceConfig::default()).unwrap();

    let plan = engine
        .change_signature(&ChangeSignatureRequest {
            name: "Greet".to_string(),
            package: "example.com/app".to_string(),
            receiver_type: None,
            change: SignatureChange::AddParam {
                position: 0,
                name: "greeting".to_string(),
                type_text: "string".to_string(),
                default_value: "\"Hello\"".to_string(),
            },
            propagate_to_interface: false,
        })
        .unwrap();
    engine.execute(&plan).unwrap();

    let text = std::fs::read_to_string(dir.path().join("greet.go")).unwrap();
    assert!(text.contains("func Greet(greeting string, name string) string"));
    assert!(text.contains("Greet(\"Hello\", \"Ada\")"));
}
