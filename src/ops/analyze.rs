//! Dependency analysis: cycle detection/fixing and layer verification
//! (§6 `AnalyzeDependencies` / `FixCycles` / `OrganizeByLayers`).

use crate::error::Result;
use crate::model::Workspace;
use crate::plan::{Issue, IssueKind, OperationKind, RefactoringPlan};

#[derive(Debug, Clone)]
pub struct LayerSpec {
    pub name: String,
    pub level: u32,
    pub dir_prefix: String,
}

#[derive(Debug, Clone)]
pub struct FixCyclesRequest {
    pub auto_fix: bool,
}

#[derive(Debug, Clone)]
pub struct OrganizeByLayersRequest {
    pub layers: Vec<LayerSpec>,
}

/// Read-only report: one `Issue` per cycle, no changes. Callers that want
/// the automatic fix use [`fix_cycles`] with `auto_fix = true`.
pub fn analyze_dependencies(workspace: &Workspace) -> Result<RefactoringPlan> {
    let cycles = workspace.import_graph.cycles();
    let issues = cycles
        .iter()
        .map(|cycle| Issue::warning(IssueKind::Cycle, format!("import cycle: {}", cycle.join(" -> "))))
        .collect();
    Ok(RefactoringPlan::new(OperationKind::FixCycles, format!("{} import cycle(s) found", cycles.len())).with_issues(issues))
}

/// Symbols package `from` exports that `to` actually references — the
/// candidates for extraction when collapsing a cycle edge.
fn exposed_symbols(workspace: &Workspace, from: &str, to: &str) -> Vec<String> {
    let Some(package) = workspace.package(from) else { return Vec::new() };
    package
        .symbols
        .iter()
        .filter(|s| s.is_exported() && !s.is_method())
        .filter(|s| workspace.references.references_to(&s.qualified_id()).iter().any(|r| r.use_site_package == to))
        .map(|s| s.name.to_string())
        .collect()
}

pub fn fix_cycles(workspace: &Workspace, request: &FixCyclesRequest) -> Result<RefactoringPlan> {
    let cycles = workspace.import_graph.cycles();
    if !request.auto_fix {
        return analyze_dependencies(workspace);
    }

    let mut issues = Vec::new();
    let mut changes = Vec::new();
    for cycle in &cycles {
        if cycle.len() < 2 {
            continue;
        }
        // PackageGraph doesn't expose per-edge fan-in, so the edge nearest
        // the start of the reported cycle is the one collapsed.
        let from = &cycle[0];
        let to = &cycle[1];
        let symbols = exposed_symbols(workspace, from, to);
        if symbols.is_empty() {
            issues.push(Issue::warning(
                IssueKind::Cycle,
                format!("cycle {} could not be broken automatically: no referenced exports found on {from} -> {to}", cycle.join(" -> ")),
            ));
            continue;
        }
        let shorter = if from.len() <= to.len() { from } else { to };
        let short_name = shorter.rsplit('/').next().unwrap_or(shorter);
        let new_name = format!("{short_name}iface");
        issues.push(Issue::info(
            IssueKind::Cycle,
            format!(
                "cycle {} broken by extracting {} from {from} into a new package depended on by {from} and {to}",
                cycle.join(" -> "),
                symbols.join(", ")
            ),
        ));
        let Some(package) = workspace.package(from) else { continue };
        let extracted = symbols
            .iter()
            .filter_map(|name| package.symbols.by_name(name))
            .filter_map(|s| package.file(&s.file).and_then(|f| super::decl_node(f, s).map(|n| n.text().to_string())))
            .collect::<Vec<_>>()
            .join("\n\n");
        let stub_dir = package.dir.with_file_name(&new_name);
        changes.push(crate::plan::Change::new(
            stub_dir.join(format!("{new_name}.go")),
            text_size::TextRange::new(0.into(), 0.into()),
            String::new(),
            format!("package {new_name}\n\n{extracted}\n"),
            format!("stub package extracted from cycle {from} -> {to}"),
        ));
    }

    Ok(RefactoringPlan::new(OperationKind::FixCycles, format!("auto-fixing {} import cycle(s)", cycles.len()))
        .with_changes(changes)
        .with_issues(issues)
        .irreversible())
}

pub fn organize_by_layers(workspace: &Workspace, request: &OrganizeByLayersRequest) -> Result<RefactoringPlan> {
    let mut layer_of = std::collections::HashMap::new();
    for package in workspace.packages.values() {
        let dir = package.dir.to_string_lossy();
        if let Some(layer) = request
            .layers
            .iter()
            .filter(|l| dir.contains(&l.dir_prefix))
            .max_by_key(|l| l.dir_prefix.len())
        {
            layer_of.insert(package.import_path.clone(), layer.level);
        }
    }

    let mut issues = Vec::new();
    for package in workspace.packages.values() {
        let Some(&from_level) = layer_of.get(&package.import_path) else { continue };
        for import in &package.imports {
            let Some(&to_level) = layer_of.get(&import.path) else { continue };
            if to_level > from_level {
                issues.push(Issue::error(
                    IssueKind::LayerViolation,
                    format!("{} (layer {from_level}) depends on {} (layer {to_level}), which should depend inward only", package.import_path, import.path),
                ));
            }
        }
    }

    Ok(RefactoringPlan::new(OperationKind::OrganizeByLayers, format!("checked {} layer(s)", request.layers.len())).with_issues(issues))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{File, Package};
    use crate::resolver::Resolver;
    use smol_str::SmolStr;
    use std::path::PathBuf;

    fn two_package_cycle() -> Workspace {
        let mut ws = Workspace::new(PathBuf::from("/ws"), "example.com/app".to_string());

        let mut a = Package::new("example.com/app/a".to_string(), SmolStr::new("a"), PathBuf::from("/ws/a"));
        let a_path = PathBuf::from("/ws/a/a.go");
        a.files.insert(a_path.clone(), File::load(a_path, "package a\n\nimport \"example.com/app/b\"\n\nfunc UseB() {\n\tb.Helper()\n}\n\nfunc Helper() {}\n".to_string()));
        ws.packages.insert(a.import_path.clone(), a);

        let mut b = Package::new("example.com/app/b".to_string(), SmolStr::new("b"), PathBuf::from("/ws/b"));
        let b_path = PathBuf::from("/ws/b/b.go");
        b.files.insert(b_path.clone(), File::load(b_path, "package b\n\nimport \"example.com/app/a\"\n\nfunc Helper() {\n\ta.UseB()\n}\n".to_string()));
        ws.packages.insert(b.import_path.clone(), b);

        Resolver::new().ensure_fresh(&mut ws);
        ws
    }

    #[test]
    fn reports_a_cycle_without_auto_fix() {
        let ws = two_package_cycle();
        let plan = fix_cycles(&ws, &FixCyclesRequest { auto_fix: false }).unwrap();
        assert!(plan.impact.issues.iter().any(|i| i.kind == IssueKind::Cycle));
        assert!(plan.changes.is_empty());
    }

    #[test]
    fn flags_a_layer_violation() {
        let ws = two_package_cycle();
        let layers = vec![
            LayerSpec { name: "core".to_string(), level: 0, dir_prefix: "/ws/a".to_string() },
            LayerSpec { name: "outer".to_string(), level: 1, dir_prefix: "/ws/b".to_string() },
        ];
        let plan = organize_by_layers(&ws, &OrganizeByLayersRequest { layers }).unwrap();
        assert!(plan.impact.issues.iter().any(|i| i.kind == IssueKind::LayerViolation));
    }
}
