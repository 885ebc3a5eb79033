//! Move Package / Move Directory / Move Packages / Rename Package (§4.8,
//! SPEC_FULL.md §B.4). The first three share one import-rewriter; Rename
//! Package only ever touches the package's own declared-name token.

use std::path::PathBuf;

use crate::error::{GorefactorError, Result};
use crate::model::Workspace;
use crate::parser::AstNode;
use crate::plan::{Change, OperationKind, RefactoringPlan};

#[derive(Debug, Clone)]
pub struct MovePackageRequest {
    pub old_import_path: String,
    pub new_import_path: String,
}

#[derive(Debug, Clone)]
pub struct MoveDirRequest {
    /// Import-path prefix of the subtree being moved.
    pub old_prefix: String,
    pub new_prefix: String,
}

#[derive(Debug, Clone)]
pub struct MovePackagesRequest {
    pub moves: Vec<MovePackageRequest>,
}

#[derive(Debug, Clone)]
pub struct RenamePackageRequest {
    pub import_path: String,
    pub new_name: String,
}

/// Rewrites every import in the workspace whose path starts with
/// `old_prefix` to the corresponding path under `new_prefix`, one `Change`
/// per rewritten import spec (§4.8 "common import-rewriter").
fn rewrite_imports(workspace: &Workspace, old_prefix: &str, new_prefix: &str, changes: &mut Vec<Change>) {
    for package in workspace.packages.values() {
        for file in package.files.values() {
            let Some(source_file) = file.source_file() else {
                continue;
            };
            for import_decl in source_file.imports() {
                for spec in import_decl.specs() {
                    let Some(path) = spec.path() else { continue };
                    let rewritten = if path == old_prefix {
                        Some(new_prefix.to_string())
                    } else {
                        path.strip_prefix(&format!("{old_prefix}/"))
                            .map(|rest| format!("{new_prefix}/{rest}"))
                    };
                    let Some(rewritten) = rewritten else { continue };
                    let Some(token) = spec.path_token() else { continue };
                    changes.push(Change::new(
                        file.path.clone(),
                        token.text_range(),
                        token.text().to_string(),
                        format!("\"{rewritten}\""),
                        format!("rewrite import {path} -> {rewritten}"),
                    ));
                }
            }
        }
    }
}

pub fn move_package(workspace: &Workspace, request: &MovePackageRequest) -> Result<RefactoringPlan> {
    workspace.require_package(&request.old_import_path)?;
    if workspace.package(&request.new_import_path).is_some() {
        return Err(GorefactorError::name_conflict(&request.new_import_path));
    }

    let mut changes = Vec::new();
    rewrite_imports(workspace, &request.old_import_path, &request.new_import_path, &mut changes);

    Ok(RefactoringPlan::new(
        OperationKind::MovePackage,
        format!("move package {} to {}", request.old_import_path, request.new_import_path),
    )
    .with_changes(changes))
}

pub fn move_dir(workspace: &Workspace, request: &MoveDirRequest) -> Result<RefactoringPlan> {
    let moved: Vec<&String> = workspace
        .packages
        .keys()
        .filter(|p| *p == &request.old_prefix || p.starts_with(&format!("{}/", request.old_prefix)))
        .collect();
    if moved.is_empty() {
        return Err(GorefactorError::symbol_not_found(&request.old_prefix));
    }

    let mut changes = Vec::new();
    rewrite_imports(workspace, &request.old_prefix, &request.new_prefix, &mut changes);

    Ok(RefactoringPlan::new(
        OperationKind::MoveDir,
        format!("move directory {} to {}", request.old_prefix, request.new_prefix),
    )
    .with_changes(changes))
}

/// Runs every sub-move against the same workspace snapshot and unions the
/// import rewrites into one plan; if any sub-move fails validation the
/// whole batch is rejected rather than partially applied (§4.8).
pub fn move_packages(workspace: &Workspace, request: &MovePackagesRequest) -> Result<RefactoringPlan> {
    let mut changes = Vec::new();
    let mut descriptions = Vec::new();
    for sub in &request.moves {
        workspace.require_package(&sub.old_import_path)?;
        if workspace.package(&sub.new_import_path).is_some() {
            return Err(GorefactorError::name_conflict(&sub.new_import_path));
        }
        rewrite_imports(workspace, &sub.old_import_path, &sub.new_import_path, &mut changes);
        descriptions.push(format!("{} -> {}", sub.old_import_path, sub.new_import_path));
    }

    Ok(RefactoringPlan::new(OperationKind::MovePackage, format!("move packages: {}", descriptions.join(", ")))
        .with_changes(changes))
}

/// Rewrites only the `package <name>` clause's name token across every
/// file in the package, leaving its import path and directory untouched
/// (distinct from [`move_package`], SPEC_FULL.md §B.4).
pub fn rename_package(workspace: &Workspace, request: &RenamePackageRequest) -> Result<RefactoringPlan> {
    let package = workspace.require_package(&request.import_path)?;
    if !crate::base::is_valid_identifier(&request.new_name) {
        return Err(GorefactorError::invalid(format!("'{}' is not a valid identifier", request.new_name)));
    }

    let mut changes = Vec::new();
    for file in package.files.values() {
        let Some(source_file) = file.source_file() else {
            continue;
        };
        let Some(clause) = source_file.package_clause() else {
            continue;
        };
        let Some(name_token) = clause.name() else {
            continue;
        };
        if name_token.text() == request.new_name {
            continue;
        }
        changes.push(Change::new(
            file.path.clone(),
            name_token.text_range(),
            name_token.text().to_string(),
            request.new_name.clone(),
            "rename package clause".to_string(),
        ));
    }

    Ok(RefactoringPlan::new(
        OperationKind::RenamePackage,
        format!("rename package {} to {}", package.name, request.new_name),
    )
    .with_changes(changes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use smol_str::SmolStr;

    fn workspace_with(files: &[(&str, &str, &str)]) -> Workspace {
        let mut ws = Workspace::new(PathBuf::from("/ws"), "example.com/app".to_string());
        for (import_path, file_name, source) in files {
            let package = ws.packages.entry((*import_path).to_string()).or_insert_with(|| {
                crate::model::Package::new((*import_path).to_string(), SmolStr::new("pkg"), PathBuf::from(import_path))
            });
            let path = PathBuf::from(import_path).join(file_name);
            package.files.insert(path.clone(), crate::model::File::load(path, (*source).to_string()));
        }
        ws
    }

    #[test]
    fn move_package_rewrites_importers() {
        let ws = workspace_with(&[
            ("example.com/app/billing", "billing.go", "package billing\n\nfunc Charge() {}\n"),
            (
                "example.com/app/main",
                "main.go",
                "package main\n\nimport \"example.com/app/billing\"\n\nfunc run() { billing.Charge() }\n",
            ),
        ]);

        let request = MovePackageRequest {
            old_import_path: "example.com/app/billing".to_string(),
            new_import_path: "example.com/app/payments".to_string(),
        };
        let plan = move_package(&ws, &request).unwrap();
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].new_text, "\"example.com/app/payments\"");
    }

    #[test]
    fn rename_package_only_touches_declared_name() {
        let ws = workspace_with(&[("example.com/app/billing", "billing.go", "package billing\n\nfunc Charge() {}\n")]);
        let request = RenamePackageRequest {
            import_path: "example.com/app/billing".to_string(),
            new_name: "payments".to_string(),
        };
        let plan = rename_package(&ws, &request).unwrap();
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].new_text, "payments");
    }
}
