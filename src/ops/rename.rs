//! Rename Symbol and Rename Method (§4.6).

use crate::base::is_valid_identifier;
use crate::error::{GorefactorError, Result};
use crate::model::{QualifiedSymbolId, Symbol, Workspace};
use crate::plan::{Change, Issue, OperationKind, RefactoringPlan};

use super::{decl_name_token, reference_range};

#[derive(Debug, Clone)]
pub struct RenameSymbolRequest {
    pub name: String,
    pub new_name: String,
    /// Restricts the search to one package's top-level declarations; `None`
    /// searches the whole workspace and fails `InvalidOperation` if more
    /// than one package declares a top-level symbol of that name.
    pub package: Option<String>,
    /// Accept the rename even if it would flip the exported/unexported bit
    /// with outstanding external references, rather than only warning.
    pub allow_breaking: bool,
}

#[derive(Debug, Clone)]
pub struct RenameMethodRequest {
    pub receiver_type: String,
    pub method: String,
    pub new_method: String,
    pub package: Option<String>,
    pub propagate_to_implementations: bool,
}

pub fn validate_rename_symbol(request: &RenameSymbolRequest) -> Result<()> {
    if !is_valid_identifier(&request.new_name) {
        return Err(GorefactorError::invalid(format!(
            "'{}' is not a valid identifier",
            request.new_name
        )));
    }
    Ok(())
}

/// Locates every top-level (non-method) symbol named `name`, optionally
/// restricted to one package.
fn find_top_level<'a>(
    workspace: &'a Workspace,
    name: &str,
    package: Option<&str>,
) -> Vec<(&'a str, &'a Symbol)> {
    workspace
        .packages
        .iter()
        .filter(|(import_path, _)| package.is_none_or(|p| p == *import_path))
        .filter_map(|(import_path, pkg)| {
            pkg.symbols
                .by_name(name)
                .filter(|s| !s.is_method())
                .map(|s| (import_path.as_str(), s))
        })
        .collect()
}

pub fn rename_symbol(workspace: &Workspace, request: &RenameSymbolRequest) -> Result<RefactoringPlan> {
    validate_rename_symbol(request)?;

    let candidates = find_top_level(workspace, &request.name, request.package.as_deref());
    let (package_path, symbol) = match candidates.as_slice() {
        [] => return Err(GorefactorError::symbol_not_found(&request.name)),
        [one] => *one,
        _ => {
            return Err(GorefactorError::invalid(format!(
                "'{}' is declared in more than one package; specify a package scope",
                request.name
            )))
        }
    };

    let package = workspace.require_package(package_path)?;
    if package.symbols.by_name(&request.new_name).is_some() {
        return Err(GorefactorError::name_conflict(&request.new_name));
    }

    let mut changes = Vec::new();
    let mut issues = Vec::new();

    let decl_file = package.file(&symbol.file).ok_or_else(|| GorefactorError::symbol_not_found(symbol.name.as_str()))?;
    let name_token = decl_name_token(decl_file, symbol)
        .ok_or_else(|| GorefactorError::invalid(format!("could not locate declaration of '{}'", symbol.name)))?;
    changes.push(Change::new(
        symbol.file.clone(),
        name_token.text_range(),
        symbol.name.to_string(),
        request.new_name.clone(),
        format!("rename declaration of {}", symbol.name),
    ));

    let qualified = symbol.qualified_id();
    collect_reference_changes(workspace, &qualified, &symbol.name, &request.new_name, &mut changes)?;

    let crosses_packages = workspace
        .references
        .references_to(&qualified)
        .iter()
        .any(|r| r.use_site_package != package.import_path);
    let flips_visibility = crate::base::is_exported(&symbol.name) != crate::base::is_exported(&request.new_name);
    if flips_visibility && crosses_packages && !request.allow_breaking {
        issues.push(Issue::warning(
            crate::plan::IssueKind::VisibilityChange,
            format!(
                "renaming '{}' to '{}' changes its exported-ness and external references exist",
                symbol.name, request.new_name
            ),
        ));
    }

    Ok(RefactoringPlan::new(
        OperationKind::RenameSymbol,
        format!("rename {} to {}", symbol.name, request.new_name),
    )
    .with_changes(changes)
    .with_issues(issues))
}

pub fn rename_method(workspace: &Workspace, request: &RenameMethodRequest) -> Result<RefactoringPlan> {
    if !is_valid_identifier(&request.new_method) {
        return Err(GorefactorError::invalid(format!("'{}' is not a valid identifier", request.new_method)));
    }

    let packages: Vec<&str> = match &request.package {
        Some(p) => vec![p.as_str()],
        None => workspace.packages.keys().map(String::as_str).collect(),
    };

    let mut found = None;
    for import_path in &packages {
        let package = workspace.require_package(import_path)?;
        if let Some(symbol) = package.symbols.method(&request.receiver_type, &request.method) {
            if found.is_some() {
                return Err(GorefactorError::invalid(format!(
                    "method '{}' on '{}' found in more than one package",
                    request.method, request.receiver_type
                )));
            }
            found = Some((*import_path, symbol));
        }
    }
    let (package_path, symbol) = found.ok_or_else(|| GorefactorError::symbol_not_found(&request.method))?;
    let package = workspace.require_package(package_path)?;

    if package.symbols.method(&request.receiver_type, &request.new_method).is_some() {
        return Err(GorefactorError::name_conflict(&request.new_method));
    }

    let mut changes = Vec::new();
    let decl_file = package.file(&symbol.file).ok_or_else(|| GorefactorError::symbol_not_found(symbol.name.as_str()))?;
    let name_token = decl_name_token(decl_file, symbol)
        .ok_or_else(|| GorefactorError::invalid(format!("could not locate method '{}'", symbol.name)))?;
    changes.push(Change::new(
        symbol.file.clone(),
        name_token.text_range(),
        symbol.name.to_string(),
        request.new_method.clone(),
        format!("rename method {}.{}", request.receiver_type, symbol.name),
    ));

    let qualified = symbol.qualified_id();
    collect_reference_changes(workspace, &qualified, &symbol.name, &request.new_method, &mut changes)?;

    if request.propagate_to_implementations {
        // Best-effort structural propagation: every other method in the
        // workspace with the same name is treated as a structural
        // implementation, mirroring the reference collector's own
        // best-effort method-matching rule (§4.2 rule c).
        for other_package in workspace.packages.values() {
            for other_symbol in other_package.symbols.iter() {
                if other_symbol.is_method()
                    && other_symbol.name == symbol.name
                    && other_symbol.receiver_type != symbol.receiver_type
                {
                    let Some(file) = other_package.file(&other_symbol.file) else {
                        continue;
                    };
                    let Some(token) = decl_name_token(file, other_symbol) else {
                        continue;
                    };
                    changes.push(Change::new(
                        other_symbol.file.clone(),
                        token.text_range(),
                        other_symbol.name.to_string(),
                        request.new_method.clone(),
                        format!(
                            "rename method {}.{} (implementation)",
                            other_symbol.receiver_type.clone().unwrap_or_default(),
                            other_symbol.name
                        ),
                    ));
                    let other_qualified = other_symbol.qualified_id();
                    collect_reference_changes(workspace, &other_qualified, &other_symbol.name, &request.new_method, &mut changes)?;
                }
            }
        }
    }

    Ok(RefactoringPlan::new(
        OperationKind::RenameMethod,
        format!("rename method {}.{} to {}", request.receiver_type, symbol.name, request.new_method),
    )
    .with_changes(changes))
}

fn collect_reference_changes(
    workspace: &Workspace,
    symbol_id: &QualifiedSymbolId,
    old_name: &str,
    new_name: &str,
    changes: &mut Vec<Change>,
) -> Result<()> {
    for reference in workspace.references.references_to(symbol_id) {
        let Some(package) = workspace.package(&reference.use_site_package) else {
            continue;
        };
        let Some(file) = package.file(&reference.file) else {
            continue;
        };
        let Some(range) = reference_range(file, &reference.span, old_name.len()) else {
            continue;
        };
        changes.push(Change::new(
            reference.file.clone(),
            range,
            old_name.to_string(),
            new_name.to_string(),
            format!("rename reference to {old_name}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolver;
    use std::path::PathBuf;

    fn workspace_with(source: &str) -> Workspace {
        let mut ws = Workspace::new(PathBuf::from("/ws"), "example.com/app".to_string());
        let mut package = crate::model::Package::new(
            "example.com/app".to_string(),
            smol_str::SmolStr::new("app"),
            PathBuf::from("/ws"),
        );
        let path = PathBuf::from("/ws/main.go");
        package.files.insert(path.clone(), crate::model::File::load(path, source.to_string()));
        ws.packages.insert("example.com/app".to_string(), package);
        ws
    }

    #[test]
    fn renames_declaration_and_call_site() {
        let mut ws = workspace_with(
            "package app\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n\nfunc main() {\n\tAdd(1, 2)\n}\n",
        );
        Resolver::new().ensure_fresh(&mut ws);

        let request = RenameSymbolRequest {
            name: "Add".to_string(),
            new_name: "Sum".to_string(),
            package: None,
            allow_breaking: false,
        };
        let plan = rename_symbol(&ws, &request).unwrap();
        assert_eq!(plan.changes.len(), 2);
        assert!(plan.changes.iter().all(|c| c.new_text == "Sum"));
    }

    #[test]
    fn rejects_conflicting_new_name() {
        let mut ws = workspace_with("package app\n\nfunc Add() {}\n\nfunc Sum() {}\n");
        Resolver::new().ensure_fresh(&mut ws);

        let request = RenameSymbolRequest {
            name: "Add".to_string(),
            new_name: "Sum".to_string(),
            package: None,
            allow_breaking: false,
        };
        assert!(rename_symbol(&ws, &request).is_err());
    }

    #[test]
    fn rejects_invalid_identifier() {
        let mut ws = workspace_with("package app\n\nfunc Add() {}\n");
        Resolver::new().ensure_fresh(&mut ws);

        let request = RenameSymbolRequest {
            name: "Add".to_string(),
            new_name: "1-bad".to_string(),
            package: None,
            allow_breaking: false,
        };
        assert!(rename_symbol(&ws, &request).is_err());
    }
}
