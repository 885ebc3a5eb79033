//! Safe Delete (§4.14): removes a declaration only when nothing still
//! refers to it, unless the caller explicitly forces a destructive delete.

use crate::error::{GorefactorError, Result};
use crate::model::Workspace;
use crate::plan::{Change, Issue, IssueKind, OperationKind, RefactoringPlan};

use super::{decl_node, full_declaration_range, reference_range};

#[derive(Debug, Clone)]
pub struct SafeDeleteRequest {
    pub name: String,
    pub package: String,
    pub force: bool,
}

pub fn safe_delete(workspace: &Workspace, request: &SafeDeleteRequest) -> Result<RefactoringPlan> {
    let package = workspace.require_package(&request.package)?;
    let symbol = package
        .symbols
        .by_name(&request.name)
        .ok_or_else(|| GorefactorError::symbol_not_found(&request.name))?;

    let decl_file = package.file(&symbol.file).ok_or_else(|| GorefactorError::symbol_not_found(symbol.name.as_str()))?;
    let node = decl_node(decl_file, symbol)
        .ok_or_else(|| GorefactorError::invalid(format!("could not locate declaration of '{}'", symbol.name)))?;
    let full_range = full_declaration_range(decl_file, node.text_range());

    let qualified = symbol.qualified_id();
    let references = workspace.references.references_to(&qualified);

    if !references.is_empty() && !request.force {
        let sites: Vec<String> = references
            .iter()
            .map(|r| format!("{}:{}", r.file.display(), r.span.start.line))
            .collect();
        return Err(GorefactorError::invalid(format!(
            "'{}' is still referenced at {} (pass force to delete anyway)",
            symbol.name,
            sites.join(", ")
        )));
    }

    let mut changes = vec![Change::new(
        symbol.file.clone(),
        full_range,
        decl_file.text[usize::from(full_range.start())..usize::from(full_range.end())].to_string(),
        String::new(),
        format!("delete declaration of {}", symbol.name),
    )];
    let mut issues = Vec::new();

    if !references.is_empty() {
        issues.push(Issue::warning(
            IssueKind::UnusedAfterDelete,
            format!(
                "force-deleted '{}' while {} reference(s) still existed; those call/use sites were removed too",
                symbol.name,
                references.len()
            ),
        ));
        for reference in references {
            let Some(ref_package) = workspace.package(&reference.use_site_package) else {
                continue;
            };
            let Some(ref_file) = ref_package.file(&reference.file) else {
                continue;
            };
            if let Some(range) = reference_range(ref_file, &reference.span, symbol.name.len()) {
                let whole_line = line_containing(&ref_file.text, range.start());
                changes.push(Change::new(
                    reference.file.clone(),
                    whole_line,
                    ref_file.text[usize::from(whole_line.start())..usize::from(whole_line.end())].to_string(),
                    String::new(),
                    format!("remove reference to deleted symbol {}", symbol.name),
                ));
            }
        }
    }

    changes.sort_by_key(|c| c.range.start());
    changes.dedup_by(|a, b| a.range == b.range && a.file == b.file);

    Ok(RefactoringPlan::new(OperationKind::SafeDelete, format!("delete {}", symbol.name))
        .with_changes(changes)
        .with_issues(issues))
}

fn line_containing(text: &str, offset: text_size::TextSize) -> text_size::TextRange {
    let offset: usize = offset.into();
    let start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[offset..].find('\n').map(|i| offset + i + 1).unwrap_or(text.len());
    text_size::TextRange::new((start as u32).into(), (end as u32).into())
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
    fn deletes_an_unreferenced_function() {
        let mut ws = workspace_with("package app\n\nfunc Unused() {}\n\nfunc main() {}\n");
        Resolver::new().ensure_fresh(&mut ws);

        let request = SafeDeleteRequest { name: "Unused".to_string(), package: "example.com/app".to_string(), force: false };
        let plan = safe_delete(&ws, &request).unwrap();
        assert_eq!(plan.changes.len(), 1);
        assert!(plan.changes[0].old_text.contains("func Unused"));
    }

    #[test]
    fn rejects_deleting_a_referenced_function_without_force() {
        let mut ws = workspace_with("package app\n\nfunc Helper() {}\n\nfunc main() {\n\tHelper()\n}\n");
        Resolver::new().ensure_fresh(&mut ws);

        let request = SafeDeleteRequest { name: "Helper".to_string(), package: "example.com/app".to_string(), force: false };
        assert!(safe_delete(&ws, &request).is_err());
    }

    #[test]
    fn rejects_deleting_a_function_referenced_only_via_a_short_var_decl_initializer() {
        let mut ws = workspace_with(
            "package app\n\nfunc Helper() int {\n\treturn 1\n}\n\nfunc main() {\n\tresult := Helper()\n\t_ = result\n}\n",
        );
        Resolver::new().ensure_fresh(&mut ws);

        let request = SafeDeleteRequest { name: "Helper".to_string(), package: "example.com/app".to_string(), force: false };
        assert!(safe_delete(&ws, &request).is_err());
    }

    #[test]
    fn force_deletes_a_referenced_function_and_warns() {
        let mut ws = workspace_with("package app\n\nfunc Helper() {}\n\nfunc main() {\n\tHelper()\n}\n");
        Resolver::new().ensure_fresh(&mut ws);

        let request = SafeDeleteRequest { name: "Helper".to_string(), package: "example.com/app".to_string(), force: true };
        let plan = safe_delete(&ws, &request).unwrap();
        assert!(plan.impact.issues.iter().any(|i| i.kind == IssueKind::UnusedAfterDelete));
        assert!(plan.changes.len() >= 2);
    }
}
