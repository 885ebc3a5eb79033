//! Move Symbol (§4.7): relocates one top-level declaration from its source
//! package to a target package, rewriting every cross-package import that
//! the move requires.

use std::path::PathBuf;

use crate::error::{GorefactorError, Result};
use crate::model::Workspace;
use crate::plan::{Change, Issue, IssueKind, OperationKind, RefactoringPlan};

use super::{decl_node, full_declaration_range};

#[derive(Debug, Clone)]
pub struct MoveSymbolRequest {
    pub symbol: String,
    pub from_package: String,
    pub to_package: String,
    pub create_target: bool,
    pub allow_breaking: bool,
}

pub fn move_symbol(workspace: &Workspace, request: &MoveSymbolRequest) -> Result<RefactoringPlan> {
    let source = workspace.require_package(&request.from_package)?;
    let target_exists = workspace.package(&request.to_package).is_some();
    if !target_exists && !request.create_target {
        return Err(GorefactorError::symbol_not_found(&request.to_package));
    }

    let symbol = source
        .symbols
        .by_name(&request.symbol)
        .filter(|s| !s.is_method())
        .ok_or_else(|| GorefactorError::symbol_not_found(&request.symbol))?;

    if workspace
        .import_graph
        .would_create_cycle(&request.to_package, &request.from_package)
        && !request.allow_breaking
    {
        return Err(GorefactorError::CyclicDependency {
            cycle: vec![request.from_package.clone(), request.to_package.clone()],
        });
    }

    let decl_file = source.file(&symbol.file).ok_or_else(|| GorefactorError::symbol_not_found(symbol.name.as_str()))?;
    let node = decl_node(decl_file, symbol)
        .ok_or_else(|| GorefactorError::invalid(format!("could not locate declaration of '{}'", symbol.name)))?;
    let full_range = full_declaration_range(decl_file, node.text_range());
    let declaration_text = decl_file.text[usize::from(node.text_range().start())..usize::from(full_range.end())]
        .to_string();

    let mut changes = vec![Change::new(
        symbol.file.clone(),
        full_range,
        declaration_text.clone(),
        String::new(),
        format!("remove {} from {}", symbol.name, request.from_package),
    )];

    let target_file = if target_exists {
        let target = workspace.require_package(&request.to_package)?;
        target.files.keys().next().cloned()
    } else {
        None
    };

    match target_file {
        Some(path) => {
            let target_pkg = workspace.require_package(&request.to_package)?;
            let file = target_pkg.file(&path).expect("just listed");
            let insert_at = text_size::TextSize::from(file.text.len() as u32);
            changes.push(Change::new(
                path,
                text_size::TextRange::new(insert_at, insert_at),
                String::new(),
                format!("\n{declaration_text}"),
                format!("insert {} into {}", symbol.name, request.to_package),
            ));
        }
        None => {
            let dir = workspace
                .dir_for_import_path(&request.to_package)
                .unwrap_or_else(|| PathBuf::from(&request.to_package));
            let package_name = request.to_package.rsplit('/').next().unwrap_or("main");
            let stub_path = dir.join(format!("{}.go", symbol.name.to_lowercase()));
            changes.push(Change::new(
                stub_path,
                text_size::TextRange::new(0.into(), 0.into()),
                String::new(),
                format!("package {package_name}\n\n{declaration_text}"),
                format!("create {} with {}", request.to_package, symbol.name),
            ));
        }
    }

    let qualified = symbol.qualified_id();
    let mut touched_files: std::collections::BTreeSet<PathBuf> = std::collections::BTreeSet::new();
    for reference in workspace.references.references_to(&qualified) {
        if reference.use_site_package != request.from_package {
            touched_files.insert(reference.file.clone());
        }
    }

    let decl_span = crate::base::Span::new(decl_file.line_index.line_col(node.text_range().start()), decl_file.line_index.line_col(full_range.end()));
    let co_move_candidates: Vec<&str> = source
        .symbols
        .iter()
        .filter(|s| !s.is_exported() && !s.is_method() && s.name.as_str() != symbol.name.as_str())
        .filter(|s| {
            let refs = workspace.references.references_to(&s.qualified_id());
            !refs.is_empty() && refs.iter().all(|r| r.file == symbol.file && decl_span.contains(r.span.start) && decl_span.contains(r.span.end))
        })
        .map(|s| s.name.as_str())
        .collect();

    let mut issues = Vec::new();
    if !co_move_candidates.is_empty() {
        issues.push(Issue::info(
            IssueKind::AmbiguousResolution,
            format!(
                "{} is the only user of {} in {}; consider moving {} alongside it",
                symbol.name,
                co_move_candidates.join(", "),
                request.from_package,
                if co_move_candidates.len() == 1 { "it" } else { "them" }
            ),
        ));
    }
    for file in touched_files {
        issues.push(
            Issue::info(
                IssueKind::AmbiguousResolution,
                format!(
                    "{} references {} and will need to import {} (add manually or re-run with an import-aware editor)",
                    file.display(),
                    symbol.name,
                    request.to_package
                ),
            )
            .at(file, 1),
        );
    }

    Ok(RefactoringPlan::new(
        OperationKind::MoveSymbol,
        format!("move {} from {} to {}", symbol.name, request.from_package, request.to_package),
    )
    .with_changes(changes)
    .with_issues(issues))
}
