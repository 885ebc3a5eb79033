//! Workspace-wide reference collection: resolves call/selector expressions
//! in function bodies back to the symbol they use.
//!
//! Implements the three resolution rules from the package-import
//! graph/resolver design: (a) a bare call resolves against the local
//! package's own top-level symbols; (b) `pkg.Name` resolves through the
//! file's import aliases; (c) `x.Method()` where `x`'s type can't be
//! pinned down resolves via best-effort structural matching — if exactly
//! one struct in the workspace has a method of that name, that's the
//! target.
//!
//! `ExprStmt` call statements have a real `IdentExpr`/`SelectorExpr` child
//! the grammar parses out; `ShortVarDecl`/`AssignStmt`/`ReturnStmt`
//! initializers don't (their right-hand side is a flat opaque token run, see
//! `parser::parser::consume_until_line_end`), so those three are scanned as
//! raw `IDENT ['.' IDENT] '('` token runs instead — the same level of rigor
//! as everywhere else this grammar treats statement bodies opaquely.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::Span;
use crate::model::{QualifiedSymbolId, Reference, ReferenceIndex, ReferenceKind, Workspace};
use crate::parser::{self, AstNode, SyntaxKind, SyntaxToken};

pub fn collect_references(workspace: &mut Workspace) {
    let mut index = ReferenceIndex::new();

    // Method-name -> declaring types, for the best-effort structural rule.
    let mut methods_by_name: FxHashMap<SmolStr, Vec<(String, SmolStr)>> = FxHashMap::default();
    for package in workspace.packages.values() {
        for symbol in package.symbols.iter() {
            if symbol.is_method() {
                methods_by_name
                    .entry(symbol.name.clone())
                    .or_default()
                    .push((package.import_path.clone(), symbol.receiver_type.clone().unwrap_or_default()));
            }
        }
    }

    for package in workspace.packages.values() {
        for (path, file) in &package.files {
            let Some(source_file) = file.source_file() else {
                continue;
            };
            for func in source_file.func_decls() {
                let Some(body) = func.body() else { continue };
                for expr_stmt in body.syntax().descendants().filter_map(parser::ExprStmt::cast) {
                    collect_from_expr_stmt(&expr_stmt, package, workspace, path, file, &methods_by_name, &mut index);
                }
                for decl in body.syntax().descendants().filter_map(parser::ShortVarDecl::cast) {
                    let tokens = tokens_after(decl.syntax(), SyntaxKind::COLON_EQ);
                    collect_calls_in_tokens(&tokens, package, workspace, path, file, &methods_by_name, &mut index);
                }
                for assign in body.syntax().descendants().filter_map(parser::AssignStmt::cast) {
                    let tokens = tokens_after(assign.syntax(), SyntaxKind::EQ);
                    collect_calls_in_tokens(&tokens, package, workspace, path, file, &methods_by_name, &mut index);
                }
                for ret in body.syntax().descendants().filter_map(parser::ReturnStmt::cast) {
                    let tokens = tokens_after(ret.syntax(), SyntaxKind::RETURN_KW);
                    collect_calls_in_tokens(&tokens, package, workspace, path, file, &methods_by_name, &mut index);
                }
            }
        }
    }

    workspace.references = index;
}

#[allow(clippy::too_many_arguments)]
fn collect_from_expr_stmt(
    expr_stmt: &parser::ExprStmt,
    package: &crate::model::Package,
    workspace: &Workspace,
    path: &std::path::Path,
    file: &crate::model::File,
    methods_by_name: &FxHashMap<SmolStr, Vec<(String, SmolStr)>>,
    index: &mut ReferenceIndex,
) {
    let Some(callee) = expr_stmt.callee_name() else {
        return;
    };
    let node = expr_stmt.syntax();
    let ident_expr = node.children().find_map(parser::IdentExpr::cast);
    let selector_expr = node.children().find_map(parser::SelectorExpr::cast);

    if ident_expr.is_some() {
        record_call(callee, None, package, workspace, path, file, methods_by_name, index);
        return;
    }

    let Some(selector) = selector_expr else { return };
    let idents: Vec<_> = selector
        .syntax()
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| t.kind() == SyntaxKind::IDENT)
        .collect();
    if idents.len() < 2 {
        return;
    }
    let qualifier = idents[0].text().to_string();
    record_call(callee, Some(qualifier), package, workspace, path, file, methods_by_name, index);
}

/// Tokens of `stmt` after (and excluding) the first token of kind `after`,
/// e.g. everything right of `:=`, `=`, or `return`. These three statement
/// kinds have no nested expression nodes, so this is the full initializer.
fn tokens_after(stmt: &parser::SyntaxNode, after: SyntaxKind) -> Vec<SyntaxToken> {
    stmt.children_with_tokens()
        .filter_map(|e| e.into_token())
        .skip_while(|t| t.kind() != after)
        .skip(1)
        .collect()
}

/// Scans a flat token run for `ident(...)` and `ident.ident(...)` call
/// shapes and records a reference for each callee found, at any nesting
/// depth (`Foo(Bar())` records both `Foo` and `Bar`).
#[allow(clippy::too_many_arguments)]
fn collect_calls_in_tokens(
    tokens: &[SyntaxToken],
    package: &crate::model::Package,
    workspace: &Workspace,
    path: &std::path::Path,
    file: &crate::model::File,
    methods_by_name: &FxHashMap<SmolStr, Vec<(String, SmolStr)>>,
    index: &mut ReferenceIndex,
) {
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].kind() != SyntaxKind::IDENT {
            i += 1;
            continue;
        }
        if i + 3 < tokens.len()
            && tokens[i + 1].kind() == SyntaxKind::DOT
            && tokens[i + 2].kind() == SyntaxKind::IDENT
            && tokens[i + 3].kind() == SyntaxKind::L_PAREN
        {
            record_call(tokens[i + 2].clone(), Some(tokens[i].text().to_string()), package, workspace, path, file, methods_by_name, index);
            i += 3;
            continue;
        }
        if i + 1 < tokens.len() && tokens[i + 1].kind() == SyntaxKind::L_PAREN {
            record_call(tokens[i].clone(), None, package, workspace, path, file, methods_by_name, index);
        }
        i += 1;
    }
}

#[allow(clippy::too_many_arguments)]
fn record_call(
    callee: SyntaxToken,
    qualifier: Option<String>,
    package: &crate::model::Package,
    workspace: &Workspace,
    path: &std::path::Path,
    file: &crate::model::File,
    methods_by_name: &FxHashMap<SmolStr, Vec<(String, SmolStr)>>,
    index: &mut ReferenceIndex,
) {
    let span = span_of_token(&callee, &file.line_index);
    let name = callee.text().to_string();

    let Some(qualifier) = qualifier else {
        // Rule (a): bare call against the local package's own symbols.
        if let Some(symbol) = package.symbols.by_name(&name) {
            index.record(Reference {
                symbol: symbol.qualified_id(),
                file: path.to_path_buf(),
                span,
                kind: ReferenceKind::Call,
                use_site_package: package.import_path.clone(),
            });
        }
        return;
    };

    // Rule (b): qualifier matches an import alias or path tail.
    if let Some(import) = package.imports.iter().find(|i| {
        i.alias.as_deref() == Some(qualifier.as_str())
            || i.path.rsplit('/').next() == Some(qualifier.as_str())
    }) {
        if let Some(target_package) = workspace.package(&import.path) {
            if let Some(symbol) = target_package.symbols.by_name(&name) {
                index.record(Reference {
                    symbol: symbol.qualified_id(),
                    file: path.to_path_buf(),
                    span,
                    kind: ReferenceKind::Call,
                    use_site_package: package.import_path.clone(),
                });
            }
        }
        return;
    }

    // Rule (c): best-effort structural method match.
    if let Some(candidates) = methods_by_name.get(name.as_str()) {
        if candidates.len() == 1 {
            let (owning_package, receiver_type) = &candidates[0];
            if let Some(owning) = workspace.package(owning_package) {
                if let Some(symbol) = owning.symbols.method(receiver_type, &name) {
                    index.record(Reference {
                        symbol: symbol.qualified_id(),
                        file: path.to_path_buf(),
                        span,
                        kind: ReferenceKind::StructuralMethodUse,
                        use_site_package: package.import_path.clone(),
                    });
                }
            }
        }
    }
}

fn span_of_token(token: &SyntaxToken, line_index: &crate::base::LineIndex) -> Span {
    let range = token.text_range();
    Span::new(line_index.line_col(range.start()), line_index.line_col(range.end()))
}
