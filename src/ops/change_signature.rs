//! Change Signature (§4.13): add/remove a parameter or return value,
//! rewriting the declaration and every call site the reference index
//! knows about.
//!
//! `ExprStmt` call sites carry a real `ArgList` node; a call used as a
//! `ShortVarDecl`/`AssignStmt`/`ReturnStmt` initializer doesn't (that
//! right-hand side is a flat opaque token run), so those three are
//! rewritten by scanning for the matching parenthesis pair instead —
//! same token-scan posture as the reference collector uses to find them
//! in the first place. Add/remove-return still only rewrites the
//! declaration; splicing assignment targets at every call site isn't
//! something this reference model can do safely.

use text_size::TextRange;

use crate::error::{GorefactorError, Result};
use crate::model::Workspace;
use crate::parser::{self, AstNode, SyntaxKind};
use crate::plan::{Change, Issue, IssueKind, OperationKind, RefactoringPlan};

use super::decl_node;

#[derive(Debug, Clone)]
pub enum SignatureChange {
    AddParam { position: usize, name: String, type_text: String, default_value: String },
    RemoveParam { position: usize },
    AddReturn { position: usize, type_text: String },
    RemoveReturn { position: usize },
}

#[derive(Debug, Clone)]
pub struct ChangeSignatureRequest {
    pub name: String,
    pub package: String,
    pub receiver_type: Option<String>,
    pub change: SignatureChange,
    pub propagate_to_interface: bool,
}

fn render_params(params: &[(String, String)]) -> String {
    params.iter().map(|(n, t)| format!("{n} {t}")).collect::<Vec<_>>().join(", ")
}

fn render_results(results: &[String]) -> String {
    match results.len() {
        0 => String::new(),
        1 => format!(" {}", results[0]),
        _ => format!(" ({})", results.join(", ")),
    }
}

fn current_params(func: &parser::FuncDecl) -> Vec<(String, String)> {
    func.params()
        .map(|list| {
            list.params()
                .flat_map(|p| {
                    let type_text = p.type_ref().map(|t| t.text()).unwrap_or_default();
                    p.names().into_iter().map(move |n| (n.text().to_string(), type_text.clone())).collect::<Vec<_>>()
                })
                .collect()
        })
        .unwrap_or_default()
}

fn current_results(func: &parser::FuncDecl) -> Vec<String> {
    func.results()
        .map(|list| list.params().map(|p| p.type_ref().map(|t| t.text()).unwrap_or_default()).collect())
        .unwrap_or_default()
}

fn call_args_in_expr_stmt(source: &parser::SourceFile, callee_range: TextRange) -> Option<(TextRange, Vec<String>)> {
    let expr_stmt = source
        .syntax()
        .descendants()
        .filter_map(parser::ExprStmt::cast)
        .find(|e| e.syntax().text_range().contains_range(callee_range))?;
    let arg_list = expr_stmt.args()?;
    Some((arg_list.syntax().text_range(), arg_list.arg_texts()))
}

/// Finds the `(...)` following `callee_range` inside whichever `T`
/// (`ShortVarDecl`/`AssignStmt`/`ReturnStmt`) contains it and splits its
/// argument texts, mirroring `ArgList::arg_texts` over the flat token run
/// these statement kinds use instead of a nested `ArgList` node.
fn call_args_in_flat_stmt<T: AstNode>(source: &parser::SourceFile, callee_range: TextRange) -> Option<(TextRange, Vec<String>)> {
    let stmt = source
        .syntax()
        .descendants()
        .filter_map(T::cast)
        .find(|s| s.syntax().text_range().contains_range(callee_range))?;
    let tokens: Vec<parser::SyntaxToken> = stmt.syntax().children_with_tokens().filter_map(|e| e.into_token()).collect();
    let callee_idx = tokens.iter().position(|t| t.text_range() == callee_range)?;
    if tokens.get(callee_idx + 1)?.kind() != SyntaxKind::L_PAREN {
        return None;
    }
    let open_idx = callee_idx + 1;
    let mut depth = 0i32;
    let close_idx = tokens[open_idx..].iter().position(|t| {
        match t.kind() {
            SyntaxKind::L_PAREN | SyntaxKind::L_BRACK => depth += 1,
            SyntaxKind::R_PAREN | SyntaxKind::R_BRACK => depth -= 1,
            _ => {}
        }
        depth == 0
    })? + open_idx;

    let arg_range = TextRange::new(tokens[open_idx].text_range().start(), tokens[close_idx].text_range().end());

    let mut args = Vec::new();
    let mut current = String::new();
    let mut arg_depth = 0i32;
    for token in &tokens[open_idx + 1..close_idx] {
        match token.kind() {
            SyntaxKind::L_PAREN | SyntaxKind::L_BRACK => {
                arg_depth += 1;
                current.push_str(token.text());
            }
            SyntaxKind::R_PAREN | SyntaxKind::R_BRACK => {
                arg_depth -= 1;
                current.push_str(token.text());
            }
            SyntaxKind::COMMA if arg_depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push_str(token.text()),
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        args.push(trimmed.to_string());
    }
    Some((arg_range, args))
}

pub fn change_signature(workspace: &Workspace, request: &ChangeSignatureRequest) -> Result<RefactoringPlan> {
    let package = workspace.require_package(&request.package)?;
    let symbol = match &request.receiver_type {
        Some(recv) => package
            .symbols
            .method(recv, &request.name)
            .ok_or_else(|| GorefactorError::symbol_not_found(&request.name))?,
        None => package
            .symbols
            .by_name(&request.name)
            .filter(|s| !s.is_method())
            .ok_or_else(|| GorefactorError::symbol_not_found(&request.name))?,
    };
    let decl_file = package.file(&symbol.file).ok_or_else(|| GorefactorError::symbol_not_found(symbol.name.as_str()))?;
    let node = decl_node(decl_file, symbol)
        .ok_or_else(|| GorefactorError::invalid(format!("could not locate declaration of '{}'", symbol.name)))?;
    let func = parser::FuncDecl::cast(node).ok_or_else(|| GorefactorError::invalid("declaration is not a function"))?;

    let mut changes = Vec::new();
    let mut issues = Vec::new();
    rewrite_declaration(&func, &request.change, symbol.file.clone(), &mut changes)?;

    if matches!(request.change, SignatureChange::AddParam { .. } | SignatureChange::RemoveParam { .. }) {
        let qualified = symbol.qualified_id();
        for reference in workspace.references.references_to(&qualified) {
            let Some(ref_package) = workspace.package(&reference.use_site_package) else { continue };
            let Some(ref_file) = ref_package.file(&reference.file) else { continue };
            let Some(ref_source) = ref_file.source_file() else { continue };
            let Some(callee_range) = super::reference_range(ref_file, &reference.span, symbol.name.len()) else { continue };

            let call_args = call_args_in_expr_stmt(&ref_source, callee_range)
                .or_else(|| call_args_in_flat_stmt::<parser::ShortVarDecl>(&ref_source, callee_range))
                .or_else(|| call_args_in_flat_stmt::<parser::AssignStmt>(&ref_source, callee_range))
                .or_else(|| call_args_in_flat_stmt::<parser::ReturnStmt>(&ref_source, callee_range));
            let Some((arg_range, mut args)) = call_args else { continue };

            match &request.change {
                SignatureChange::AddParam { position, default_value, .. } => {
                    let at = (*position).min(args.len());
                    args.insert(at, default_value.clone());
                }
                SignatureChange::RemoveParam { position } => {
                    if *position < args.len() {
                        args.remove(*position);
                    }
                }
                _ => unreachable!(),
            }
            changes.push(Change::new(
                reference.file.clone(),
                arg_range,
                ref_file.text[usize::from(arg_range.start())..usize::from(arg_range.end())].to_string(),
                format!("({})", args.join(", ")),
                format!("update call site for {}", symbol.name),
            ));
        }
    } else {
        issues.push(Issue::info(
            IssueKind::MissingType,
            format!(
                "'{}' return list changed; call sites that assign its result were not rewritten and need manual review",
                symbol.name
            ),
        ));
    }

    if request.propagate_to_interface {
        if let Some(receiver) = &request.receiver_type {
            propagate(workspace, receiver, &request.name, &request.change, &mut changes, &mut issues)?;
        }
    }

    Ok(RefactoringPlan::new(OperationKind::ChangeSignature, format!("change signature of {}", symbol.name))
        .with_changes(changes)
        .with_issues(issues))
}

fn rewrite_declaration(
    func: &parser::FuncDecl,
    change: &SignatureChange,
    file: std::path::PathBuf,
    changes: &mut Vec<Change>,
) -> Result<()> {
    match change {
        SignatureChange::AddParam { position, name, type_text, .. } => {
            let mut params = current_params(func);
            let at = (*position).min(params.len());
            params.insert(at, (name.clone(), type_text.clone()));
            let list = func.params().ok_or_else(|| GorefactorError::invalid("function has no parameter list"))?;
            changes.push(Change::new(
                file,
                list.syntax().text_range(),
                list.syntax().text().to_string(),
                format!("({})", render_params(&params)),
                "rewrite parameter list".to_string(),
            ));
        }
        SignatureChange::RemoveParam { position } => {
            let mut params = current_params(func);
            if *position >= params.len() {
                return Err(GorefactorError::invalid("remove-param position out of range"));
            }
            params.remove(*position);
            let list = func.params().ok_or_else(|| GorefactorError::invalid("function has no parameter list"))?;
            changes.push(Change::new(
                file,
                list.syntax().text_range(),
                list.syntax().text().to_string(),
                format!("({})", render_params(&params)),
                "rewrite parameter list".to_string(),
            ));
        }
        SignatureChange::AddReturn { position, type_text } => {
            let mut results = current_results(func);
            let at = (*position).min(results.len());
            results.insert(at, type_text.clone());
            rewrite_results(func, &results, file, changes)?;
        }
        SignatureChange::RemoveReturn { position } => {
            let mut results = current_results(func);
            if *position >= results.len() {
                return Err(GorefactorError::invalid("remove-return position out of range"));
            }
            results.remove(*position);
            rewrite_results(func, &results, file, changes)?;
        }
    }
    Ok(())
}

fn rewrite_results(
    func: &parser::FuncDecl,
    results: &[String],
    file: std::path::PathBuf,
    changes: &mut Vec<Change>,
) -> Result<()> {
    let rendered = render_results(results);
    match func.results() {
        Some(list) => changes.push(Change::new(
            file,
            list.syntax().text_range(),
            list.syntax().text().to_string(),
            rendered.trim_start().to_string(),
            "rewrite result list".to_string(),
        )),
        None => {
            let params = func.params().ok_or_else(|| GorefactorError::invalid("function has no parameter list"))?;
            let at = params.syntax().text_range().end();
            changes.push(Change::new(
                file,
                text_size::TextRange::new(at, at),
                String::new(),
                rendered,
                "add result list".to_string(),
            ));
        }
    }
    Ok(())
}

/// Best-effort propagation: rewrites every other method in the workspace
/// that shares this method's name but a different receiver, mirroring the
/// reference collector's own structural-match rule (§4.2 rule c).
fn propagate(
    workspace: &Workspace,
    receiver_type: &str,
    method: &str,
    change: &SignatureChange,
    changes: &mut Vec<Change>,
    issues: &mut Vec<Issue>,
) -> Result<()> {
    let mut touched = 0;
    for package in workspace.packages.values() {
        for symbol in package.symbols.iter() {
            if !symbol.is_method() || symbol.name != method || symbol.receiver_type.as_deref() == Some(receiver_type) {
                continue;
            }
            let Some(file) = package.file(&symbol.file) else { continue };
            let Some(node) = decl_node(file, symbol) else { continue };
            let Some(func) = parser::FuncDecl::cast(node) else { continue };
            rewrite_declaration(&func, change, symbol.file.clone(), changes)?;
            touched += 1;
        }
    }
    if touched > 0 {
        issues.push(Issue::info(
            IssueKind::AmbiguousResolution,
            format!("propagated signature change to {touched} other implementation(s) of {method}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolver;
    use smol_str::SmolStr;
    use std::path::PathBuf;

    fn workspace_with(source: &str) -> Workspace {
        let mut ws = Workspace::new(PathBuf::from("/ws"), "example.com/app".to_string());
        let mut package = crate::model::Package::new("example.com/app".to_string(), SmolStr::new("app"), PathBuf::from("/ws"));
        let path = PathBuf::from("/ws/main.go");
        package.files.insert(path.clone(), crate::model::File::load(path, source.to_string()));
        ws.packages.insert("example.com/app".to_string(), package);
        ws
    }

    #[test]
    fn adds_a_parameter_and_updates_call_sites() {
        let mut ws = workspace_with(
            "package app\n\nfunc Greet(name string) {\n\tprintMsg(name)\n}\n\nfunc main() {\n\tGreet(\"a\")\n}\n",
        );
        Resolver::new().ensure_fresh(&mut ws);

        let request = ChangeSignatureRequest {
            name: "Greet".to_string(),
            package: "example.com/app".to_string(),
            receiver_type: None,
            change: SignatureChange::AddParam {
                position: 1,
                name: "loud".to_string(),
                type_text: "bool".to_string(),
                default_value: "false".to_string(),
            },
            propagate_to_interface: false,
        };
        let plan = change_signature(&ws, &request).unwrap();
        assert!(plan.changes.iter().any(|c| c.new_text.contains("loud bool")));
        assert!(plan.changes.iter().any(|c| c.new_text == "(\"a\", false)"));
    }

    #[test]
    fn rewrites_a_call_site_used_as_a_short_var_decl_initializer() {
        let mut ws = workspace_with(
            "package app\n\nfunc Greet(name string) string {\n\treturn name\n}\n\nfunc main() {\n\tmsg := Greet(\"a\")\n\t_ = msg\n}\n",
        );
        Resolver::new().ensure_fresh(&mut ws);

        let request = ChangeSignatureRequest {
            name: "Greet".to_string(),
            package: "example.com/app".to_string(),
            receiver_type: None,
            change: SignatureChange::AddParam {
                position: 1,
                name: "loud".to_string(),
                type_text: "bool".to_string(),
                default_value: "false".to_string(),
            },
            propagate_to_interface: false,
        };
        let plan = change_signature(&ws, &request).unwrap();
        assert!(plan.changes.iter().any(|c| c.new_text == "(\"a\", false)"));
    }

    #[test]
    fn rewrites_a_call_site_used_in_a_return_expression() {
        let mut ws = workspace_with(
            "package app\n\nfunc Greet(name string) string {\n\treturn name\n}\n\nfunc Shout(name string) string {\n\treturn Greet(name)\n}\n",
        );
        Resolver::new().ensure_fresh(&mut ws);

        let request = ChangeSignatureRequest {
            name: "Greet".to_string(),
            package: "example.com/app".to_string(),
            receiver_type: None,
            change: SignatureChange::RemoveParam { position: 0 },
            propagate_to_interface: false,
        };
        let plan = change_signature(&ws, &request).unwrap();
        assert!(plan.changes.iter().any(|c| c.new_text == "()"));
    }

    #[test]
    fn rejects_removing_a_param_out_of_range() {
        let mut ws = workspace_with("package app\n\nfunc Greet() {}\n");
        Resolver::new().ensure_fresh(&mut ws);

        let request = ChangeSignatureRequest {
            name: "Greet".to_string(),
            package: "example.com/app".to_string(),
            receiver_type: None,
            change: SignatureChange::RemoveParam { position: 0 },
            propagate_to_interface: false,
        };
        assert!(change_signature(&ws, &request).is_err());
    }
}
