//! Inline Variable / Inline Function / Inline Method (§4.12).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::base::Position;
use crate::error::{GorefactorError, Result};
use crate::model::{File, Package, Workspace};
use crate::parser::{self, AstNode, SyntaxKind};
use crate::plan::{Change, OperationKind, RefactoringPlan};

use super::decl_node;

#[derive(Debug, Clone)]
pub struct InlineVariableRequest {
    pub file: PathBuf,
    pub line: usize,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct InlineFunctionRequest {
    pub name: String,
    pub package: String,
    /// `Some(receiver_type)` inlines a method, `None` a free function.
    pub receiver_type: Option<String>,
}

fn find_file<'a>(workspace: &'a Workspace, path: &Path) -> Option<(&'a Package, &'a File)> {
    workspace.packages.values().find_map(|p| p.file(path).map(|f| (p, f)))
}

pub fn inline_variable(workspace: &Workspace, request: &InlineVariableRequest) -> Result<RefactoringPlan> {
    let (_package, file) = find_file(workspace, &request.file)
        .ok_or_else(|| GorefactorError::invalid(format!("{} is not part of the workspace", request.file.display())))?;
    let source_file = file.source_file().ok_or_else(|| GorefactorError::parse("file failed to parse", crate::error::Attribution::none()))?;

    let decl_line_start = file
        .line_index
        .offset(Position::new(request.line, 1))
        .ok_or_else(|| GorefactorError::invalid("line out of range"))?;

    let func = source_file
        .func_decls()
        .find(|f| f.syntax().text_range().contains(decl_line_start))
        .ok_or_else(|| GorefactorError::invalid("line is not inside a function body"))?;
    let body = func.body().ok_or_else(|| GorefactorError::invalid("enclosing function has no body"))?;
    let stmts: Vec<parser::SyntaxNode> = body.stmts().collect();

    let decl_index = stmts
        .iter()
        .position(|s| s.text_range().contains(decl_line_start))
        .ok_or_else(|| GorefactorError::invalid("no statement found on that line"))?;
    let decl_stmt = parser::ShortVarDecl::cast(stmts[decl_index].clone())
        .ok_or_else(|| GorefactorError::invalid("that line is not a `:=` declaration"))?;
    let names = decl_stmt.names();
    if names.len() != 1 || names[0].text() != request.name {
        return Err(GorefactorError::invalid(format!(
            "line {} does not declare a single variable named '{}'",
            request.line, request.name
        )));
    }

    let decl_text = decl_stmt.syntax().text().to_string();
    let rhs = decl_text
        .splitn(2, ":=")
        .nth(1)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| GorefactorError::invalid("could not find the initializer after `:=`"))?;

    let rest = &stmts[decl_index + 1..];
    let reassigned = rest.iter().any(|s| {
        parser::ShortVarDecl::cast(s.clone()).is_some_and(|d| d.names().iter().any(|t| t.text() == request.name))
            || parser::AssignStmt::cast(s.clone()).is_some_and(|a| a.lvalue_names().iter().any(|t| t.text() == request.name))
    });
    if reassigned {
        return Err(GorefactorError::invalid(format!(
            "'{}' is reassigned before some of its uses; inlining would change behavior",
            request.name
        )));
    }

    let mut changes = vec![Change::new(
        request.file.clone(),
        super::extend_over_trailing_blank_line(&file.text, decl_stmt.syntax().text_range()),
        decl_stmt.syntax().text().to_string(),
        String::new(),
        format!("delete declaration of {}", request.name),
    )];

    for stmt in rest {
        for token in stmt.descendants_with_tokens().filter_map(|e| e.into_token()) {
            if token.kind() != SyntaxKind::IDENT || token.text() != request.name {
                continue;
            }
            let is_member_name = token.prev_sibling_or_token().is_some_and(|e| e.kind() == SyntaxKind::DOT);
            if is_member_name {
                continue;
            }
            changes.push(Change::new(
                request.file.clone(),
                token.text_range(),
                token.text().to_string(),
                format!("({rhs})"),
                format!("inline use of {}", request.name),
            ));
        }
    }

    Ok(RefactoringPlan::new(OperationKind::InlineVariable, format!("inline variable {}", request.name)).with_changes(changes))
}

pub fn inline_function(workspace: &Workspace, request: &InlineFunctionRequest) -> Result<RefactoringPlan> {
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
    let func = parser::FuncDecl::cast(node.clone())
        .ok_or_else(|| GorefactorError::invalid("declaration is not a function"))?;
    let body = func.body().ok_or_else(|| GorefactorError::invalid(format!("{} has no body to inline", symbol.name)))?;

    let stmts: Vec<parser::SyntaxNode> = body.stmts().collect();
    let return_count = body
        .syntax()
        .descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| t.kind() == SyntaxKind::RETURN_KW)
        .count();
    let last_is_return = stmts.last().is_some_and(|s| parser::ReturnStmt::cast(s.clone()).is_some());
    if return_count > 1 || (return_count == 1 && !last_is_return) {
        return Err(GorefactorError::invalid(format!(
            "'{}' has more than one return path and cannot be safely inlined",
            symbol.name
        )));
    }

    let param_names: Vec<String> = func
        .params()
        .map(|list| list.params().flat_map(|p| p.names()).map(|t| t.text().to_string()).collect())
        .unwrap_or_default();

    let body_stmts: Vec<&parser::SyntaxNode> = stmts.iter().filter(|s| parser::ReturnStmt::cast((*s).clone()).is_none()).collect();

    let qualified = symbol.qualified_id();
    let mut changes = Vec::new();
    for reference in workspace.references.references_to(&qualified) {
        let Some(ref_package) = workspace.package(&reference.use_site_package) else {
            continue;
        };
        let Some(ref_file) = ref_package.file(&reference.file) else {
            continue;
        };
        let Some(ref_source) = ref_file.source_file() else {
            continue;
        };
        let Some(callee_range) = super::reference_range(ref_file, &reference.span, symbol.name.len()) else {
            continue;
        };
        let Some(expr_stmt) = ref_source
            .syntax()
            .descendants()
            .filter_map(parser::ExprStmt::cast)
            .find(|e| e.syntax().text_range().contains_range(callee_range))
        else {
            continue;
        };

        let args = expr_stmt.args().map(|a| a.arg_texts()).unwrap_or_default();
        let mut substitutions = HashMap::new();
        for (name, arg) in param_names.iter().zip(args.iter()) {
            substitutions.insert(name.clone(), arg.clone());
        }

        let call_indent = leading_whitespace(&ref_file.text, expr_stmt.syntax().text_range().start());
        let inlined = body_stmts
            .iter()
            .map(|s| format!("{call_indent}{}", substitute_words(s.text().to_string().trim(), &substitutions)))
            .collect::<Vec<_>>()
            .join("\n");

        changes.push(Change::new(
            reference.file.clone(),
            expr_stmt.syntax().text_range(),
            expr_stmt.syntax().text().to_string(),
            if inlined.is_empty() { String::new() } else { inlined },
            format!("inline call to {}", symbol.name),
        ));
    }

    changes.push(Change::new(
        symbol.file.clone(),
        super::extend_over_trailing_blank_line(&decl_file.text, node.text_range()),
        decl_file.text[usize::from(node.text_range().start())..usize::from(node.text_range().end())].to_string(),
        String::new(),
        format!("delete inlined declaration of {}", symbol.name),
    ));

    let operation = if request.receiver_type.is_some() { OperationKind::InlineMethod } else { OperationKind::InlineFunction };
    Ok(RefactoringPlan::new(operation, format!("inline {}", symbol.name)).with_changes(changes).irreversible())
}

fn leading_whitespace(text: &str, offset: text_size::TextSize) -> String {
    let offset: usize = offset.into();
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    text[line_start..offset].chars().take_while(|c| c.is_whitespace()).collect()
}

/// Replaces whole-word identifier occurrences per `map`, skipping names
/// used as a selector member (`x.name`) since those aren't the parameter
/// being substituted.
fn substitute_words(text: &str, map: &HashMap<String, String>) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::new();
    let mut i = 0;
    let mut prev_non_space = None;
    while i < chars.len() {
        let c = chars[i];
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if prev_non_space == Some('.') {
                result.push_str(&word);
            } else if let Some(replacement) = map.get(&word) {
                result.push_str(replacement);
            } else {
                result.push_str(&word);
            }
            prev_non_space = word.chars().last();
        } else {
            result.push(c);
            if !c.is_whitespace() {
                prev_non_space = Some(c);
            }
            i += 1;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolver;
    use smol_str::SmolStr;

    fn workspace_with(source: &str) -> Workspace {
        let mut ws = Workspace::new(PathBuf::from("/ws"), "example.com/app".to_string());
        let mut package = Package::new("example.com/app".to_string(), SmolStr::new("app"), PathBuf::from("/ws"));
        let path = PathBuf::from("/ws/main.go");
        package.files.insert(path.clone(), File::load(path, source.to_string()));
        ws.packages.insert("example.com/app".to_string(), package);
        ws
    }

    #[test]
    fn inlines_a_single_use_variable() {
        let mut ws = workspace_with(
            "package app\n\nfunc Run() {\n\tmsg := \"hi\"\n\tprintMsg(msg)\n}\n",
        );
        Resolver::new().ensure_fresh(&mut ws);

        let request = InlineVariableRequest { file: PathBuf::from("/ws/main.go"), line: 4, name: "msg".to_string() };
        let plan = inline_variable(&ws, &request).unwrap();
        assert!(plan.changes.iter().any(|c| c.new_text.is_empty() && c.old_text.contains("msg :=")));
        assert!(plan.changes.iter().any(|c| c.new_text == "(\"hi\")"));
    }

    #[test]
    fn rejects_inlining_a_reassigned_variable() {
        let mut ws = workspace_with(
            "package app\n\nfunc Run() {\n\tmsg := \"hi\"\n\tmsg = \"bye\"\n\tprintMsg(msg)\n}\n",
        );
        Resolver::new().ensure_fresh(&mut ws);

        let request = InlineVariableRequest { file: PathBuf::from("/ws/main.go"), line: 4, name: "msg".to_string() };
        assert!(inline_variable(&ws, &request).is_err());
    }

    #[test]
    fn rejects_inlining_a_function_with_two_returns() {
        let mut ws = workspace_with(
            "package app\n\nfunc Pick(ok bool) int {\n\treturn 1\n\treturn 2\n}\n",
        );
        Resolver::new().ensure_fresh(&mut ws);

        let request = InlineFunctionRequest { name: "Pick".to_string(), package: "example.com/app".to_string(), receiver_type: None };
        assert!(inline_function(&ws, &request).is_err());
    }
}
