//! Extract Function / Extract Method (§4.9).
//!
//! The grammar only tracks structure one level deep into `if`/`for`
//! bodies (they're consumed as opaque token runs, see `parser::parser`'s
//! `consume_compound_tail`), so this operates on flat token scans over the
//! selected range rather than a full dataflow pass — the same level of
//! rigor the reference collector uses for call resolution.

use std::path::{Path, PathBuf};

use text_size::TextRange;

use crate::base::Position;
use crate::error::{GorefactorError, Result};
use crate::model::{File, Package, Workspace};
use crate::parser::{self, AstNode, SyntaxKind};
use crate::plan::{Change, OperationKind, RefactoringPlan};

#[derive(Debug, Clone)]
pub struct ExtractFunctionRequest {
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
    pub new_name: String,
    /// `Some(receiver_type)` extracts a method on that type; `None`
    /// extracts a free function.
    pub receiver_type: Option<String>,
}

struct Candidate {
    name: String,
    type_text: String,
}

fn find_file<'a>(workspace: &'a Workspace, path: &Path) -> Option<(&'a Package, &'a File)> {
    workspace.packages.values().find_map(|p| p.file(path).map(|f| (p, f)))
}

pub fn extract_function(workspace: &Workspace, request: &ExtractFunctionRequest) -> Result<RefactoringPlan> {
    if !crate::base::is_valid_identifier(&request.new_name) {
        return Err(GorefactorError::invalid(format!("'{}' is not a valid identifier", request.new_name)));
    }

    let (package, file) = find_file(workspace, &request.file)
        .ok_or_else(|| GorefactorError::invalid(format!("{} is not part of the workspace", request.file.display())))?;
    let source_file = file
        .source_file()
        .ok_or_else(|| GorefactorError::parse(format!("{} failed to parse", request.file.display()), crate::error::Attribution::none()))?;

    let start = file
        .line_index
        .offset(Position::new(request.start_line, 1))
        .ok_or_else(|| GorefactorError::invalid("start_line out of range"))?;
    let end = file
        .line_index
        .offset(Position::new(request.end_line + 1, 1))
        .unwrap_or_else(|| TextRange::new(0.into(), (file.text.len() as u32).into()).end());
    let selection = TextRange::new(start, end);

    let func = source_file
        .func_decls()
        .find(|f| f.syntax().text_range().contains_range(selection))
        .ok_or_else(|| GorefactorError::invalid("selection is not inside a single function body"))?;
    let body = func
        .body()
        .ok_or_else(|| GorefactorError::invalid("enclosing function has no body"))?;

    let stmts: Vec<parser::SyntaxNode> = body.stmts().collect();
    let mut selected = Vec::new();
    for stmt in &stmts {
        let range = stmt.text_range();
        let fully_inside = selection.contains_range(range);
        let disjoint = range.end() <= selection.start() || range.start() >= selection.end();
        if !fully_inside && !disjoint {
            return Err(GorefactorError::invalid("selection crosses a statement boundary"));
        }
        if fully_inside {
            selected.push(stmt.clone());
        }
    }
    if selected.is_empty() {
        return Err(GorefactorError::invalid("selection contains no complete statement"));
    }
    let extracted_range = TextRange::new(
        selected.first().unwrap().text_range().start(),
        selected.last().unwrap().text_range().end(),
    );

    for stmt in &selected {
        if stmt
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .any(|t| {
                matches!(
                    t.kind(),
                    SyntaxKind::RETURN_KW | SyntaxKind::BREAK_KW | SyntaxKind::CONTINUE_KW | SyntaxKind::GOTO_KW
                )
            })
        {
            return Err(GorefactorError::invalid(
                "extracted range contains a return/break/continue/goto",
            ));
        }
    }

    let func_params = func
        .params()
        .map(|list| list.params().collect::<Vec<_>>())
        .unwrap_or_default();
    let receiver_param = func.receiver().and_then(|r| r.param());
    let receiver_name = receiver_param.as_ref().and_then(|p| p.names().into_iter().next());

    // The receiver is excluded from `outside_scope` entirely: it is never a
    // candidate parameter, since an extracted method keeps the same receiver
    // rather than taking it by value.
    let mut outside_scope: Vec<Candidate> = Vec::new();
    for param in &func_params {
        let Some(type_ref) = param.type_ref() else { continue };
        for name in param.names() {
            outside_scope.push(Candidate { name: name.text().to_string(), type_text: type_ref.text() });
        }
    }
    for stmt in &stmts {
        if stmt.text_range().start() >= extracted_range.start() {
            break;
        }
        if let Some(decl) = parser::ShortVarDecl::cast(stmt.clone()) {
            for name in decl.names() {
                outside_scope.push(Candidate { name: name.text().to_string(), type_text: String::new() });
            }
        }
    }

    let locally_declared: Vec<String> = selected
        .iter()
        .filter_map(|s| parser::ShortVarDecl::cast(s.clone()))
        .flat_map(|d| d.names())
        .map(|t| t.text().to_string())
        .collect();

    let mut used_order = Vec::new();
    for stmt in &selected {
        for token in stmt.descendants_with_tokens().filter_map(|e| e.into_token()) {
            if token.kind() != SyntaxKind::IDENT {
                continue;
            }
            let is_member_name = token
                .prev_sibling_or_token()
                .is_some_and(|e| e.kind() == SyntaxKind::DOT);
            if is_member_name {
                continue;
            }
            let text = token.text().to_string();
            if locally_declared.contains(&text) {
                continue;
            }
            if !used_order.contains(&text) {
                used_order.push(text);
            }
        }
    }

    let mut params = Vec::new();
    for name in &used_order {
        if let Some(candidate) = outside_scope.iter().find(|c| &c.name == name) {
            if candidate.type_text.is_empty() {
                return Err(GorefactorError::invalid(format!(
                    "cannot determine a type for '{name}'; its declaration has no resolvable type"
                )));
            }
            params.push(candidate);
        }
    }

    let after_range_text: String = stmts
        .iter()
        .filter(|s| s.text_range().start() >= extracted_range.end())
        .map(|s| s.text().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    let mut returns = Vec::new();
    let mut preexisting_returns = Vec::new();
    for name in &locally_declared {
        if word_appears(&after_range_text, name) {
            returns.push(name.clone());
        }
    }
    for candidate in &outside_scope {
        if locally_declared.contains(&candidate.name) {
            continue;
        }
        let reassigned = selected.iter().any(|s| {
            parser::ShortVarDecl::cast(s.clone()).is_some()
                || parser::AssignStmt::cast(s.clone()).is_some_and(|a| assigns_to(&a, &candidate.name))
        });
        if reassigned && word_appears(&after_range_text, &candidate.name) {
            returns.push(candidate.name.clone());
            preexisting_returns.push(candidate.name.clone());
        }
    }
    if returns.iter().any(|name| {
        !locally_declared.contains(name)
            && outside_scope.iter().find(|c| &c.name == name).is_none_or(|c| c.type_text.is_empty())
    }) {
        return Err(GorefactorError::invalid(
            "a return value's type cannot be determined from this scope",
        ));
    }

    let indent = leading_whitespace(&file.text, selected.first().unwrap().text_range().start());
    let body_text: String = selected
        .iter()
        .map(|s| dedent(&s.text().to_string(), &indent))
        .collect::<Vec<_>>()
        .join("\n");

    let param_list = params
        .iter()
        .map(|c| format!("{} {}", c.name, c.type_text))
        .collect::<Vec<_>>()
        .join(", ");
    let return_types: Vec<String> = returns
        .iter()
        .map(|name| {
            outside_scope
                .iter()
                .find(|c| &c.name == name)
                .map(|c| c.type_text.clone())
                .unwrap_or_else(|| "/* unresolved */".to_string())
        })
        .collect();
    let return_clause = match return_types.len() {
        0 => String::new(),
        1 => format!(" {}", return_types[0]),
        _ => format!(" ({})", return_types.join(", ")),
    };

    let (operation, receiver_clause, description) = match &request.receiver_type {
        Some(recv_type) => {
            let (recv_name_text, recv_type_text) = match (&receiver_name, receiver_param.as_ref().and_then(|p| p.type_ref())) {
                (Some(name), Some(type_ref)) => (name.text().to_string(), type_ref.text()),
                _ => ("recv".to_string(), recv_type.clone()),
            };
            (
                OperationKind::ExtractMethod,
                format!("({recv_name_text} {recv_type_text}) "),
                format!("extract method {recv_type}.{}", request.new_name),
            )
        }
        None => (OperationKind::ExtractFunction, String::new(), format!("extract function {}", request.new_name)),
    };

    let new_decl = format!(
        "func {receiver_clause}{name}({params}){returns} {{\n\t{body}\n}}\n\n",
        receiver_clause = receiver_clause,
        name = request.new_name,
        params = param_list,
        returns = return_clause,
        body = body_text.replace('\n', "\n\t"),
    );

    let args = params.iter().map(|c| c.name.clone()).collect::<Vec<_>>().join(", ");
    let call_expr = match (&request.receiver_type, &receiver_name) {
        (Some(_), Some(recv)) => format!("{}.{}({})", recv.text(), request.new_name, args),
        _ => format!("{}({})", request.new_name, args),
    };
    let call_line = if returns.is_empty() {
        format!("{call_expr}")
    } else {
        let all_preexisting = returns.iter().all(|r| preexisting_returns.contains(r));
        let assign_op = if all_preexisting { "=" } else { ":=" };
        format!("{} {assign_op} {call_expr}", returns.join(", "))
    };

    let insert_at = insertion_point(&source_file, &request.receiver_type);

    let mut changes = vec![
        Change::new(
            request.file.clone(),
            extracted_range,
            file.text[usize::from(extracted_range.start())..usize::from(extracted_range.end())].to_string(),
            call_line,
            format!("replace extracted statements with a call to {}", request.new_name),
        ),
        Change::new(request.file.clone(), TextRange::new(insert_at, insert_at), String::new(), new_decl, description.clone()),
    ];
    changes.sort_by_key(|c| c.range.start());

    let _ = package;
    Ok(RefactoringPlan::new(operation, description).with_changes(changes))
}

fn assigns_to(assign: &parser::AssignStmt, name: &str) -> bool {
    assign.lvalue_names().iter().any(|t| t.text() == name)
}

fn word_appears(haystack: &str, word: &str) -> bool {
    let bytes = haystack.as_bytes();
    let wb = word.as_bytes();
    if wb.is_empty() {
        return false;
    }
    haystack.match_indices(word).any(|(idx, _)| {
        let before_ok = idx == 0 || !is_ident_byte(bytes[idx - 1]);
        let after = idx + wb.len();
        let after_ok = after >= bytes.len() || !is_ident_byte(bytes[after]);
        before_ok && after_ok
    })
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn leading_whitespace(text: &str, offset: text_size::TextSize) -> String {
    let offset: usize = offset.into();
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    text[line_start..offset].chars().take_while(|c| c.is_whitespace()).collect()
}

fn dedent(text: &str, indent: &str) -> String {
    text.lines()
        .map(|line| line.strip_prefix(indent).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// For a method, the offset right after the target type's last existing
/// method in this file; for a function, right after the last import decl
/// (end of file if there is none).
fn insertion_point(source_file: &parser::SourceFile, receiver_type: &Option<String>) -> text_size::TextSize {
    if let Some(recv_type) = receiver_type {
        let last_method = source_file
            .func_decls()
            .filter(|f| {
                f.receiver()
                    .and_then(|r| r.param())
                    .and_then(|p| p.type_ref())
                    .map(|t| t.text().trim_start_matches('*').to_string())
                    .as_deref()
                    == Some(recv_type.as_str())
            })
            .last();
        if let Some(m) = last_method {
            return m.syntax().text_range().end();
        }
    } else if let Some(last_import) = source_file.imports().last() {
        return last_import.syntax().text_range().end();
    }
    source_file.syntax().text_range().end()
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
    fn extracts_a_statement_range_into_a_new_function() {
        let mut ws = workspace_with(
            "package app\n\nfunc Run(a, b int) int {\n\tsum := a + b\n\treturn sum\n}\n",
        );
        Resolver::new().ensure_fresh(&mut ws);

        let request = ExtractFunctionRequest {
            file: PathBuf::from("/ws/main.go"),
            start_line: 4,
            end_line: 4,
            new_name: "AddThem".to_string(),
            receiver_type: None,
        };
        let plan = extract_function(&ws, &request).unwrap();
        assert!(plan.changes.iter().any(|c| c.new_text.contains("func AddThem")));
        assert!(plan.changes.iter().any(|c| c.new_text.contains("AddThem(a, b)")));
    }

    #[test]
    fn rejects_a_range_crossing_a_statement_boundary() {
        let mut ws = workspace_with("package app\n\nfunc Run() int {\n\tx := 1\n\treturn x\n}\n");
        Resolver::new().ensure_fresh(&mut ws);

        let request = ExtractFunctionRequest {
            file: PathBuf::from("/ws/main.go"),
            start_line: 4,
            end_line: 4,
            new_name: "X".to_string(),
            receiver_type: None,
        };
        // A half-line selection still resolves to the whole statement since
        // selection is computed per-line; this instead checks that a range
        // containing a return is rejected.
        let bad = ExtractFunctionRequest { start_line: 4, end_line: 5, ..request };
        assert!(extract_function(&ws, &bad).is_err());
    }

    #[test]
    fn extract_method_qualifies_the_call_with_the_receiver_and_keeps_it_out_of_the_params() {
        let mut ws = workspace_with(
            "package x\n\ntype C struct {\n\tr int\n}\n\nfunc (c *C) Process(a, b int) {\n\tsum := a + b\n\tc.r = sum * 2\n}\n",
        );
        Resolver::new().ensure_fresh(&mut ws);

        let request = ExtractFunctionRequest {
            file: PathBuf::from("/ws/main.go"),
            start_line: 8,
            end_line: 9,
            new_name: "computeResult".to_string(),
            receiver_type: Some("C".to_string()),
        };
        let plan = extract_function(&ws, &request).unwrap();

        let new_method = plan
            .changes
            .iter()
            .find(|c| c.new_text.contains("func (c *C) computeResult"))
            .expect("new method keeps the original receiver name and pointer type");
        assert!(new_method.new_text.contains("computeResult(a int, b int)"));
        assert!(!new_method.new_text.contains("c C)"));

        let call_site = plan
            .changes
            .iter()
            .find(|c| c.new_text.contains("computeResult("))
            .unwrap();
        assert!(call_site.new_text.contains("c.computeResult(a, b)"));
    }
}
