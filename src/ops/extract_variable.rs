//! Extract Variable / Extract Constant (§4.11).

use std::path::{Path, PathBuf};

use crate::base::Position;
use crate::error::{GorefactorError, Result};
use crate::model::{File, Package, Workspace};
use crate::plan::{Change, OperationKind, RefactoringPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractedKind {
    Variable,
    Constant,
}

#[derive(Debug, Clone)]
pub struct ExtractVariableRequest {
    pub file: PathBuf,
    pub line: usize,
    pub name: String,
    pub expression: String,
    pub kind: ExtractedKind,
}

fn find_file<'a>(workspace: &'a Workspace, path: &Path) -> Option<(&'a Package, &'a File)> {
    workspace.packages.values().find_map(|p| p.file(path).map(|f| (p, f)))
}

pub fn extract_variable(workspace: &Workspace, request: &ExtractVariableRequest) -> Result<RefactoringPlan> {
    if !crate::base::is_valid_identifier(&request.name) {
        return Err(GorefactorError::invalid(format!("'{}' is not a valid identifier", request.name)));
    }
    if request.expression.is_empty() {
        return Err(GorefactorError::invalid("expression text must not be empty"));
    }

    let (_package, file) = find_file(workspace, &request.file)
        .ok_or_else(|| GorefactorError::invalid(format!("{} is not part of the workspace", request.file.display())))?;

    let line_start = file
        .line_index
        .offset(Position::new(request.line, 1))
        .ok_or_else(|| GorefactorError::invalid("line out of range"))?;
    let line_end = file
        .line_index
        .offset(Position::new(request.line + 1, 1))
        .unwrap_or_else(|| text_size::TextSize::from(file.text.len() as u32));
    let line_text = &file.text[usize::from(line_start)..usize::from(line_end)];

    if !line_text.contains(request.expression.as_str()) {
        return Err(GorefactorError::invalid("expression not found on the given line"));
    }

    let stmt_start = statement_start(&file.text, line_start);
    let indent = leading_whitespace(&file.text, stmt_start);

    let decl = match request.kind {
        ExtractedKind::Variable => format!("{indent}{} := {}\n", request.name, request.expression),
        ExtractedKind::Constant => format!("{indent}const {} = {}\n", request.name, request.expression),
    };

    let mut changes = vec![Change::new(
        request.file.clone(),
        text_size::TextRange::new(stmt_start, stmt_start),
        String::new(),
        decl,
        format!("insert {} declaration", request.name),
    )];

    let mut search_from = 0usize;
    while let Some(found) = line_text[search_from..].find(request.expression.as_str()) {
        let abs_start = line_start + text_size::TextSize::from((search_from + found) as u32);
        let abs_end = abs_start + text_size::TextSize::from(request.expression.len() as u32);
        changes.push(Change::new(
            request.file.clone(),
            text_size::TextRange::new(abs_start, abs_end),
            request.expression.clone(),
            request.name.clone(),
            format!("replace occurrence with {}", request.name),
        ));
        search_from += found + request.expression.len();
    }

    let operation = match request.kind {
        ExtractedKind::Variable => OperationKind::ExtractVariable,
        ExtractedKind::Constant => OperationKind::ExtractConstant,
    };

    Ok(RefactoringPlan::new(operation, format!("extract {} from line {}", request.name, request.line)).with_changes(changes))
}

fn statement_start(text: &str, offset: text_size::TextSize) -> text_size::TextSize {
    let offset: usize = offset.into();
    let start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    (start as u32).into()
}

fn leading_whitespace(text: &str, offset: text_size::TextSize) -> String {
    let offset: usize = offset.into();
    text[offset..].chars().take_while(|c| c.is_whitespace() && *c != '\n').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn extracts_a_repeated_expression_into_a_variable() {
        let ws = workspace_with("package app\n\nfunc Area(w, h int) int {\n\treturn w*h + w*h\n}\n");
        let request = ExtractVariableRequest {
            file: PathBuf::from("/ws/main.go"),
            line: 4,
            name: "area".to_string(),
            expression: "w*h".to_string(),
            kind: ExtractedKind::Variable,
        };
        let plan = extract_variable(&ws, &request).unwrap();
        assert!(plan.changes.iter().any(|c| c.new_text.contains("area := w*h")));
        assert_eq!(plan.changes.iter().filter(|c| c.new_text == "area").count(), 2);
    }

    #[test]
    fn rejects_an_expression_not_found_on_the_line() {
        let ws = workspace_with("package app\n\nfunc Area() int {\n\treturn 1\n}\n");
        let request = ExtractVariableRequest {
            file: PathBuf::from("/ws/main.go"),
            line: 4,
            name: "x".to_string(),
            expression: "missing".to_string(),
            kind: ExtractedKind::Variable,
        };
        assert!(extract_variable(&ws, &request).is_err());
    }
}
