//! Extract Interface (§4.10): carves a set of a struct's methods into a
//! new interface declaration, signature-compatible, receiver clause
//! stripped.

use crate::error::{GorefactorError, Result};
use crate::model::Workspace;
use crate::parser::{self, AstNode};
use crate::plan::{Change, OperationKind, RefactoringPlan};

#[derive(Debug, Clone)]
pub struct ExtractInterfaceRequest {
    pub struct_name: String,
    pub interface_name: String,
    pub methods: Vec<String>,
    pub package: String,
    /// Package the interface is declared in; `None` means the same
    /// package as the struct.
    pub target_package: Option<String>,
}

pub fn extract_interface(workspace: &Workspace, request: &ExtractInterfaceRequest) -> Result<RefactoringPlan> {
    if !crate::base::is_valid_identifier(&request.interface_name) {
        return Err(GorefactorError::invalid(format!(
            "'{}' is not a valid identifier",
            request.interface_name
        )));
    }
    let package = workspace.require_package(&request.package)?;

    let mut signatures = Vec::new();
    for method_name in &request.methods {
        let symbol = package
            .symbols
            .method(&request.struct_name, method_name)
            .ok_or_else(|| {
                GorefactorError::invalid(format!(
                    "{} has no method named {}",
                    request.struct_name, method_name
                ))
            })?;
        let file = package.file(&symbol.file).ok_or_else(|| GorefactorError::symbol_not_found(symbol.name.as_str()))?;
        let source_file = file.source_file().ok_or_else(|| GorefactorError::parse("file failed to parse", crate::error::Attribution::none()))?;
        let func = source_file
            .func_decls()
            .find(|f| {
                f.is_method()
                    && f.name().is_some_and(|t| t.text() == method_name.as_str())
                    && f.receiver()
                        .and_then(|r| r.param())
                        .and_then(|p| p.type_ref())
                        .is_some_and(|t| t.text().trim_start_matches('*') == request.struct_name)
            })
            .ok_or_else(|| GorefactorError::invalid(format!("could not locate method {method_name} in the AST")))?;
        signatures.push(method_signature(&func));
    }

    let target_package_path = request.target_package.clone().unwrap_or_else(|| request.package.clone());
    let target = workspace.require_package(&target_package_path)?;
    let insertion = target
        .files
        .values()
        .next()
        .ok_or_else(|| GorefactorError::invalid(format!("{target_package_path} has no files to insert into")))?;
    let insert_at = text_size::TextSize::from(insertion.text.len() as u32);

    let body = signatures
        .iter()
        .map(|sig| format!("\t{sig}"))
        .collect::<Vec<_>>()
        .join("\n");
    let decl = format!("\ntype {} interface {{\n{}\n}}\n", request.interface_name, body);

    let change = Change::new(
        insertion.path.clone(),
        text_size::TextRange::new(insert_at, insert_at),
        String::new(),
        decl,
        format!("extract interface {} from {}", request.interface_name, request.struct_name),
    );

    Ok(RefactoringPlan::new(
        OperationKind::ExtractInterface,
        format!("extract interface {} from {}", request.interface_name, request.struct_name),
    )
    .with_changes(vec![change]))
}

/// Renders `func (r *T) Name(params) results` as an interface member:
/// `Name(params) results`, receiver clause dropped.
fn method_signature(func: &parser::FuncDecl) -> String {
    let name = func.name().map(|t| t.text().to_string()).unwrap_or_default();
    let params = func
        .params()
        .map(|list| {
            list.params()
                .map(|p| {
                    let type_text = p.type_ref().map(|t| t.text()).unwrap_or_default();
                    if p.is_variadic() {
                        format!("...{type_text}")
                    } else {
                        type_text
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();
    let results = func
        .results()
        .map(|list| {
            let types: Vec<String> = list.params().map(|p| p.type_ref().map(|t| t.text()).unwrap_or_default()).collect();
            match types.len() {
                0 => String::new(),
                1 => format!(" {}", types[0]),
                _ => format!(" ({})", types.join(", ")),
            }
        })
        .unwrap_or_default();
    format!("{name}({params}){results}")
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
    fn extracts_an_interface_from_listed_methods() {
        let mut ws = workspace_with(
            "package app\n\ntype Counter struct {\n\tn int\n}\n\nfunc (c *Counter) Bump() int {\n\treturn c.n\n}\n",
        );
        Resolver::new().ensure_fresh(&mut ws);

        let request = ExtractInterfaceRequest {
            struct_name: "Counter".to_string(),
            interface_name: "Bumper".to_string(),
            methods: vec!["Bump".to_string()],
            package: "example.com/app".to_string(),
            target_package: None,
        };
        let plan = extract_interface(&ws, &request).unwrap();
        assert_eq!(plan.changes.len(), 1);
        assert!(plan.changes[0].new_text.contains("type Bumper interface"));
        assert!(plan.changes[0].new_text.contains("Bump() int"));
    }

    #[test]
    fn fails_when_a_listed_method_is_missing() {
        let mut ws = workspace_with("package app\n\ntype Counter struct {\n\tn int\n}\n");
        Resolver::new().ensure_fresh(&mut ws);

        let request = ExtractInterfaceRequest {
            struct_name: "Counter".to_string(),
            interface_name: "Bumper".to_string(),
            methods: vec!["Bump".to_string()],
            package: "example.com/app".to_string(),
            target_package: None,
        };
        assert!(extract_interface(&ws, &request).is_err());
    }
}
