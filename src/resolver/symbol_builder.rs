//! Builds a package's [`SymbolTable`] from its parsed files.

use smol_str::SmolStr;

use crate::base::Span;
use crate::model::{FieldInfo, ParamInfo, Package, Symbol, SymbolKind, SymbolTable};
use crate::parser::{self, AstNode};

/// Rebuilds `package.symbols` from scratch. Called whenever any file in the
/// package changes; symbol tables are never patched in place (§4.2).
pub fn build_symbol_table(package: &mut Package) {
    let mut table = SymbolTable::new();
    let file_paths: Vec<_> = package.files.keys().cloned().collect();

    for path in file_paths {
        let Some(file) = package.files.get(&path) else {
            continue;
        };
        if file.degraded {
            tracing::debug!(file = %path.display(), "skipping symbol extraction for degraded file");
        }
        let Some(source_file) = file.source_file() else {
            continue;
        };
        let text = file.text.as_str();

        for func in source_file.func_decls() {
            if let Some(symbol) = symbol_from_func(func, &path, text, &package.import_path) {
                table.insert(symbol);
            }
        }
        for type_decl in source_file.type_decls() {
            if let Some(symbol) = symbol_from_type(type_decl, &path, text, &package.import_path) {
                table.insert(symbol);
            }
        }
        for var_decl in source_file.var_decls() {
            for symbol in symbols_from_var(var_decl, &path, text, &package.import_path) {
                table.insert(symbol);
            }
        }
        for const_decl in source_file.const_decls() {
            for symbol in symbols_from_const(const_decl, &path, text, &package.import_path) {
                table.insert(symbol);
            }
        }
    }

    package.symbols = table;
}

fn span_of(node: &parser::SyntaxNode, text: &str, file: &crate::base::LineIndex) -> (Span, Option<String>) {
    let range = node.text_range();
    let extended_start = parser::extend_span_over_doc_comment(text, usize::from(range.start()));
    let doc_comment = if extended_start < usize::from(range.start()) {
        Some(text[extended_start..usize::from(range.start())].to_string())
    } else {
        None
    };
    let start = file.line_col(text_size::TextSize::from(extended_start as u32));
    let end = file.line_col(range.end());
    (Span::new(start, end), doc_comment)
}

fn param_info(param: &parser::Param) -> Vec<ParamInfo> {
    let type_name = param
        .type_ref()
        .map(|t| SmolStr::new(t.text()))
        .unwrap_or_else(|| SmolStr::new(""));
    let names = param.names();
    if names.is_empty() {
        vec![ParamInfo {
            name: None,
            type_name,
        }]
    } else {
        names
            .into_iter()
            .map(|n| ParamInfo {
                name: Some(SmolStr::new(n.text())),
                type_name: type_name.clone(),
            })
            .collect()
    }
}

fn params_of(list: Option<parser::ParamList>) -> Vec<ParamInfo> {
    list.map(|l| l.params().flat_map(|p| param_info(&p)).collect())
        .unwrap_or_default()
}

fn results_of(list: Option<parser::ResultList>) -> Vec<ParamInfo> {
    list.map(|l| l.params().flat_map(|p| param_info(&p)).collect())
        .unwrap_or_default()
}

fn symbol_from_func(
    func: parser::FuncDecl,
    path: &std::path::Path,
    text: &str,
    package_import_path: &str,
) -> Option<Symbol> {
    let name_token = func.name()?;
    let line_index = crate::base::LineIndex::new(text);
    let (span, doc_comment) = span_of(func.syntax(), text, &line_index);
    let params = params_of(func.params());
    let results = results_of(func.results());

    let (kind, receiver_type) = if let Some(receiver) = func.receiver() {
        let receiver_param = receiver.param()?;
        let receiver_type_name = receiver_param
            .type_ref()
            .map(|t| SmolStr::new(t.text().trim_start_matches('*')))
            .unwrap_or_else(|| SmolStr::new(""));
        let receiver_info = param_info(&receiver_param).into_iter().next()?;
        (
            SymbolKind::Method {
                receiver: receiver_info,
                params,
                results,
            },
            Some(receiver_type_name),
        )
    } else {
        (SymbolKind::Function { params, results }, None)
    };

    Some(Symbol {
        id: crate::model::SymbolId(0),
        name: SmolStr::new(name_token.text()),
        kind,
        declaring_package: SmolStr::new(package_import_path),
        file: path.to_path_buf(),
        span,
        doc_comment,
        receiver_type,
        parent: None,
        children: Vec::new(),
    })
}

fn symbol_from_type(
    type_decl: parser::TypeDecl,
    path: &std::path::Path,
    text: &str,
    package_import_path: &str,
) -> Option<Symbol> {
    let spec = type_decl.spec()?;
    let name_token = spec.name()?;
    let line_index = crate::base::LineIndex::new(text);
    let (span, doc_comment) = span_of(type_decl.syntax(), text, &line_index);

    let kind = if let Some(struct_type) = spec.struct_type() {
        let fields = struct_type
            .fields()
            .filter_map(|f| {
                let name = f.name()?;
                let type_name = f
                    .type_ref()
                    .map(|t| SmolStr::new(t.text()))
                    .unwrap_or_else(|| SmolStr::new(""));
                Some(FieldInfo {
                    name: SmolStr::new(name.text()),
                    type_name,
                })
            })
            .collect();
        SymbolKind::Struct { fields }
    } else if let Some(interface_type) = spec.interface_type() {
        let methods = interface_type
            .methods()
            .filter_map(|m| m.name().map(|t| SmolStr::new(t.text())))
            .collect();
        SymbolKind::Interface { methods }
    } else {
        return None;
    };

    Some(Symbol {
        id: crate::model::SymbolId(0),
        name: SmolStr::new(name_token.text()),
        kind,
        declaring_package: SmolStr::new(package_import_path),
        file: path.to_path_buf(),
        span,
        doc_comment,
        receiver_type: None,
        parent: None,
        children: Vec::new(),
    })
}

fn symbols_from_var(
    var_decl: parser::VarDecl,
    path: &std::path::Path,
    text: &str,
    package_import_path: &str,
) -> Vec<Symbol> {
    let line_index = crate::base::LineIndex::new(text);
    var_decl
        .specs()
        .flat_map(|spec| {
            let (span, doc_comment) = span_of(spec.syntax(), text, &line_index);
            let type_name = spec.type_ref().map(|t| SmolStr::new(t.text()));
            spec.names()
                .into_iter()
                .map(move |name_token| Symbol {
                    id: crate::model::SymbolId(0),
                    name: SmolStr::new(name_token.text()),
                    kind: SymbolKind::Variable {
                        type_name: type_name.clone(),
                    },
                    declaring_package: SmolStr::new(package_import_path),
                    file: path.to_path_buf(),
                    span,
                    doc_comment: doc_comment.clone(),
                    receiver_type: None,
                    parent: None,
                    children: Vec::new(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn symbols_from_const(
    const_decl: parser::ConstDecl,
    path: &std::path::Path,
    text: &str,
    package_import_path: &str,
) -> Vec<Symbol> {
    let line_index = crate::base::LineIndex::new(text);
    const_decl
        .specs()
        .flat_map(|spec| {
            let (span, doc_comment) = span_of(spec.syntax(), text, &line_index);
            let type_name = spec.type_ref().map(|t| SmolStr::new(t.text()));
            spec.names()
                .into_iter()
                .map(move |name_token| Symbol {
                    id: crate::model::SymbolId(0),
                    name: SmolStr::new(name_token.text()),
                    kind: SymbolKind::Constant {
                        type_name: type_name.clone(),
                    },
                    declaring_package: SmolStr::new(package_import_path),
                    file: path.to_path_buf(),
                    span,
                    doc_comment: doc_comment.clone(),
                    receiver_type: None,
                    parent: None,
                    children: Vec::new(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
