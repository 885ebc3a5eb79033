//! One module per refactoring operation. Every operation exposes a
//! `validate` pre-check plus a pure `(Workspace, Request) -> Result<Plan>`
//! function (§9 "Plan construction purity") — none of them touch the
//! filesystem; that's [`crate::executor`]'s job.

pub mod analyze;
pub mod batch;
pub mod change_signature;
pub mod extract_function;
pub mod extract_interface;
pub mod extract_variable;
pub mod inline;
pub mod move_package;
pub mod move_symbol;
pub mod rename;
pub mod safe_delete;

use text_size::TextRange;

use crate::model::{File, Symbol, SymbolKind};
use crate::parser::{self, AstNode};

/// Finds the exact token that spells out `symbol`'s own name at its
/// declaration site, so rename/delete can target precisely that token
/// instead of re-deriving it from the byte span on every call.
pub(crate) fn decl_name_token(file: &File, symbol: &Symbol) -> Option<parser::SyntaxToken> {
    let source_file = file.source_file()?;
    match &symbol.kind {
        SymbolKind::Function { .. } => source_file
            .func_decls()
            .find(|f| !f.is_method() && f.name().is_some_and(|t| t.text() == symbol.name.as_str()))
            .and_then(|f| f.name()),
        SymbolKind::Method { .. } => source_file
            .func_decls()
            .find(|f| {
                f.is_method()
                    && f.name().is_some_and(|t| t.text() == symbol.name.as_str())
                    && receiver_matches(f.clone(), symbol)
            })
            .and_then(|f| f.name()),
        SymbolKind::Struct { .. } | SymbolKind::Interface { .. } => source_file
            .type_decls()
            .find_map(|t| t.spec())
            .filter(|s| s.name().is_some_and(|t| t.text() == symbol.name.as_str()))
            .and_then(|s| s.name()),
        SymbolKind::Variable { .. } => source_file
            .var_decls()
            .flat_map(|d| d.specs())
            .find_map(|spec| spec.names().into_iter().find(|t| t.text() == symbol.name.as_str())),
        SymbolKind::Constant { .. } => source_file
            .const_decls()
            .flat_map(|d| d.specs())
            .find_map(|spec| spec.names().into_iter().find(|t| t.text() == symbol.name.as_str())),
        SymbolKind::Field { .. } | SymbolKind::Parameter { .. } => None,
    }
}

fn receiver_matches(func: parser::FuncDecl, symbol: &Symbol) -> bool {
    let Some(expected) = &symbol.receiver_type else {
        return false;
    };
    func.receiver()
        .and_then(|r| r.param())
        .and_then(|p| p.type_ref())
        .map(|t| t.text().trim_start_matches('*').to_string())
        .is_some_and(|actual| &actual == expected.as_str())
}

/// Finds the syntax node for `symbol`'s own declaration (the `FUNC_DECL`,
/// `TYPE_DECL`, `VAR_SPEC`, or `CONST_SPEC`), for operations that need the
/// whole declaration's span rather than just its name token.
pub(crate) fn decl_node(file: &File, symbol: &Symbol) -> Option<parser::SyntaxNode> {
    let source_file = file.source_file()?;
    match &symbol.kind {
        SymbolKind::Function { .. } => source_file
            .func_decls()
            .find(|f| !f.is_method() && f.name().is_some_and(|t| t.text() == symbol.name.as_str()))
            .map(|f| f.syntax().clone()),
        SymbolKind::Method { .. } => source_file
            .func_decls()
            .find(|f| {
                f.is_method()
                    && f.name().is_some_and(|t| t.text() == symbol.name.as_str())
                    && receiver_matches(f.clone(), symbol)
            })
            .map(|f| f.syntax().clone()),
        SymbolKind::Struct { .. } | SymbolKind::Interface { .. } => source_file
            .type_decls()
            .find(|t| {
                t.spec()
                    .and_then(|s| s.name())
                    .is_some_and(|t| t.text() == symbol.name.as_str())
            })
            .map(|t| t.syntax().clone()),
        SymbolKind::Variable { .. } => source_file
            .var_decls()
            .flat_map(|d| d.specs())
            .find(|spec| spec.names().iter().any(|t| t.text() == symbol.name.as_str()))
            .map(|s| s.syntax().clone()),
        SymbolKind::Constant { .. } => source_file
            .const_decls()
            .flat_map(|d| d.specs())
            .find(|spec| spec.names().iter().any(|t| t.text() == symbol.name.as_str()))
            .map(|s| s.syntax().clone()),
        SymbolKind::Field { .. } | SymbolKind::Parameter { .. } => None,
    }
}

/// Extends `range`'s end past a single trailing blank line, so deleting or
/// moving a declaration doesn't leave a double-blank gap behind (§4.7 "full
/// declaration including doc comments and trailing blank line").
pub(crate) fn extend_over_trailing_blank_line(text: &str, range: TextRange) -> TextRange {
    let end: usize = range.end().into();
    let rest = &text[end.min(text.len())..];
    let mut extra = 0usize;
    let mut chars = rest.char_indices().peekable();
    // Skip to the end of the current line first.
    while let Some(&(i, c)) = chars.peek() {
        if c == '\n' {
            extra = i + 1;
            chars.next();
            break;
        }
        chars.next();
    }
    if extra == 0 {
        return range;
    }
    let after_line = &rest[extra..];
    if after_line.starts_with('\n') {
        extra += 1;
    }
    TextRange::new(range.start(), (end + extra).try_into().unwrap())
}

/// A declaration's full span: its leading doc comment, the node itself,
/// and one trailing blank line, combining [`parser::extend_span_over_doc_comment`]
/// and [`extend_over_trailing_blank_line`] for operations (move, safe
/// delete) that relocate or remove a whole declaration.
pub(crate) fn full_declaration_range(file: &File, node_range: TextRange) -> TextRange {
    let start: usize = node_range.start().into();
    let extended_start = parser::extend_span_over_doc_comment(&file.text, start);
    let with_trailing = extend_over_trailing_blank_line(&file.text, node_range);
    TextRange::new((extended_start as u32).into(), with_trailing.end())
}

/// Converts a [`crate::base::LineCol`]-based reference span plus the
/// symbol's (old) name length back into a byte range, since
/// [`crate::model::Reference`] carries line/column for user messages but
/// the executor needs exact byte ranges.
pub(crate) fn reference_range(file: &File, span: &crate::base::Span, name_len: usize) -> Option<TextRange> {
    let start = file.line_index.offset(span.start)?;
    Some(TextRange::new(start, start + text_size::TextSize::from(name_len as u32)))
}
