//! Lexing and parsing for the target language's source files.
//!
//! Three layers, thinnest to thickest:
//! - [`lexer`]: byte stream → flat token stream (every byte accounted for).
//! - [`parser`]: token stream → lossless `rowan` green tree.
//! - [`ast`]: typed read-only views over the green tree.

mod ast;
mod lexer;
mod parser;
mod syntax_kind;

pub use ast::{
    ArgList, AssignStmt, AstNode, Block, ConstDecl, ConstSpec, ExprStmt, Field, FieldList,
    FuncDecl, IdentExpr, ImportDecl, ImportSpec, InterfaceType, MethodSig, OtherStmt, Param,
    ParamList, PackageClause, Receiver, ResultList, ReturnStmt, SelectorExpr, ShortVarDecl,
    SourceFile, StructType, TypeDecl, TypeRef, TypeSpec, VarDecl, VarSpec,
};
pub use parser::{parse, Parse, SyntaxError};
pub use syntax_kind::{Lang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

/// Scans raw source text for doc comments and blank-line separators
/// immediately preceding `decl_start`, returning the offset the
/// declaration's "full span" (including its doc comment) should start at.
///
/// Operates on source bytes rather than CST trivia ownership: several
/// operations (move, extract, safe delete) need a declaration's doc
/// comment to travel with it, but attaching comment tokens to the
/// following node in the parser itself would complicate every grammar
/// rule for a need only a handful of call sites have.
pub fn extend_span_over_doc_comment(source: &str, decl_start: usize) -> usize {
    let before = &source[..decl_start];
    let mut line_start = decl_start;
    for line in before.lines().rev() {
        let trimmed = line.trim_end();
        if trimmed.trim_start().starts_with("//") {
            line_start -= line.len() + 1;
            continue;
        }
        if trimmed.is_empty() {
            break;
        }
        break;
    }
    line_start.min(decl_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extends_span_over_leading_doc_comment() {
        let source = "// Add sums two ints.\n// It never overflows in practice.\nfunc Add(a, b int) int {\n\treturn a + b\n}\n";
        let decl_start = source.find("func Add").unwrap();
        let extended = extend_span_over_doc_comment(source, decl_start);
        assert_eq!(&source[extended..decl_start], "// Add sums two ints.\n// It never overflows in practice.\n");
    }

    #[test]
    fn stops_at_blank_line() {
        let source = "package p\n\nfunc Add() {}\n";
        let decl_start = source.find("func Add").unwrap();
        let extended = extend_span_over_doc_comment(source, decl_start);
        assert_eq!(extended, decl_start);
    }
}
