//! Logos-based lexer producing a flat token stream with exact byte spans.
//!
//! Trivia (whitespace, comments) is emitted as ordinary tokens rather than
//! skipped, so the parser can re-attach it to the tree and guarantee
//! lossless re-emission.

use logos::Logos;
use text_size::{TextRange, TextSize};

use super::syntax_kind::SyntaxKind;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Tok {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("func")]
    Func,
    #[token("type")]
    Type,
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("struct")]
    Struct,
    #[token("interface")]
    Interface,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("range")]
    Range,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("goto")]
    Goto,

    #[regex(r"[\p{XID_Start}_][\p{XID_Continue}_]*")]
    Ident,

    #[regex(r"[0-9]+\.[0-9]+")]
    FloatLit,
    #[regex(r"[0-9]+")]
    IntLit,
    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLit,
    #[regex(r"`[^`]*`")]
    RawStringLit,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token(":=")]
    ColonEq,
    #[token("=", priority = 3)]
    Eq,
    #[token("*")]
    Star,
    #[token("&", priority = 3)]
    Amp,

    #[regex(r"[+\-/%<>!=&|^~]+")]
    Op,
}

/// One lexed token: kind plus exact byte range in the source.
#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
}

/// Lexes `source` into a complete, lossless token stream.
///
/// Every byte of `source` is covered by exactly one token; unrecognized
/// bytes become single-byte `ERROR_TOKEN`s rather than aborting the lex,
/// matching the parser contract that a syntactically invalid file degrades
/// its package rather than failing workspace load.
pub fn lex(source: &str) -> Vec<Token> {
    let mut lexer = Tok::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let range = TextRange::new(TextSize::from(span.start as u32), TextSize::from(span.end as u32));
        let kind = match result {
            Ok(tok) => map_kind(tok),
            Err(()) => SyntaxKind::ERROR_TOKEN,
        };
        tokens.push(Token { kind, range });
    }

    tokens
}

fn map_kind(tok: Tok) -> SyntaxKind {
    match tok {
        Tok::Whitespace => SyntaxKind::WHITESPACE,
        Tok::LineComment => SyntaxKind::LINE_COMMENT,
        Tok::BlockComment => SyntaxKind::BLOCK_COMMENT,
        Tok::Package => SyntaxKind::PACKAGE_KW,
        Tok::Import => SyntaxKind::IMPORT_KW,
        Tok::Func => SyntaxKind::FUNC_KW,
        Tok::Type => SyntaxKind::TYPE_KW,
        Tok::Var => SyntaxKind::VAR_KW,
        Tok::Const => SyntaxKind::CONST_KW,
        Tok::Struct => SyntaxKind::STRUCT_KW,
        Tok::Interface => SyntaxKind::INTERFACE_KW,
        Tok::Return => SyntaxKind::RETURN_KW,
        Tok::If => SyntaxKind::IF_KW,
        Tok::Else => SyntaxKind::ELSE_KW,
        Tok::For => SyntaxKind::FOR_KW,
        Tok::Range => SyntaxKind::RANGE_KW,
        Tok::Break => SyntaxKind::BREAK_KW,
        Tok::Continue => SyntaxKind::CONTINUE_KW,
        Tok::Goto => SyntaxKind::GOTO_KW,
        Tok::Ident => SyntaxKind::IDENT,
        Tok::FloatLit => SyntaxKind::FLOAT_LIT,
        Tok::IntLit => SyntaxKind::INT_LIT,
        Tok::StringLit | Tok::RawStringLit => SyntaxKind::STRING_LIT,
        Tok::LParen => SyntaxKind::L_PAREN,
        Tok::RParen => SyntaxKind::R_PAREN,
        Tok::LBrace => SyntaxKind::L_BRACE,
        Tok::RBrace => SyntaxKind::R_BRACE,
        Tok::LBrack => SyntaxKind::L_BRACK,
        Tok::RBrack => SyntaxKind::R_BRACK,
        Tok::Comma => SyntaxKind::COMMA,
        Tok::Dot => SyntaxKind::DOT,
        Tok::Ellipsis => SyntaxKind::ELLIPSIS,
        Tok::Semi => SyntaxKind::SEMI,
        Tok::Colon => SyntaxKind::COLON,
        Tok::ColonEq => SyntaxKind::COLON_EQ,
        Tok::Eq => SyntaxKind::EQ,
        Tok::Star => SyntaxKind::STAR,
        Tok::Amp => SyntaxKind::AMP,
        Tok::Op => SyntaxKind::OP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_covers_every_byte() {
        let source = "package main\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n";
        let tokens = lex(source);
        let mut cursor = TextSize::from(0);
        for tok in &tokens {
            assert_eq!(tok.range.start(), cursor);
            cursor = tok.range.end();
        }
        assert_eq!(cursor, TextSize::from(source.len() as u32));
    }

    #[test]
    fn keywords_and_idents() {
        let tokens = lex("package main");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::PACKAGE_KW,
                SyntaxKind::WHITESPACE,
                SyntaxKind::IDENT,
            ]
        );
    }
}
