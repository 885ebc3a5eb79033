//! `SyntaxKind` — the single flat enum rowan's lossless tree is built from.
//!
//! Token kinds (leaves) come from the [`super::lexer`]; node kinds
//! (composites) are only ever produced by [`super::parse`]. Both live in one
//! enum because `rowan::Language::Kind` requires it.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // ---- trivia ----
    WHITESPACE,
    LINE_COMMENT,
    BLOCK_COMMENT,

    // ---- literals / names ----
    IDENT,
    INT_LIT,
    FLOAT_LIT,
    STRING_LIT,

    // ---- keywords ----
    PACKAGE_KW,
    IMPORT_KW,
    FUNC_KW,
    TYPE_KW,
    VAR_KW,
    CONST_KW,
    STRUCT_KW,
    INTERFACE_KW,
    RETURN_KW,
    IF_KW,
    ELSE_KW,
    FOR_KW,
    RANGE_KW,
    BREAK_KW,
    CONTINUE_KW,
    GOTO_KW,

    // ---- punctuation ----
    L_PAREN,
    R_PAREN,
    L_BRACE,
    R_BRACE,
    L_BRACK,
    R_BRACK,
    COMMA,
    DOT,
    SEMI,
    COLON,
    COLON_EQ,
    EQ,
    STAR,
    AMP,
    ELLIPSIS,
    OP, // any other run of operator characters, kept verbatim

    ERROR_TOKEN,

    // ---- nodes ----
    SOURCE_FILE,
    PACKAGE_CLAUSE,
    IMPORT_DECL,
    IMPORT_SPEC,
    FUNC_DECL,
    RECEIVER,
    PARAM_LIST,
    PARAM,
    RESULT_LIST,
    TYPE_DECL,
    TYPE_SPEC,
    STRUCT_TYPE,
    INTERFACE_TYPE,
    METHOD_SIG,
    FIELD_LIST,
    FIELD,
    VAR_DECL,
    CONST_DECL,
    VAR_SPEC,
    CONST_SPEC,
    BLOCK,
    RETURN_STMT,
    SHORT_VAR_DECL,
    ASSIGN_STMT,
    EXPR_STMT,
    OTHER_STMT,
    CALL_EXPR,
    IDENT_EXPR,
    SELECTOR_EXPR,
    LITERAL_EXPR,
    PAREN_EXPR,
    BINARY_EXPR,
    TYPE_REF,
    ARG_LIST,
    ERROR_NODE,

    #[doc(hidden)]
    __LAST,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::WHITESPACE | SyntaxKind::LINE_COMMENT | SyntaxKind::BLOCK_COMMENT
        )
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::PACKAGE_KW
                | SyntaxKind::IMPORT_KW
                | SyntaxKind::FUNC_KW
                | SyntaxKind::TYPE_KW
                | SyntaxKind::VAR_KW
                | SyntaxKind::CONST_KW
                | SyntaxKind::STRUCT_KW
                | SyntaxKind::INTERFACE_KW
                | SyntaxKind::RETURN_KW
                | SyntaxKind::IF_KW
                | SyntaxKind::ELSE_KW
                | SyntaxKind::FOR_KW
                | SyntaxKind::RANGE_KW
                | SyntaxKind::BREAK_KW
                | SyntaxKind::CONTINUE_KW
                | SyntaxKind::GOTO_KW
        )
    }
}

/// Marker type implementing `rowan::Language` over [`SyntaxKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lang {}

impl rowan::Language for Lang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> SyntaxKind {
        assert!(raw.0 < SyntaxKind::__LAST as u16);
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: SyntaxKind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

pub type SyntaxNode = rowan::SyntaxNode<Lang>;
pub type SyntaxToken = rowan::SyntaxToken<Lang>;
pub type SyntaxElement = rowan::NodeOrToken<SyntaxNode, SyntaxToken>;
