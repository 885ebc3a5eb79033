//! Thin typed wrappers over [`SyntaxNode`]s.
//!
//! Each wrapper is a newtype holding the untyped node plus a handful of
//! accessor methods that look up children by kind. None of this owns data;
//! every wrapper is cheap to construct and just re-derives from the
//! underlying green tree, matching the "typed view over an untyped tree"
//! convention rust-analyzer-style parsers use.

use super::syntax_kind::{SyntaxKind, SyntaxNode, SyntaxToken};

pub trait AstNode: Sized {
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

macro_rules! ast_node {
    ($name:ident, $kind:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            fn cast(node: SyntaxNode) -> Option<Self> {
                if node.kind() == $kind {
                    Some(Self(node))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

ast_node!(SourceFile, SyntaxKind::SOURCE_FILE);
ast_node!(PackageClause, SyntaxKind::PACKAGE_CLAUSE);
ast_node!(ImportDecl, SyntaxKind::IMPORT_DECL);
ast_node!(ImportSpec, SyntaxKind::IMPORT_SPEC);
ast_node!(FuncDecl, SyntaxKind::FUNC_DECL);
ast_node!(Receiver, SyntaxKind::RECEIVER);
ast_node!(ParamList, SyntaxKind::PARAM_LIST);
ast_node!(Param, SyntaxKind::PARAM);
ast_node!(ResultList, SyntaxKind::RESULT_LIST);
ast_node!(TypeDecl, SyntaxKind::TYPE_DECL);
ast_node!(TypeSpec, SyntaxKind::TYPE_SPEC);
ast_node!(StructType, SyntaxKind::STRUCT_TYPE);
ast_node!(InterfaceType, SyntaxKind::INTERFACE_TYPE);
ast_node!(MethodSig, SyntaxKind::METHOD_SIG);
ast_node!(FieldList, SyntaxKind::FIELD_LIST);
ast_node!(Field, SyntaxKind::FIELD);
ast_node!(VarDecl, SyntaxKind::VAR_DECL);
ast_node!(ConstDecl, SyntaxKind::CONST_DECL);
ast_node!(VarSpec, SyntaxKind::VAR_SPEC);
ast_node!(ConstSpec, SyntaxKind::CONST_SPEC);
ast_node!(Block, SyntaxKind::BLOCK);
ast_node!(ReturnStmt, SyntaxKind::RETURN_STMT);
ast_node!(ShortVarDecl, SyntaxKind::SHORT_VAR_DECL);
ast_node!(AssignStmt, SyntaxKind::ASSIGN_STMT);
ast_node!(ExprStmt, SyntaxKind::EXPR_STMT);
ast_node!(OtherStmt, SyntaxKind::OTHER_STMT);
ast_node!(IdentExpr, SyntaxKind::IDENT_EXPR);
ast_node!(SelectorExpr, SyntaxKind::SELECTOR_EXPR);
ast_node!(ArgList, SyntaxKind::ARG_LIST);
ast_node!(TypeRef, SyntaxKind::TYPE_REF);

fn child_node<T: AstNode>(node: &SyntaxNode) -> Option<T> {
    node.children().find_map(T::cast)
}

fn children_nodes<T: AstNode>(node: &SyntaxNode) -> impl Iterator<Item = T> + use<T> {
    node.children().filter_map(T::cast)
}

fn first_token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == kind)
}

impl SourceFile {
    pub fn package_clause(&self) -> Option<PackageClause> {
        child_node(&self.0)
    }

    pub fn imports(&self) -> impl Iterator<Item = ImportDecl> {
        children_nodes(&self.0)
    }

    pub fn func_decls(&self) -> impl Iterator<Item = FuncDecl> {
        children_nodes(&self.0)
    }

    pub fn type_decls(&self) -> impl Iterator<Item = TypeDecl> {
        children_nodes(&self.0)
    }

    pub fn var_decls(&self) -> impl Iterator<Item = VarDecl> {
        children_nodes(&self.0)
    }

    pub fn const_decls(&self) -> impl Iterator<Item = ConstDecl> {
        children_nodes(&self.0)
    }
}

impl PackageClause {
    pub fn name(&self) -> Option<SyntaxToken> {
        first_token(&self.0, SyntaxKind::IDENT)
    }
}

impl ImportDecl {
    pub fn specs(&self) -> impl Iterator<Item = ImportSpec> {
        children_nodes(&self.0)
    }
}

impl ImportSpec {
    /// The quoted import path, including its surrounding quotes.
    pub fn path_token(&self) -> Option<SyntaxToken> {
        first_token(&self.0, SyntaxKind::STRING_LIT)
    }

    /// The import path with surrounding quotes stripped.
    pub fn path(&self) -> Option<String> {
        let text = self.path_token()?.text().to_string();
        Some(text.trim_matches(|c| c == '"' || c == '`').to_string())
    }

    /// Explicit alias, if the import is written as `alias "path"`.
    pub fn alias(&self) -> Option<SyntaxToken> {
        first_token(&self.0, SyntaxKind::IDENT)
    }
}

impl FuncDecl {
    pub fn name(&self) -> Option<SyntaxToken> {
        // The function name is the first direct IDENT child that isn't
        // inside the receiver node.
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind() == SyntaxKind::IDENT)
    }

    pub fn receiver(&self) -> Option<Receiver> {
        child_node(&self.0)
    }

    pub fn params(&self) -> Option<ParamList> {
        child_node(&self.0)
    }

    pub fn results(&self) -> Option<ResultList> {
        child_node(&self.0)
    }

    pub fn body(&self) -> Option<Block> {
        child_node(&self.0)
    }

    pub fn is_method(&self) -> bool {
        self.receiver().is_some()
    }
}

impl Receiver {
    pub fn param(&self) -> Option<Param> {
        child_node(&self.0)
    }
}

impl ParamList {
    pub fn params(&self) -> impl Iterator<Item = Param> {
        children_nodes(&self.0)
    }
}

impl ResultList {
    pub fn params(&self) -> impl Iterator<Item = Param> {
        children_nodes(&self.0)
    }
}

impl Param {
    pub fn names(&self) -> Vec<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::IDENT)
            .collect()
    }

    pub fn type_ref(&self) -> Option<TypeRef> {
        child_node(&self.0)
    }

    pub fn is_variadic(&self) -> bool {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .any(|t| t.kind() == SyntaxKind::ELLIPSIS)
    }
}

impl TypeRef {
    /// The textual rendering of the type, e.g. `*pkg.Name` or `[]int`.
    pub fn text(&self) -> String {
        self.0.text().to_string()
    }

    pub fn is_pointer(&self) -> bool {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .any(|t| t.kind() == SyntaxKind::STAR)
    }
}

impl TypeDecl {
    pub fn spec(&self) -> Option<TypeSpec> {
        child_node(&self.0)
    }
}

impl TypeSpec {
    pub fn name(&self) -> Option<SyntaxToken> {
        first_token(&self.0, SyntaxKind::IDENT)
    }

    pub fn struct_type(&self) -> Option<StructType> {
        child_node(&self.0)
    }

    pub fn interface_type(&self) -> Option<InterfaceType> {
        child_node(&self.0)
    }

    pub fn alias_type(&self) -> Option<TypeRef> {
        child_node(&self.0)
    }
}

impl StructType {
    pub fn fields(&self) -> impl Iterator<Item = Field> {
        child_node::<FieldList>(&self.0)
            .into_iter()
            .flat_map(|list| list.fields().collect::<Vec<_>>())
    }
}

impl FieldList {
    pub fn fields(&self) -> impl Iterator<Item = Field> {
        children_nodes(&self.0)
    }
}

impl Field {
    pub fn name(&self) -> Option<SyntaxToken> {
        first_token(&self.0, SyntaxKind::IDENT)
    }

    pub fn type_ref(&self) -> Option<TypeRef> {
        child_node(&self.0)
    }
}

impl InterfaceType {
    pub fn methods(&self) -> impl Iterator<Item = MethodSig> {
        children_nodes(&self.0)
    }
}

impl MethodSig {
    pub fn name(&self) -> Option<SyntaxToken> {
        first_token(&self.0, SyntaxKind::IDENT)
    }

    pub fn params(&self) -> Option<ParamList> {
        child_node(&self.0)
    }

    pub fn results(&self) -> Option<ResultList> {
        child_node(&self.0)
    }
}

impl VarDecl {
    pub fn specs(&self) -> impl Iterator<Item = VarSpec> + use<> {
        children_nodes(&self.0)
    }
}

impl ConstDecl {
    pub fn specs(&self) -> impl Iterator<Item = ConstSpec> + use<> {
        children_nodes(&self.0)
    }
}

impl VarSpec {
    pub fn names(&self) -> Vec<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::IDENT)
            .collect()
    }

    pub fn type_ref(&self) -> Option<TypeRef> {
        child_node(&self.0)
    }
}

impl ConstSpec {
    pub fn names(&self) -> Vec<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::IDENT)
            .collect()
    }

    pub fn type_ref(&self) -> Option<TypeRef> {
        child_node(&self.0)
    }
}

impl Block {
    pub fn stmts(&self) -> impl Iterator<Item = SyntaxNode> {
        self.0.children()
    }

    pub fn return_stmts(&self) -> impl Iterator<Item = ReturnStmt> {
        self.0
            .descendants()
            .filter_map(ReturnStmt::cast)
    }
}

impl ArgList {
    /// Splits the parenthesized argument list back into its individual
    /// argument texts, respecting nested parens/brackets so a comma inside
    /// a nested call isn't mistaken for an argument separator. Arguments
    /// are opaque token runs in this grammar (see `parser::parse_call_like_expr`),
    /// so this is a text-level split rather than a per-argument AST walk.
    pub fn arg_texts(&self) -> Vec<String> {
        let tokens: Vec<SyntaxToken> = self.0.children_with_tokens().filter_map(|e| e.into_token()).collect();
        let inner = match tokens.split_first() {
            Some((_open, rest)) => match rest.split_last() {
                Some((_close, body)) => body,
                None => &[],
            },
            None => &[],
        };

        let mut args = Vec::new();
        let mut current = String::new();
        let mut depth = 0i32;
        for token in inner {
            match token.kind() {
                SyntaxKind::L_PAREN | SyntaxKind::L_BRACK => {
                    depth += 1;
                    current.push_str(token.text());
                }
                SyntaxKind::R_PAREN | SyntaxKind::R_BRACK => {
                    depth -= 1;
                    current.push_str(token.text());
                }
                SyntaxKind::COMMA if depth == 0 => {
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
        args
    }
}

impl ShortVarDecl {
    /// The identifiers left of `:=`, in source order.
    pub fn names(&self) -> Vec<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .take_while(|t| t.kind() != SyntaxKind::COLON_EQ)
            .filter(|t| t.kind() == SyntaxKind::IDENT)
            .collect()
    }
}

impl AssignStmt {
    /// The identifiers left of `=`, in source order (may include selector
    /// qualifiers, e.g. `c.field = ...` yields `c`).
    pub fn lvalue_names(&self) -> Vec<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .take_while(|t| t.kind() != SyntaxKind::EQ)
            .filter(|t| t.kind() == SyntaxKind::IDENT)
            .collect()
    }
}

impl ExprStmt {
    pub fn callee_name(&self) -> Option<SyntaxToken> {
        let ident_expr = child_node::<IdentExpr>(&self.0);
        let selector_expr = child_node::<SelectorExpr>(&self.0);
        if let Some(ident) = ident_expr {
            first_token(ident.syntax(), SyntaxKind::IDENT)
        } else {
            selector_expr.and_then(|sel| {
                sel.syntax()
                    .children_with_tokens()
                    .filter_map(|e| e.into_token())
                    .filter(|t| t.kind() == SyntaxKind::IDENT)
                    .last()
            })
        }
    }

    pub fn args(&self) -> Option<ArgList> {
        child_node(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;

    #[test]
    fn walks_func_decl_structure() {
        let parsed = parse("package p\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n");
        let file = SourceFile::cast(parsed.syntax_node()).expect("source file");
        assert_eq!(
            file.package_clause().unwrap().name().unwrap().text(),
            "p"
        );
        let func = file.func_decls().next().expect("func decl");
        assert_eq!(func.name().unwrap().text(), "Add");
        assert!(!func.is_method());
        let params: Vec<_> = func.params().unwrap().params().collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].names()[0].text(), "a");
        assert_eq!(params[1].names()[0].text(), "b");
        assert_eq!(params[1].type_ref().unwrap().text(), "int");
    }

    #[test]
    fn walks_method_receiver_and_struct() {
        let parsed = parse(
            "package x\n\ntype C struct {\n\tr int\n}\n\nfunc (c *C) Bump() {\n\tc.r = 1\n}\n",
        );
        let file = SourceFile::cast(parsed.syntax_node()).unwrap();
        let ty = file.type_decls().next().unwrap();
        let fields: Vec<_> = ty.spec().unwrap().struct_type().unwrap().fields().collect();
        assert_eq!(fields[0].name().unwrap().text(), "r");

        let func = file.func_decls().next().unwrap();
        assert!(func.is_method());
        let recv = func.receiver().unwrap();
        assert_eq!(recv.param().unwrap().names()[0].text(), "c");
    }

    #[test]
    fn finds_imports() {
        let parsed = parse("package p\n\nimport (\n\t\"fmt\"\n\talias \"some/pkg\"\n)\n");
        let file = SourceFile::cast(parsed.syntax_node()).unwrap();
        let specs: Vec<_> = file.imports().next().unwrap().specs().collect();
        assert_eq!(specs[0].path().unwrap(), "fmt");
        assert_eq!(specs[1].alias().unwrap().text(), "alias");
        assert_eq!(specs[1].path().unwrap(), "some/pkg");
    }
}
