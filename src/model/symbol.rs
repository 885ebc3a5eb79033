//! The symbol table's element type and its arena index.

use smol_str::SmolStr;

use crate::base::Span;

/// Arena index into a [`super::SymbolTable`]. Cheap to copy and to use as a
/// graph node id, per the workspace's "arena + integer ids, no pointer
/// cycles" ownership design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub u32);

/// A [`SymbolId`] is only unique within the table that allocated it; two
/// different packages both hand out id 0 to their first symbol. Anything
/// that crosses package boundaries — the workspace-wide [`super::ReferenceIndex`]
/// chief among them — has to key on the pair instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedSymbolId {
    pub package: SmolStr,
    pub id: SymbolId,
}

impl QualifiedSymbolId {
    pub fn new(package: impl Into<SmolStr>, id: SymbolId) -> Self {
        Self {
            package: package.into(),
            id,
        }
    }
}

/// What kind of declaration a [`Symbol`] denotes, with the kind-specific
/// data each one carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Function {
        params: Vec<ParamInfo>,
        results: Vec<ParamInfo>,
    },
    Method {
        receiver: ParamInfo,
        params: Vec<ParamInfo>,
        results: Vec<ParamInfo>,
    },
    Struct {
        fields: Vec<FieldInfo>,
    },
    Interface {
        methods: Vec<SmolStr>,
    },
    Variable {
        type_name: Option<SmolStr>,
    },
    Constant {
        type_name: Option<SmolStr>,
    },
    Field {
        type_name: Option<SmolStr>,
    },
    /// A parameter or named result, modeled as a symbol so change-signature
    /// and extract can find its references inside the enclosing body.
    Parameter {
        type_name: Option<SmolStr>,
    },
}

impl SymbolKind {
    pub fn label(&self) -> &'static str {
        match self {
            SymbolKind::Function { .. } => "function",
            SymbolKind::Method { .. } => "method",
            SymbolKind::Struct { .. } => "struct",
            SymbolKind::Interface { .. } => "interface",
            SymbolKind::Variable { .. } => "variable",
            SymbolKind::Constant { .. } => "constant",
            SymbolKind::Field { .. } => "field",
            SymbolKind::Parameter { .. } => "parameter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: Option<SmolStr>,
    pub type_name: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: SmolStr,
    pub type_name: SmolStr,
}

/// A single named declaration in a package, keyed into the symbol table by
/// [`SymbolId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: SmolStr,
    pub kind: SymbolKind,
    /// Import path of the package this symbol belongs to.
    pub declaring_package: SmolStr,
    /// Package-relative file this symbol is declared in.
    pub file: std::path::PathBuf,
    /// Full declaration span, extended to include a leading doc comment.
    pub span: Span,
    pub doc_comment: Option<String>,
    /// For methods: the receiver's named type, duplicated from `kind` for
    /// quick lookup without matching on `kind`.
    pub receiver_type: Option<SmolStr>,
    /// Enclosing struct/interface symbol, for fields and methods.
    pub parent: Option<SymbolId>,
    pub children: Vec<SymbolId>,
}

impl Symbol {
    pub fn is_exported(&self) -> bool {
        crate::base::is_exported(&self.name)
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, SymbolKind::Method { .. })
    }

    pub fn qualified_id(&self) -> QualifiedSymbolId {
        QualifiedSymbolId::new(self.declaring_package.clone(), self.id)
    }
}
