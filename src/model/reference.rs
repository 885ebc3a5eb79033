//! Uses of a [`super::Symbol`] found while indexing a workspace.

use std::path::PathBuf;

use crate::base::Span;

use super::symbol::QualifiedSymbolId;

/// The syntactic role a reference occurrence plays, used by operations that
/// only care about a subset of uses (e.g. safe-delete only needs
/// [`ReferenceKind::Read`]/[`ReferenceKind::Call`] occurrences, not the
/// declaration site itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Declaration,
    Read,
    Write,
    Call,
    /// An interface or struct method referenced through a selector
    /// expression whose receiver's static type couldn't be pinned down, so
    /// the target was found by the resolver's best-effort structural
    /// matching rule instead of a type-checked lookup.
    StructuralMethodUse,
}

/// One resolved occurrence of a symbol, with enough position information to
/// both edit the occurrence and report it to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub symbol: QualifiedSymbolId,
    pub file: PathBuf,
    pub span: Span,
    pub kind: ReferenceKind,
    /// The package the reference occurs in, which may differ from the
    /// symbol's declaring package for cross-package uses.
    pub use_site_package: String,
}
