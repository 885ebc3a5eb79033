//! Workspace-wide reverse index from [`QualifiedSymbolId`] to its
//! [`Reference`]s.

use rustc_hash::FxHashMap;

use super::reference::Reference;
use super::symbol::QualifiedSymbolId;

/// Built by [`crate::resolver`] in one pass over every package after all
/// symbol tables exist, since a reference in package A can target a symbol
/// declared in package B. Invalidated wholesale on any edit that could
/// change resolution (see [`crate::resolver::Resolver::invalidate`]) rather
/// than patched incrementally: workspace-level rename frequency doesn't
/// justify the bookkeeping a precise incremental index would need.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    by_symbol: FxHashMap<QualifiedSymbolId, Vec<Reference>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.by_symbol.clear();
    }

    pub fn record(&mut self, reference: Reference) {
        self.by_symbol
            .entry(reference.symbol.clone())
            .or_default()
            .push(reference);
    }

    pub fn references_to(&self, symbol: &QualifiedSymbolId) -> &[Reference] {
        self.by_symbol.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_referenced(&self, symbol: &QualifiedSymbolId) -> bool {
        !self.references_to(symbol).is_empty()
    }

    pub fn symbol_count(&self) -> usize {
        self.by_symbol.len()
    }
}
