//! Per-package arena of [`Symbol`]s plus name-keyed lookup maps.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::symbol::{Symbol, SymbolId};

/// Owns every symbol declared in one package. Symbols are never removed
/// individually; a package whose file changed has its whole table rebuilt
/// and replaced (§4.2's "rebuild, don't patch" rule), which keeps
/// [`SymbolId`] valid for the table's full lifetime.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    arena: Vec<Symbol>,
    /// Top-level names (functions, types, vars, consts), insertion-ordered
    /// so iteration mirrors declaration order for diffing/testing.
    by_name: IndexMap<SmolStr, SymbolId>,
    /// Methods keyed by (receiver type name, method name).
    by_receiver: FxHashMap<(SmolStr, SmolStr), SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.arena.len() as u32);
        symbol.id = id;
        if let Some(receiver_type) = symbol.receiver_type.clone() {
            self.by_receiver
                .insert((receiver_type, symbol.name.clone()), id);
        } else {
            self.by_name.entry(symbol.name.clone()).or_insert(id);
        }
        self.arena.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.arena.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.arena.get_mut(id.0 as usize)
    }

    pub fn by_name(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name).and_then(|id| self.get(*id))
    }

    pub fn method(&self, receiver_type: &str, name: &str) -> Option<&Symbol> {
        self.by_receiver
            .get(&(SmolStr::new(receiver_type), SmolStr::new(name)))
            .and_then(|id| self.get(*id))
    }

    pub fn methods_of(&self, receiver_type: &str) -> impl Iterator<Item = &Symbol> {
        self.arena
            .iter()
            .filter(move |sym| sym.receiver_type.as_deref() == Some(receiver_type))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.arena.iter()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{Position, Span};
    use crate::model::symbol::SymbolKind;

    fn dummy(name: &str) -> Symbol {
        Symbol {
            id: SymbolId(0),
            name: SmolStr::new(name),
            kind: SymbolKind::Variable { type_name: None },
            declaring_package: SmolStr::new("example.com/app"),
            file: "a.go".into(),
            span: Span::new(Position::new(1, 1), Position::new(1, 1)),
            doc_comment: None,
            receiver_type: None,
            parent: None,
            children: Vec::new(),
        }
    }

    #[test]
    fn inserts_and_looks_up_by_name() {
        let mut table = SymbolTable::new();
        let id = table.insert(dummy("Add"));
        assert_eq!(table.by_name("Add").unwrap().id, id);
    }

    #[test]
    fn methods_are_keyed_by_receiver_and_name() {
        let mut table = SymbolTable::new();
        let mut m = dummy("Bump");
        m.receiver_type = Some(SmolStr::new("Counter"));
        table.insert(m);
        assert!(table.method("Counter", "Bump").is_some());
        assert!(table.by_name("Bump").is_none());
    }
}
