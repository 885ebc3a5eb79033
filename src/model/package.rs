//! A package: a directory of files sharing one package-clause name and
//! import path.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::file::File;
use super::symbol_table::SymbolTable;

/// One resolved import: the literal path as written, plus any explicit
/// alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub path: String,
    pub alias: Option<SmolStr>,
}

#[derive(Debug, Clone)]
pub struct Package {
    /// Import path, e.g. `example.com/app/internal/billing`. Derived from
    /// the module's root import path plus the package directory's relative
    /// path (§4 "module identity" rule).
    pub import_path: String,
    /// The package-clause name, which may differ from the last segment of
    /// `import_path` (the directory name convention is a convention, not a
    /// requirement).
    pub name: SmolStr,
    pub dir: PathBuf,
    pub files: IndexMap<PathBuf, File>,
    pub symbols: SymbolTable,
    /// Deduplicated union of every file's import list, in first-seen order.
    pub imports: Vec<Import>,
    pub is_test_package: bool,
}

impl Package {
    pub fn new(import_path: String, name: SmolStr, dir: PathBuf) -> Self {
        Self {
            import_path,
            name,
            dir,
            files: IndexMap::new(),
            symbols: SymbolTable::new(),
            imports: Vec::new(),
            is_test_package: false,
        }
    }

    pub fn file(&self, path: &Path) -> Option<&File> {
        self.files.get(path)
    }

    pub fn file_mut(&mut self, path: &Path) -> Option<&mut File> {
        self.files.get_mut(path)
    }

    /// Rebuilds [`Self::imports`] by walking every file's import decls and
    /// deduplicating by path, keeping the first alias seen for a given
    /// path. Called after any file is (re)loaded.
    pub fn recompute_imports(&mut self) {
        use crate::parser::AstNode;

        let mut seen = indexmap::IndexSet::new();
        let mut imports = Vec::new();
        for file in self.files.values() {
            let Some(source_file) = file.source_file() else {
                continue;
            };
            for import_decl in source_file.imports() {
                for spec in import_decl.specs() {
                    let Some(path) = spec.path() else { continue };
                    if seen.insert(path.clone()) {
                        let alias = spec.alias().map(|t| SmolStr::new(t.text()));
                        imports.push(Import { path, alias });
                    }
                }
            }
        }
        self.imports = imports;
    }

    pub fn imports_path(&self, path: &str) -> bool {
        self.imports.iter().any(|i| i.path == path)
    }
}
