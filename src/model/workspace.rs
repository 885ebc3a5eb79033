//! The root of the in-memory model: every package in a module, loaded from
//! one directory tree.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{GorefactorError, Result};
use crate::graph::PackageGraph;

use super::package::Package;
use super::reference_index::ReferenceIndex;

/// A loaded module: its declared root import path, every package found
/// under its root directory, and the workspace-wide reference index built
/// over them.
///
/// Owned behind a single `parking_lot::RwLock` by [`crate::engine::Engine`]
/// (§5): readers (analysis, plan preview) take the read lock, writers
/// (executor commit, watcher-driven reload) take the write lock. This
/// mirrors the arena-of-packages-plus-integer-ids ownership style used
/// throughout the model rather than letting packages hold references to
/// each other directly.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub module_path: String,
    pub packages: IndexMap<String, Package>,
    pub references: ReferenceIndex,
    pub import_graph: PackageGraph,
}

impl Workspace {
    pub fn new(root: PathBuf, module_path: String) -> Self {
        Self {
            root,
            module_path,
            packages: IndexMap::new(),
            references: ReferenceIndex::new(),
            import_graph: PackageGraph::new(),
        }
    }

    pub fn package(&self, import_path: &str) -> Option<&Package> {
        self.packages.get(import_path)
    }

    pub fn package_mut(&mut self, import_path: &str) -> Option<&mut Package> {
        self.packages.get_mut(import_path)
    }

    pub fn require_package(&self, import_path: &str) -> Result<&Package> {
        self.package(import_path)
            .ok_or_else(|| GorefactorError::symbol_not_found(import_path))
    }

    /// Maps an import path to the directory it would live in, rooted at
    /// `self.root`, regardless of whether a package already exists there.
    pub fn dir_for_import_path(&self, import_path: &str) -> Option<PathBuf> {
        let suffix = import_path.strip_prefix(&self.module_path)?;
        let suffix = suffix.trim_start_matches('/');
        Some(self.root.join(suffix))
    }

    pub fn import_path_for_dir(&self, dir: &Path) -> Option<String> {
        let rel = dir.strip_prefix(&self.root).ok()?;
        if rel.as_os_str().is_empty() {
            return Some(self.module_path.clone());
        }
        let rel_str = rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
        Some(format!("{}/{}", self.module_path, rel_str))
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}
