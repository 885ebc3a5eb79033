//! Builds and invalidates the workspace's symbol tables, import graph, and
//! reference index.

mod reference_collector;
mod symbol_builder;

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::graph::PackageGraph;
use crate::model::Workspace;

/// Owns the "is the derived data fresh" flag and a lock used only to
/// serialize rebuilds — deliberately separate from the
/// `parking_lot::RwLock<Workspace>` the engine holds (§5, §9), so a reader
/// blocked on a rebuild doesn't also block everyone else waiting on the
/// workspace lock.
pub struct Resolver {
    dirty: AtomicBool,
    rebuild_lock: Mutex<()>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            dirty: AtomicBool::new(true),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn invalidate(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Rebuilds symbol tables, the import graph, and the reference index if
    /// (and only if) something has invalidated them since the last
    /// rebuild. Double-checked: the cheap atomic read avoids taking
    /// `rebuild_lock` on the common "already fresh" path, and the second
    /// check inside the lock avoids a redundant rebuild if two callers
    /// raced to get here.
    pub fn ensure_fresh(&self, workspace: &mut Workspace) {
        if !self.dirty.load(Ordering::Acquire) {
            return;
        }
        let _guard = self.rebuild_lock.lock();
        if !self.dirty.load(Ordering::Acquire) {
            return;
        }
        rebuild(workspace);
        self.dirty.store(false, Ordering::Release);
    }
}

fn rebuild(workspace: &mut Workspace) {
    tracing::debug!(packages = workspace.package_count(), "rebuilding workspace index");

    let import_paths: Vec<String> = workspace.packages.keys().cloned().collect();
    for import_path in &import_paths {
        if let Some(package) = workspace.package_mut(import_path) {
            symbol_builder::build_symbol_table(package);
            package.recompute_imports();
        }
    }

    let mut graph = PackageGraph::new();
    for import_path in &import_paths {
        let package = workspace.require_package(import_path).expect("just listed");
        graph.node(import_path);
        for import in &package.imports {
            if workspace.packages.contains_key(&import.path) {
                graph.add_edge(import_path, &import.path, package.is_test_package);
            }
        }
    }
    workspace.import_graph = graph;

    reference_collector::collect_references(workspace);
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use smol_str::SmolStr;

    use crate::model::{File, Package, Workspace};

    use super::*;

    fn workspace_with(files: &[(&str, &str, &str)]) -> Workspace {
        // (import_path, file_name, source)
        let mut ws = Workspace::new(PathBuf::from("/ws"), "example.com/app".to_string());
        for (import_path, file_name, source) in files {
            let package = ws
                .packages
                .entry((*import_path).to_string())
                .or_insert_with(|| {
                    Package::new((*import_path).to_string(), SmolStr::new("pkg"), PathBuf::from(import_path))
                });
            let path = PathBuf::from(import_path).join(file_name);
            package.files.insert(path.clone(), File::load(path, (*source).to_string()));
        }
        ws
    }

    #[test]
    fn builds_symbols_and_marks_fresh_once() {
        let mut ws = workspace_with(&[(
            "example.com/app",
            "main.go",
            "package app\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n",
        )]);
        let resolver = Resolver::new();
        resolver.ensure_fresh(&mut ws);
        let pkg = ws.package("example.com/app").unwrap();
        assert!(pkg.symbols.by_name("Add").is_some());
        assert!(!resolver.dirty.load(Ordering::Acquire));
    }

    #[test]
    fn resolves_same_package_call() {
        let mut ws = workspace_with(&[(
            "example.com/app",
            "main.go",
            "package app\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n\nfunc main() {\n\tAdd(1, 2)\n}\n",
        )]);
        let resolver = Resolver::new();
        resolver.ensure_fresh(&mut ws);
        let pkg = ws.package("example.com/app").unwrap();
        let add = pkg.symbols.by_name("Add").unwrap();
        assert!(ws.references.is_referenced(&add.qualified_id()));
    }

    #[test]
    fn resolves_call_used_only_as_a_short_var_decl_initializer() {
        let mut ws = workspace_with(&[(
            "example.com/app",
            "main.go",
            "package app\n\nfunc Compute() int {\n\treturn 1\n}\n\nfunc main() {\n\tresult := Compute()\n\t_ = result\n}\n",
        )]);
        let resolver = Resolver::new();
        resolver.ensure_fresh(&mut ws);
        let pkg = ws.package("example.com/app").unwrap();
        let compute = pkg.symbols.by_name("Compute").unwrap();
        assert!(ws.references.is_referenced(&compute.qualified_id()));
    }

    #[test]
    fn resolves_call_used_only_in_a_return_expression() {
        let mut ws = workspace_with(&[(
            "example.com/app",
            "main.go",
            "package app\n\nfunc Inner() int {\n\treturn 1\n}\n\nfunc Outer() int {\n\treturn Inner()\n}\n",
        )]);
        let resolver = Resolver::new();
        resolver.ensure_fresh(&mut ws);
        let pkg = ws.package("example.com/app").unwrap();
        let inner = pkg.symbols.by_name("Inner").unwrap();
        assert!(ws.references.is_referenced(&inner.qualified_id()));
    }

    #[test]
    fn resolves_cross_package_selector_via_import() {
        let mut ws = workspace_with(&[
            (
                "example.com/app/lib",
                "lib.go",
                "package lib\n\nfunc Helper() int {\n\treturn 1\n}\n",
            ),
            (
                "example.com/app",
                "main.go",
                "package app\n\nimport (\n\t\"example.com/app/lib\"\n)\n\nfunc main() {\n\tlib.Helper()\n}\n",
            ),
        ]);
        let resolver = Resolver::new();
        resolver.ensure_fresh(&mut ws);
        let lib_pkg = ws.package("example.com/app/lib").unwrap();
        let helper = lib_pkg.symbols.by_name("Helper").unwrap();
        assert!(ws.references.is_referenced(&helper.qualified_id()));
        assert!(ws.import_graph.find("example.com/app").is_some());
    }
}
