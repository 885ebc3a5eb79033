//! Walks a directory tree and builds a [`Workspace`] from it.

use std::path::{Path, PathBuf};

use smol_str::SmolStr;
use walkdir::WalkDir;

use crate::config::WorkspaceConfig;
use crate::error::{GorefactorError, Result};
use crate::model::{File, Package, Workspace};

/// Reads the module descriptor file (`go.mod` by default) at `root` and
/// returns its declared module path. The descriptor format this engine
/// cares about is a single line `module <path>`; everything else in the
/// file (requires, replace directives, go version) is opaque to the
/// refactoring engine and left untouched.
pub fn read_module_path(root: &Path, config: &WorkspaceConfig) -> Result<String> {
    let descriptor = root.join(&config.module_descriptor_file);
    let text = std::fs::read_to_string(&descriptor).map_err(|source| GorefactorError::FileSystemError {
        path: descriptor.clone(),
        source,
    })?;
    text.lines()
        .find_map(|line| line.trim().strip_prefix("module ").map(str::trim))
        .map(str::to_string)
        .ok_or_else(|| GorefactorError::invalid(format!("{} has no module directive", descriptor.display())))
}

/// Loads every package under `root` into a fresh [`Workspace`]. Packages
/// are grouped by directory: every source file in a directory belongs to
/// one package, named after the first successfully-parsed file's package
/// clause. The vendored-dependencies directory is skipped entirely (its
/// contents are neither editable nor part of the module's own import
/// graph).
pub fn load_workspace(root: &Path, config: &WorkspaceConfig) -> Result<Workspace> {
    let module_path = read_module_path(root, config)?;
    let mut workspace = Workspace::new(root.to_path_buf(), module_path);

    let vendor_dir = root.join(&config.vendored_deps_dir);
    let mut files_by_dir: std::collections::BTreeMap<PathBuf, Vec<PathBuf>> = std::collections::BTreeMap::new();

    for entry in WalkDir::new(root).into_iter().filter_entry(|e| {
        let path = e.path();
        if path == vendor_dir {
            return false;
        }
        !path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'))
    }) {
        let entry = entry.map_err(|e| {
            GorefactorError::FileSystemError {
                path: e.path().unwrap_or(root).to_path_buf(),
                source: std::io::Error::other(e),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !config.is_source_file(entry.path()) {
            continue;
        }
        let dir = entry.path().parent().unwrap_or(root).to_path_buf();
        files_by_dir.entry(dir).or_default().push(entry.path().to_path_buf());
    }

    for (dir, paths) in files_by_dir {
        let Some(import_path) = workspace.import_path_for_dir(&dir) else {
            continue;
        };
        let mut package_name = None;
        let mut loaded_files = Vec::new();
        let mut any_test_file = false;
        let mut any_non_test_file = false;

        for path in paths {
            let text = std::fs::read_to_string(&path).map_err(|source| GorefactorError::FileSystemError {
                path: path.clone(),
                source,
            })?;
            let file = File::load(path.clone(), text);
            if package_name.is_none() {
                if let Some(source_file) = file.source_file() {
                    if let Some(clause) = source_file.package_clause() {
                        if let Some(name) = clause.name() {
                            package_name = Some(SmolStr::new(name.text()));
                        }
                    }
                }
            }
            if config.is_test_file(&path) {
                any_test_file = true;
            } else {
                any_non_test_file = true;
            }
            loaded_files.push((path, file));
        }

        let name = package_name.unwrap_or_else(|| {
            SmolStr::new(dir.file_name().and_then(|n| n.to_str()).unwrap_or("main"))
        });
        let mut package = Package::new(import_path.clone(), name, dir);
        package.is_test_package = any_test_file && !any_non_test_file;
        for (path, file) in loaded_files {
            package.files.insert(path, file);
        }
        package.recompute_imports();
        workspace.packages.insert(import_path, package);
    }

    Ok(workspace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_simple_two_package_module() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module example.com/app\n\ngo 1.22\n").unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::write(
            dir.path().join("main.go"),
            "package main\n\nfunc main() {}\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("lib").join("lib.go"),
            "package lib\n\nfunc Helper() {}\n",
        )
        .unwrap();

        let config = WorkspaceConfig::default();
        let workspace = load_workspace(dir.path(), &config).unwrap();
        assert_eq!(workspace.module_path, "example.com/app");
        assert!(workspace.package("example.com/app").is_some());
        assert!(workspace.package("example.com/app/lib").is_some());
    }

    #[test]
    fn skips_vendor_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module example.com/app\n").unwrap();
        std::fs::create_dir_all(dir.path().join("vendor/other.com/dep")).unwrap();
        std::fs::write(
            dir.path().join("vendor/other.com/dep/dep.go"),
            "package dep\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("main.go"), "package main\n").unwrap();

        let config = WorkspaceConfig::default();
        let workspace = load_workspace(dir.path(), &config).unwrap();
        assert_eq!(workspace.package_count(), 1);
    }
}
