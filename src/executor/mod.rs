//! Commits a [`RefactoringPlan`] to disk.
//!
//! Applying a plan is the one place the engine actually touches the
//! filesystem outside of the initial load. The sequence is: validate, back
//! up, splice, write, reload — and if any step after the first write fails,
//! restore every file touched so far from its backup rather than leave a
//! half-applied plan on disk (§4.4, §4.6).

use std::path::{Path, PathBuf};

#[cfg(test)]
use text_size::TextRange;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::WorkspaceConfig;
use crate::error::{GorefactorError, Result};
use crate::model::Workspace;
use crate::plan::{Change, RefactoringPlan};

/// What executing a plan actually did, for callers that want to report or
/// log it (a CLI's `--dry-run` summary, an RPC response).
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub files_written: Vec<PathBuf>,
    pub backup_dir: Option<PathBuf>,
}

/// Applies `plan` against `workspace`, writing to disk and reloading every
/// touched [`crate::model::File`] in place so the workspace stays
/// consistent with what's now on disk. Does not invalidate the resolver's
/// derived data (symbol tables, import graph, reference index) — that is
/// the caller's job, since the resolver lives above the executor in the
/// engine's layering.
pub fn execute(
    plan: &RefactoringPlan,
    workspace: &mut Workspace,
    config: &WorkspaceConfig,
) -> Result<ExecutionReport> {
    plan.validate_non_overlapping()?;
    if plan.impact.has_blocking_issues() {
        return Err(GorefactorError::ValidationError {
            issues: plan.impact.issues.clone(),
        });
    }

    let mut by_file: std::collections::BTreeMap<&Path, Vec<&Change>> = std::collections::BTreeMap::new();
    for change in &plan.changes {
        by_file.entry(change.file.as_path()).or_default().push(change);
    }

    let mut new_contents: Vec<(PathBuf, String)> = Vec::with_capacity(by_file.len());
    for (path, mut changes) in by_file {
        let current = current_text(workspace, path)?;
        changes.sort_by_key(|c| c.range.start());
        verify_old_text(path, &current, &changes)?;
        new_contents.push((path.to_path_buf(), splice_descending(&current, &changes)));
    }

    let backup_dir = if config.backup_before_write && !new_contents.is_empty() {
        Some(make_backup(workspace, config, &new_contents)?)
    } else {
        None
    };

    let mut written = Vec::with_capacity(new_contents.len());
    for (path, new_text) in &new_contents {
        if let Err(err) = write_atomic(path, new_text) {
            roll_back(&workspace.root, &written, backup_dir.as_deref());
            return Err(err);
        }
        written.push(path.clone());
    }

    for (path, new_text) in new_contents {
        if let Some(package) = workspace.packages.values_mut().find(|p| p.files.contains_key(&path)) {
            if let Some(file) = package.file_mut(&path) {
                file.reload(new_text);
            }
        }
    }

    Ok(ExecutionReport {
        files_written: written,
        backup_dir,
    })
}

fn current_text(workspace: &Workspace, path: &Path) -> Result<String> {
    for package in workspace.packages.values() {
        if let Some(file) = package.file(path) {
            return Ok(file.text.clone());
        }
    }
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        // A plan step targeting a file that exists on neither side is a
        // file-creation step (e.g. Move Symbol's target stub file); treat
        // it as empty so the change's insertion becomes the whole file.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(GorefactorError::FileSystemError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Confirms every change's recorded `old_text` still matches the live
/// content before any byte is written — the same staleness check
/// `PlanFile::revalidate` performs for a plan loaded back from disk.
fn verify_old_text(path: &Path, text: &str, changes: &[&Change]) -> Result<()> {
    for change in changes {
        let start: usize = change.range.start().into();
        let end: usize = change.range.end().into();
        let slice = text.get(start..end).ok_or_else(|| {
            GorefactorError::invalid(format!(
                "plan is stale: {} is shorter than recorded range",
                path.display()
            ))
        })?;
        if slice != change.old_text {
            return Err(GorefactorError::invalid(format!(
                "plan is stale: {} changed since the plan was created",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Applies every change to `text` by descending start offset, so an
/// earlier change's byte range is never invalidated by a later one's
/// length change (§4.4).
fn splice_descending(text: &str, changes: &[&Change]) -> String {
    let mut result = text.to_string();
    for change in changes.iter().rev() {
        let start: usize = change.range.start().into();
        let end: usize = change.range.end().into();
        result.replace_range(start..end, &change.new_text);
    }
    result
}

fn make_backup(
    workspace: &Workspace,
    config: &WorkspaceConfig,
    new_contents: &[(PathBuf, String)],
) -> Result<PathBuf> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| GorefactorError::invalid(format!("failed to stamp backup time: {e}")))?
        .replace(':', "-");
    let backup_dir = config.backup_dir(&workspace.root, &timestamp);

    for (path, _) in new_contents {
        let original = current_text(workspace, path)?;
        let rel = path.strip_prefix(&workspace.root).unwrap_or(path);
        let dest = backup_dir.join(rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|source| GorefactorError::FileSystemError {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&dest, original).map_err(|source| GorefactorError::FileSystemError {
            path: dest.clone(),
            source,
        })?;
    }
    Ok(backup_dir)
}

/// Writes `text` to `path` via a sibling temp file plus rename, so a crash
/// mid-write never leaves a truncated file in place.
fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|source| GorefactorError::FileSystemError {
        path: dir.to_path_buf(),
        source,
    })?;
    let tmp = dir.join(format!(
        ".{}.gorefactor-tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("out")
    ));
    std::fs::write(&tmp, text).map_err(|source| GorefactorError::FileSystemError {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| GorefactorError::FileSystemError {
        path: path.to_path_buf(),
        source,
    })
}

/// Restores every file already written from its backup. Best-effort: a
/// restore failure is logged, not propagated, since the caller is already
/// unwinding from the write failure that triggered the rollback.
fn roll_back(workspace_root: &Path, written: &[PathBuf], backup_dir: Option<&Path>) {
    let Some(backup_dir) = backup_dir else {
        tracing::error!("plan execution failed with no backup available; workspace may be partially edited");
        return;
    };
    for path in written {
        let rel = path.strip_prefix(workspace_root).unwrap_or(path);
        let backed_up = backup_dir.join(rel);
        match std::fs::read_to_string(&backed_up) {
            Ok(original) => {
                if let Err(e) = std::fs::write(path, original) {
                    tracing::error!(file = %path.display(), error = %e, "failed to roll back after partial plan execution");
                }
            }
            Err(e) => {
                tracing::error!(file = %path.display(), error = %e, "no backup found while rolling back");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{File, Package, Workspace};
    use crate::plan::{Change, OperationKind, RefactoringPlan};
    use smol_str::SmolStr;

    fn workspace_with_file(path: &Path, text: &str) -> Workspace {
        let dir = path.parent().unwrap().to_path_buf();
        let mut ws = Workspace::new(dir.clone(), "example.com/app".to_string());
        let mut package = Package::new("example.com/app".to_string(), SmolStr::new("app"), dir);
        package.files.insert(path.to_path_buf(), File::load(path.to_path_buf(), text.to_string()));
        ws.packages.insert("example.com/app".to_string(), package);
        ws
    }

    #[test]
    fn applies_a_single_change_and_reloads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        std::fs::write(&path, "package app\n\nfunc Foo() {}\n").unwrap();
        let mut ws = workspace_with_file(&path, "package app\n\nfunc Foo() {}\n");

        let change = Change::new(
            path.clone(),
            TextRange::new(19.into(), 22.into()),
            "Foo",
            "Bar",
            "rename Foo to Bar",
        );
        let plan = RefactoringPlan::new(OperationKind::RenameSymbol, "rename Foo to Bar").with_changes(vec![change]);

        let config = WorkspaceConfig {
            backup_before_write: false,
            ..WorkspaceConfig::default()
        };
        let report = execute(&plan, &mut ws, &config).unwrap();
        assert_eq!(report.files_written, vec![path.clone()]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "package app\n\nfunc Bar() {}\n");
        assert_eq!(ws.package("example.com/app").unwrap().file(&path).unwrap().text, "package app\n\nfunc Bar() {}\n");
    }

    #[test]
    fn rejects_a_stale_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        let mut ws = workspace_with_file(&path, "package app\n\nfunc Foo() {}\n");

        let change = Change::new(path.clone(), TextRange::new(19.into(), 22.into()), "Qux", "Bar", "stale rename");
        let plan = RefactoringPlan::new(OperationKind::RenameSymbol, "stale rename").with_changes(vec![change]);

        let config = WorkspaceConfig::default();
        assert!(execute(&plan, &mut ws, &config).is_err());
    }

    #[test]
    fn backs_up_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        std::fs::write(&path, "package app\n\nfunc Foo() {}\n").unwrap();
        let mut ws = workspace_with_file(&path, "package app\n\nfunc Foo() {}\n");

        let change = Change::new(path.clone(), TextRange::new(19.into(), 22.into()), "Foo", "Bar", "rename");
        let plan = RefactoringPlan::new(OperationKind::RenameSymbol, "rename").with_changes(vec![change]);
        let config = WorkspaceConfig::default();

        let report = execute(&plan, &mut ws, &config).unwrap();
        let backup_dir = report.backup_dir.unwrap();
        let backed_up = backup_dir.join("main.go");
        assert_eq!(std::fs::read_to_string(backed_up).unwrap(), "package app\n\nfunc Foo() {}\n");
    }
}
