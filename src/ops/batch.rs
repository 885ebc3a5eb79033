//! Batch / Rollback (§6): thin orchestration over the other operations and
//! over [`crate::executor`] — no new data model, per SPEC_FULL.md §B.2.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::WorkspaceConfig;
use crate::error::{GorefactorError, Result};
use crate::model::Workspace;
use crate::plan::RefactoringPlan;

/// One step of a batch: a closure over an already-built request, since
/// every `ops::*` function takes its own request type and there's no
/// common trait object for "an operation plus its arguments" worth adding
/// just for this.
pub type BatchStep<'a> = Box<dyn Fn(&Workspace) -> Result<RefactoringPlan> + 'a>;

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchRequest {
    pub rollback_on_failure: bool,
}

/// Runs every step against the same `workspace` snapshot, collecting a
/// plan per step. With `rollback_on_failure`, the first step returning
/// `Err` discards every plan accumulated so far and propagates that error.
/// Without it, a failing step is skipped and the batch continues with the
/// remaining steps, returning whatever plans did succeed.
pub fn run_batch(workspace: &Workspace, steps: &[BatchStep<'_>], request: &BatchRequest) -> Result<Vec<RefactoringPlan>> {
    let mut plans = Vec::with_capacity(steps.len());
    for step in steps {
        match step(workspace) {
            Ok(plan) => plans.push(plan),
            Err(err) if request.rollback_on_failure => return Err(err),
            Err(_) => continue,
        }
    }
    Ok(plans)
}

#[derive(Debug, Clone)]
pub struct RollbackRequest {
    /// 0 restores the most recent backup, 1 the one before it, and so on.
    pub generations_back: usize,
}

/// Restores every file found in the chosen `.gorefactor-backup/<timestamp>`
/// directory verbatim, overwriting the workspace's current copy. The
/// backup directories are named by RFC 3339 timestamp (see
/// [`crate::executor::execute`]'s `make_backup`), so the most recent one
/// sorts last lexicographically.
pub fn rollback(workspace_root: &Path, config: &WorkspaceConfig, request: &RollbackRequest) -> Result<PathBuf> {
    let backup_root = config.backup_root(workspace_root);

    let mut generations: Vec<PathBuf> = fs::read_dir(&backup_root)
        .map_err(|e| GorefactorError::FileSystemError { path: backup_root.clone(), source: e })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_dir())
        .collect();
    generations.sort();
    generations.reverse();

    let chosen = generations
        .get(request.generations_back)
        .ok_or_else(|| GorefactorError::invalid(format!("no backup {} generations back", request.generations_back)))?;

    for entry in walkdir::WalkDir::new(chosen).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let rel = entry.path().strip_prefix(chosen).expect("walkdir yields paths under its own root");
        let dest = workspace_root.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| GorefactorError::FileSystemError { path: parent.to_path_buf(), source: e })?;
        }
        fs::copy(entry.path(), &dest).map_err(|e| GorefactorError::FileSystemError { path: dest.clone(), source: e })?;
    }

    Ok(chosen.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{File, Package};
    use smol_str::SmolStr;

    fn workspace_with(source: &str) -> Workspace {
        let mut ws = Workspace::new(PathBuf::from("/ws"), "example.com/app".to_string());
        let mut package = Package::new("example.com/app".to_string(), SmolStr::new("app"), PathBuf::from("/ws"));
        let path = PathBuf::from("/ws/main.go");
        package.files.insert(path.clone(), File::load(path, source.to_string()));
        ws.packages.insert("example.com/app".to_string(), package);
        ws
    }

    #[test]
    fn runs_every_step_and_collects_plans() {
        let ws = workspace_with("package app\n\nfunc Run() {}\n");
        let steps: Vec<BatchStep> = vec![
            Box::new(|ws: &Workspace| {
                crate::ops::safe_delete::safe_delete(
                    ws,
                    &crate::ops::safe_delete::SafeDeleteRequest { name: "Run".to_string(), package: "example.com/app".to_string(), force: false },
                )
            }),
        ];
        let plans = run_batch(&ws, &steps, &BatchRequest { rollback_on_failure: true }).unwrap();
        assert_eq!(plans.len(), 1);
    }

    #[test]
    fn stops_on_first_failing_step() {
        let ws = workspace_with("package app\n\nfunc Run() {}\n");
        let steps: Vec<BatchStep> = vec![
            Box::new(|ws: &Workspace| {
                crate::ops::safe_delete::safe_delete(
                    ws,
                    &crate::ops::safe_delete::SafeDeleteRequest { name: "Missing".to_string(), package: "example.com/app".to_string(), force: false },
                )
            }),
        ];
        assert!(run_batch(&ws, &steps, &BatchRequest { rollback_on_failure: true }).is_err());
    }

    #[test]
    fn rolls_back_to_the_most_recent_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let config = WorkspaceConfig::default();
        let backup_dir = config.backup_dir(tmp.path(), "2024-01-01T00-00-00Z");
        fs::create_dir_all(&backup_dir).unwrap();
        fs::write(backup_dir.join("main.go"), "package app\n").unwrap();
        fs::write(tmp.path().join("main.go"), "package app\n\nfunc Broken() {\n").unwrap();

        let restored = rollback(tmp.path(), &config, &RollbackRequest { generations_back: 0 }).unwrap();
        assert_eq!(restored, backup_dir);
        let contents = fs::read_to_string(tmp.path().join("main.go")).unwrap();
        assert_eq!(contents, "package app\n");
    }
}
