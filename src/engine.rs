//! The `Engine` façade: one `RwLock<Workspace>` plus a `Resolver`, with one
//! method per §6 operation. Every `*_plan` method takes a `&self` read
//! guard, builds a plan via the matching pure `ops::*` function, and
//! returns it for the caller to inspect, persist, or hand to
//! [`Self::execute`] — plan construction and execution stay separate calls
//! so a caller can preview before committing (§4.4, §9).

use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::config::WorkspaceConfig;
use crate::error::Result;
use crate::executor::{self, ExecutionReport};
use crate::model::Workspace;
use crate::ops::analyze::{self, FixCyclesRequest, OrganizeByLayersRequest};
use crate::ops::batch::{self, BatchRequest, BatchStep, RollbackRequest};
use crate::ops::change_signature::{self, ChangeSignatureRequest};
use crate::ops::extract_function::{self, ExtractFunctionRequest};
use crate::ops::extract_interface::{self, ExtractInterfaceRequest};
use crate::ops::extract_variable::{self, ExtractVariableRequest};
use crate::ops::inline::{self, InlineFunctionRequest, InlineVariableRequest};
use crate::ops::move_package::{self, MoveDirRequest, MovePackageRequest, MovePackagesRequest, RenamePackageRequest};
use crate::ops::move_symbol::{self, MoveSymbolRequest};
use crate::ops::rename::{self, RenameMethodRequest, RenameSymbolRequest};
use crate::ops::safe_delete::{self, SafeDeleteRequest};
use crate::plan::{PlanFile, RefactoringPlan};
use crate::resolver::Resolver;
use crate::watcher::{ChangeKind, EventBatch, WorkspaceWatcher};

/// Owns the workspace lock the way §5 specifies: a single `RwLock`, many
/// concurrent readers building plans, one writer at a time executing or
/// reloading. Every operation method here takes a read lock; only
/// [`Self::execute`] and [`Self::reload`] take the write lock.
pub struct Engine {
    workspace: RwLock<Workspace>,
    resolver: Resolver,
    config: WorkspaceConfig,
}

impl Engine {
    /// Walks `root`, parses every package, and builds the initial symbol
    /// tables, import graph, and reference index before returning.
    pub fn load_workspace(root: &Path, config: WorkspaceConfig) -> Result<Self> {
        let mut workspace = crate::loader::load_workspace(root, &config)?;
        let resolver = Resolver::new();
        resolver.ensure_fresh(&mut workspace);
        Ok(Self {
            workspace: RwLock::new(workspace),
            resolver,
            config,
        })
    }

    fn with_fresh_workspace<T>(&self, f: impl FnOnce(&Workspace) -> T) -> T {
        {
            let mut workspace = self.workspace.write();
            self.resolver.ensure_fresh(&mut workspace);
        }
        let workspace = self.workspace.read();
        f(&workspace)
    }

    pub fn rename_symbol(&self, request: &RenameSymbolRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| rename::rename_symbol(ws, request))
    }

    pub fn rename_method(&self, request: &RenameMethodRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| rename::rename_method(ws, request))
    }

    pub fn rename_package(&self, request: &RenamePackageRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| move_package::rename_package(ws, request))
    }

    pub fn move_symbol(&self, request: &MoveSymbolRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| move_symbol::move_symbol(ws, request))
    }

    pub fn move_package(&self, request: &MovePackageRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| move_package::move_package(ws, request))
    }

    pub fn move_dir(&self, request: &MoveDirRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| move_package::move_dir(ws, request))
    }

    pub fn move_packages(&self, request: &MovePackagesRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| move_package::move_packages(ws, request))
    }

    pub fn extract_function(&self, request: &ExtractFunctionRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| extract_function::extract_function(ws, request))
    }

    pub fn extract_interface(&self, request: &ExtractInterfaceRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| extract_interface::extract_interface(ws, request))
    }

    pub fn extract_variable(&self, request: &ExtractVariableRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| extract_variable::extract_variable(ws, request))
    }

    pub fn inline_variable(&self, request: &InlineVariableRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| inline::inline_variable(ws, request))
    }

    pub fn inline_function(&self, request: &InlineFunctionRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| inline::inline_function(ws, request))
    }

    pub fn change_signature(&self, request: &ChangeSignatureRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| change_signature::change_signature(ws, request))
    }

    pub fn safe_delete(&self, request: &SafeDeleteRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| safe_delete::safe_delete(ws, request))
    }

    pub fn analyze_dependencies(&self) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(analyze::analyze_dependencies)
    }

    pub fn fix_cycles(&self, request: &FixCyclesRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| analyze::fix_cycles(ws, request))
    }

    pub fn organize_by_layers(&self, request: &OrganizeByLayersRequest) -> Result<RefactoringPlan> {
        self.with_fresh_workspace(|ws| analyze::organize_by_layers(ws, request))
    }

    /// Runs every step in `steps` against one fresh, consistent snapshot —
    /// the only `ensure_fresh` call for the whole batch, so later steps see
    /// the same workspace the first step did rather than one partially
    /// re-resolved mid-batch.
    pub fn batch(&self, steps: &[BatchStep<'_>], request: &BatchRequest) -> Result<Vec<RefactoringPlan>> {
        self.with_fresh_workspace(|ws| batch::run_batch(ws, steps, request))
    }

    pub fn rollback(&self, request: &RollbackRequest) -> Result<PathBuf> {
        let root = self.workspace.read().root.clone();
        batch::rollback(&root, &self.config, request)
    }

    /// Writes `plan` to disk as a [`PlanFile`] without executing it.
    pub fn save_plan(&self, plan: &RefactoringPlan, path: &Path) -> Result<()> {
        let root = self.workspace.read().root.clone();
        PlanFile::from_plan(plan, root)?.save(path)
    }

    /// Loads a persisted plan, revalidates it against the current contents
    /// of every file it touches, and executes it if the check passes.
    pub fn execute_plan_file(&self, path: &Path) -> Result<Vec<ExecutionReport>> {
        let plan_file = PlanFile::load(path)?;
        plan_file.revalidate(|p: &Path| std::fs::read_to_string(p))?;
        plan_file
            .steps
            .iter()
            .map(|step| {
                let operation = crate::plan::OperationKind::from_name(&step.operation)
                    .ok_or_else(|| crate::error::GorefactorError::invalid(format!("unknown operation '{}' in plan file", step.operation)))?;
                let plan = RefactoringPlan::new(operation, step.description.clone())
                    .with_changes(step.changes.iter().map(|c| c.to_change()).collect());
                self.execute(&plan)
            })
            .collect()
    }

    /// Applies `plan` to disk and reloads the touched files, then marks the
    /// resolver's derived data dirty so the next plan-building call
    /// recomputes symbol tables, the import graph, and the reference index
    /// against the new contents.
    pub fn execute(&self, plan: &RefactoringPlan) -> Result<ExecutionReport> {
        let mut workspace = self.workspace.write();
        let report = executor::execute(plan, &mut workspace, &self.config)?;
        self.resolver.invalidate();
        Ok(report)
    }

    /// Reloads a single file from disk (driven by [`WorkspaceWatcher`]
    /// events) and marks the resolver dirty.
    pub fn reload_file(&self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path).map_err(|source| crate::error::GorefactorError::FileSystemError {
            path: path.to_path_buf(),
            source,
        })?;
        let mut workspace = self.workspace.write();
        if let Some(package) = workspace.packages.values_mut().find(|p| p.files.contains_key(path)) {
            if let Some(file) = package.file_mut(path) {
                file.reload(text);
            }
        }
        drop(workspace);
        self.resolver.invalidate();
        Ok(())
    }

    /// Starts a background watcher on the workspace root, reloading
    /// touched files and invalidating the resolver as debounced events
    /// arrive. The caller drives the returned watcher's `recv`/`try_recv`
    /// loop and feeds each batch to [`Self::handle_batch`].
    pub fn watch(&self) -> Result<WorkspaceWatcher> {
        let root = self.workspace.read().root.clone();
        let config = self.config.clone();
        WorkspaceWatcher::spawn(&root, config.watcher_debounce, move |path| config.is_source_file(path))
    }

    /// Applies one debounced batch of watcher events, for callers driving
    /// [`Self::watch`]'s receiver loop themselves.
    pub fn handle_batch(&self, batch: &EventBatch) -> Result<()> {
        for events in batch.by_dir.values() {
            for event in events {
                match event.kind {
                    ChangeKind::Created | ChangeKind::Modified => self.reload_file(&event.path)?,
                    ChangeKind::Removed => {
                        let mut workspace = self.workspace.write();
                        if let Some(package) = workspace.packages.values_mut().find(|p| p.files.contains_key(&event.path)) {
                            package.files.shift_remove(&event.path);
                        }
                        drop(workspace);
                        self.resolver.invalidate();
                    }
                }
            }
        }
        Ok(())
    }

    pub fn package_count(&self) -> usize {
        self.workspace.read().package_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_module(dir: &std::path::Path) {
        std::fs::write(dir.join("go.mod"), "module example.com/app\n\ngo 1.22\n").unwrap();
        std::fs::write(dir.join("main.go"), "package app\n\nfunc Greet() {\n\tprintMsg()\n}\n\nfunc printMsg() {}\n").unwrap();
    }

    #[test]
    fn loads_a_workspace_and_builds_a_rename_plan() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path());
        let engine = Engine::load_workspace(dir.path(), WorkspaceConfig::default()).unwrap();
        assert_eq!(engine.package_count(), 1);

        let request = RenameSymbolRequest {
            name: "Greet".to_string(),
            package: Some("example.com/app".to_string()),
            new_name: "Hello".to_string(),
            allow_breaking: false,
        };
        let plan = engine.rename_symbol(&request).unwrap();
        assert!(!plan.changes.is_empty());
    }

    #[test]
    fn executing_a_plan_invalidates_the_resolver_so_the_next_plan_sees_it() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path());
        let mut config = WorkspaceConfig::default();
        config.backup_before_write = false;
        let engine = Engine::load_workspace(dir.path(), config).unwrap();

        let plan = engine
            .rename_symbol(&RenameSymbolRequest {
                name: "Greet".to_string(),
                package: Some("example.com/app".to_string()),
                new_name: "Hello".to_string(),
                allow_breaking: false,
            })
            .unwrap();
        engine.execute(&plan).unwrap();

        let after = engine
            .rename_symbol(&RenameSymbolRequest {
                name: "Hello".to_string(),
                package: Some("example.com/app".to_string()),
                new_name: "World".to_string(),
                allow_breaking: false,
            })
            .unwrap();
        assert!(!after.changes.is_empty());
    }
}
