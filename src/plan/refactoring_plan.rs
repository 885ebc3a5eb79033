//! The operation-agnostic plan and impact-analysis types every `ops::*`
//! builder returns.

use std::path::PathBuf;

use super::change::Change;
use super::issue::Issue;

/// Which top-level operation produced a plan, kept for display and for
/// [`super::PlanFile`] persistence (§6's plan schema records the operation
/// name per step).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    RenameSymbol,
    RenameMethod,
    RenamePackage,
    MoveSymbol,
    MovePackage,
    MoveDir,
    ExtractFunction,
    ExtractMethod,
    ExtractInterface,
    ExtractVariable,
    ExtractConstant,
    InlineVariable,
    InlineFunction,
    InlineMethod,
    ChangeSignature,
    SafeDelete,
    FixCycles,
    OrganizeByLayers,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::RenameSymbol => "rename_symbol",
            OperationKind::RenameMethod => "rename_method",
            OperationKind::RenamePackage => "rename_package",
            OperationKind::MoveSymbol => "move_symbol",
            OperationKind::MovePackage => "move_package",
            OperationKind::MoveDir => "move_dir",
            OperationKind::ExtractFunction => "extract_function",
            OperationKind::ExtractMethod => "extract_method",
            OperationKind::ExtractInterface => "extract_interface",
            OperationKind::ExtractVariable => "extract_variable",
            OperationKind::ExtractConstant => "extract_constant",
            OperationKind::InlineVariable => "inline_variable",
            OperationKind::InlineFunction => "inline_function",
            OperationKind::InlineMethod => "inline_method",
            OperationKind::ChangeSignature => "change_signature",
            OperationKind::SafeDelete => "safe_delete",
            OperationKind::FixCycles => "fix_cycles",
            OperationKind::OrganizeByLayers => "organize_by_layers",
        }
    }

    /// Inverse of [`Self::name`], for reconstructing an `OperationKind`
    /// from a persisted [`crate::plan::PlanStep::operation`] string.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "rename_symbol" => OperationKind::RenameSymbol,
            "rename_method" => OperationKind::RenameMethod,
            "rename_package" => OperationKind::RenamePackage,
            "move_symbol" => OperationKind::MoveSymbol,
            "move_package" => OperationKind::MovePackage,
            "move_dir" => OperationKind::MoveDir,
            "extract_function" => OperationKind::ExtractFunction,
            "extract_method" => OperationKind::ExtractMethod,
            "extract_interface" => OperationKind::ExtractInterface,
            "extract_variable" => OperationKind::ExtractVariable,
            "extract_constant" => OperationKind::ExtractConstant,
            "inline_variable" => OperationKind::InlineVariable,
            "inline_function" => OperationKind::InlineFunction,
            "inline_method" => OperationKind::InlineMethod,
            "change_signature" => OperationKind::ChangeSignature,
            "safe_delete" => OperationKind::SafeDelete,
            "fix_cycles" => OperationKind::FixCycles,
            "organize_by_layers" => OperationKind::OrganizeByLayers,
            _ => return None,
        })
    }
}

/// Summary of what a plan touches, computed once up front so a caller can
/// decide whether to preview or execute without re-walking every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImpactAnalysis {
    pub affected_files: Vec<PathBuf>,
    pub affected_packages: Vec<String>,
    pub change_count: usize,
    pub issues: Vec<Issue>,
}

impl ImpactAnalysis {
    pub fn has_blocking_issues(&self) -> bool {
        self.issues.iter().any(Issue::is_blocking)
    }
}

/// A fully-built, not-yet-executed refactoring. Operations only ever
/// *produce* plans (pure `(Workspace, Request) -> Result<Plan>` functions,
/// per the module contract); committing one to disk is the executor's job.
#[derive(Debug, Clone)]
pub struct RefactoringPlan {
    pub operation: OperationKind,
    pub description: String,
    pub changes: Vec<Change>,
    pub impact: ImpactAnalysis,
    /// Whether an inverse plan can be mechanically derived (true for pure
    /// renames/moves; false once a plan has dropped information, e.g.
    /// safe-delete or an inline that removes a now-dead declaration).
    pub reversible: bool,
}

impl RefactoringPlan {
    pub fn new(operation: OperationKind, description: impl Into<String>) -> Self {
        Self {
            operation,
            description: description.into(),
            changes: Vec::new(),
            impact: ImpactAnalysis::default(),
            reversible: true,
        }
    }

    pub fn with_changes(mut self, changes: Vec<Change>) -> Self {
        self.impact.change_count = changes.len();
        let mut files: Vec<PathBuf> = changes.iter().map(|c| c.file.clone()).collect();
        files.sort();
        files.dedup();
        self.impact.affected_files = files;
        self.changes = changes;
        self
    }

    pub fn with_issues(mut self, issues: Vec<Issue>) -> Self {
        self.impact.issues = issues;
        self
    }

    pub fn irreversible(mut self) -> Self {
        self.reversible = false;
        self
    }

    /// Validates the flat change list has no two changes overlapping in
    /// the same file, per §4.4's non-overlap precondition. Called by the
    /// executor before any write, and by operation builders that want to
    /// fail fast instead of waiting for execution.
    pub fn validate_non_overlapping(&self) -> Result<(), crate::error::GorefactorError> {
        let mut by_file: std::collections::HashMap<&PathBuf, Vec<&Change>> =
            std::collections::HashMap::new();
        for change in &self.changes {
            by_file.entry(&change.file).or_default().push(change);
        }
        for (file, mut changes) in by_file {
            changes.sort_by_key(|c| c.range.start());
            for pair in changes.windows(2) {
                if pair[0].overlaps(pair[1]) {
                    return Err(crate::error::GorefactorError::invalid(format!(
                        "overlapping changes in {}: {:?} and {:?}",
                        file.display(),
                        pair[0].range,
                        pair[1].range
                    )));
                }
            }
        }
        Ok(())
    }
}
