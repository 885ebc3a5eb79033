//! On-disk persistence for a [`RefactoringPlan`], so a plan can be built,
//! inspected, and executed as separate steps (§6).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::{GorefactorError, Result};

use super::change::Change;
use super::refactoring_plan::RefactoringPlan;

const PLAN_FILE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub file: PathBuf,
    pub start: u32,
    pub end: u32,
    pub old_text: String,
    pub new_text: String,
    pub description: String,
}

impl From<&Change> for ChangeRecord {
    fn from(change: &Change) -> Self {
        Self {
            file: change.file.clone(),
            start: u32::from(change.range.start()),
            end: u32::from(change.range.end()),
            old_text: change.old_text.clone(),
            new_text: change.new_text.clone(),
            description: change.description.clone(),
        }
    }
}

impl ChangeRecord {
    pub fn to_change(&self) -> Change {
        Change::new(
            self.file.clone(),
            text_size::TextRange::new(self.start.into(), self.end.into()),
            self.old_text.clone(),
            self.new_text.clone(),
            self.description.clone(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub operation: String,
    pub description: String,
    pub changes: Vec<ChangeRecord>,
}

/// The serialized form of one or more plans, written atomically by
/// `Engine::save_plan` and replayed by `Engine::execute_plan_file`.
/// `created_at` and `workspace_root` let the executor detect a plan that
/// has gone stale (workspace moved, or files touched since the plan was
/// built) before replaying any step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFile {
    pub version: u32,
    pub created_at: String,
    pub workspace_root: PathBuf,
    pub steps: Vec<PlanStep>,
}

impl PlanFile {
    pub fn from_plan(plan: &RefactoringPlan, workspace_root: PathBuf) -> Result<Self> {
        Self::from_plans(std::slice::from_ref(plan), workspace_root)
    }

    pub fn from_plans(plans: &[RefactoringPlan], workspace_root: PathBuf) -> Result<Self> {
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| GorefactorError::invalid(format!("failed to stamp plan time: {e}")))?;
        let steps = plans
            .iter()
            .map(|plan| PlanStep {
                operation: plan.operation.name().to_string(),
                description: plan.description.clone(),
                changes: plan.changes.iter().map(ChangeRecord::from).collect(),
            })
            .collect();
        Ok(Self {
            version: PLAN_FILE_VERSION,
            created_at,
            workspace_root,
            steps,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GorefactorError::invalid(format!("failed to serialize plan: {e}")))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GorefactorError::invalid(format!("failed to parse plan file: {e}")))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| GorefactorError::FileSystemError {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| GorefactorError::FileSystemError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Re-checks every step's recorded `old_text` against the file's
    /// current content, via `read_file`, before the caller applies
    /// anything. A mismatch means the workspace changed since the plan was
    /// built and the plan must be rebuilt rather than blindly replayed.
    pub fn revalidate(&self, mut read_file: impl FnMut(&Path) -> std::io::Result<String>) -> Result<()> {
        if self.version != PLAN_FILE_VERSION {
            return Err(GorefactorError::invalid(format!(
                "unsupported plan file version {}",
                self.version
            )));
        }
        for step in &self.steps {
            for record in &step.changes {
                let text = read_file(&record.file).map_err(|source| GorefactorError::FileSystemError {
                    path: record.file.clone(),
                    source,
                })?;
                let start = record.start as usize;
                let end = record.end as usize;
                let current = text.get(start..end).ok_or_else(|| {
                    GorefactorError::invalid(format!(
                        "plan is stale: {} is shorter than recorded range",
                        record.file.display()
                    ))
                })?;
                if current != record.old_text {
                    return Err(GorefactorError::invalid(format!(
                        "plan is stale: {} changed since the plan was created",
                        record.file.display()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::refactoring_plan::OperationKind;

    #[test]
    fn round_trips_through_json() {
        let mut plan = RefactoringPlan::new(OperationKind::RenameSymbol, "rename Foo to Bar");
        plan = plan.with_changes(vec![Change::new(
            PathBuf::from("a.go"),
            text_size::TextRange::new(0.into(), 3.into()),
            "Foo",
            "Bar",
            "rename declaration",
        )]);
        let file = PlanFile::from_plan(&plan, PathBuf::from("/ws")).unwrap();
        let json = file.to_json().unwrap();
        let parsed = PlanFile::from_json(&json).unwrap();
        assert_eq!(parsed.steps.len(), 1);
        assert_eq!(parsed.steps[0].changes[0].new_text, "Bar");
    }

    #[test]
    fn revalidate_detects_stale_content() {
        let mut plan = RefactoringPlan::new(OperationKind::RenameSymbol, "rename Foo to Bar");
        plan = plan.with_changes(vec![Change::new(
            PathBuf::from("a.go"),
            text_size::TextRange::new(0.into(), 3.into()),
            "Foo",
            "Bar",
            "rename declaration",
        )]);
        let file = PlanFile::from_plan(&plan, PathBuf::from("/ws")).unwrap();
        let result = file.revalidate(|_| Ok("Qux stays the same".to_string()));
        assert!(result.is_err());
    }
}
