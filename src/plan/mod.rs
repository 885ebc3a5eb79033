//! The plan data model: a flat list of file edits plus the metadata needed
//! to preview, persist, and execute them.

mod change;
mod issue;
mod plan_file;
mod refactoring_plan;

pub use change::Change;
pub use issue::{Issue, IssueKind, Severity};
pub use plan_file::{ChangeRecord, PlanFile, PlanStep};
pub use refactoring_plan::{ImpactAnalysis, OperationKind, RefactoringPlan};
