//! # gorefactor
//!
//! Workspace-level refactoring engine for a statically-typed,
//! package-oriented source tree: rename, move, extract, inline,
//! change-signature, and safe-delete, with reference tracking and
//! import-cycle analysis across the whole module.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! engine    → Engine façade: RwLock<Workspace> + Resolver, one method per operation
//!   ↓
//! ops       → One pure (Workspace, Request) -> Result<RefactoringPlan> module per operation
//!   ↓
//! executor  → Commits a RefactoringPlan to disk; backup + atomic write + reload
//! watcher   → Debounced filesystem events feeding Engine::handle_batch
//!   ↓
//! resolver  → Symbol tables, import graph, reference index
//! loader    → Walks a module root into a Workspace
//!   ↓
//! plan      → Change / Issue / RefactoringPlan / PlanFile data model
//! graph     → Package-import dependency graph (cycle detection, layering)
//! model     → Workspace / Package / File / Symbol / ReferenceIndex
//!   ↓
//! parser    → rowan lossless CST, logos lexer, typed AST wrappers
//! config    → WorkspaceConfig defaults and .gorefactor.toml overrides
//! base      → Position/Span, identifier rules, text-size re-exports
//! ```

/// Foundation types: Position/Span, identifier rules, text-size re-exports.
pub mod base;

/// Parser: rowan lossless CST, logos lexer, typed AST wrappers.
pub mod parser;

/// Workspace configuration: built-in defaults plus `.gorefactor.toml`.
pub mod config;

/// The in-memory workspace model: packages, files, symbols, references.
pub mod model;

/// Package-import dependency graph: cycle detection, topological order, layering.
pub mod graph;

/// Builds and invalidates the workspace's symbol tables, import graph, and reference index.
pub mod resolver;

/// Walks a module root into a `Workspace`.
pub mod loader;

/// The plan data model: Change, Issue, RefactoringPlan, and its on-disk PlanFile form.
pub mod plan;

/// Commits a RefactoringPlan to disk: backup, splice, write, reload.
pub mod executor;

/// Filesystem watching: debounced notify events for the engine to act on.
pub mod watcher;

/// One pure `(Workspace, Request) -> Result<RefactoringPlan>` module per operation.
pub mod ops;

/// The `Engine` façade tying everything above together.
pub mod engine;

/// Error and Result types shared by every module.
pub mod error;

pub use base::{is_exported, is_valid_identifier, LineCol, LineIndex, Position, Span, TextRange, TextSize};
pub use engine::Engine;
pub use error::{GorefactorError, Result};
pub use model::Workspace;
pub use plan::{Change, Issue, OperationKind, PlanFile, RefactoringPlan};
