//! Error taxonomy for the refactoring engine.
//!
//! Every fallible engine operation returns `Result<T, GorefactorError>`. Each
//! variant carries the optional file/line attribution required by the spec's
//! error-handling design so that a CLI or RPC façade can print a one-line
//! summary plus per-issue detail without re-deriving location information.

use std::path::PathBuf;

use thiserror::Error;

/// Optional source attribution attached to an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribution {
    pub file: Option<PathBuf>,
    pub line: Option<usize>,
}

impl Attribution {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn file(file: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(file.into()),
            line: None,
        }
    }

    pub fn at(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: Some(file.into()),
            line: Some(line),
        }
    }
}

impl std::fmt::Display for Attribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{}", file.display(), line),
            (Some(file), None) => write!(f, "{}", file.display()),
            _ => Ok(()),
        }
    }
}

impl Attribution {
    /// Renders as `" (file:line)"`, or the empty string when there is no file.
    fn suffix(&self) -> String {
        if self.file.is_some() {
            format!(" ({self})")
        } else {
            String::new()
        }
    }
}

/// The error taxonomy from the refactoring engine's error-handling design.
///
/// Operations return a `Plan` or a `GorefactorError`; they never retry and
/// never partially mutate workspace state.
#[derive(Debug, Error)]
pub enum GorefactorError {
    #[error("parse error{}: {message}", at.suffix())]
    ParseError {
        message: String,
        at: Attribution,
    },

    #[error("symbol not found{}: {symbol}", at.suffix())]
    SymbolNotFound { symbol: String, at: Attribution },

    #[error("invalid operation{}: {reason}", at.suffix())]
    InvalidOperation { reason: String, at: Attribution },

    #[error("predicted compile failure{}: {message}", at.suffix())]
    CompilationError { message: String, at: Attribution },

    #[error("cyclic dependency introduced: {cycle:?}")]
    CyclicDependency { cycle: Vec<String> },

    #[error("visibility violation{}: {reason}", at.suffix())]
    VisibilityViolation { reason: String, at: Attribution },

    #[error("name conflict{}: '{name}' already defined in scope", at.suffix())]
    NameConflict { name: String, at: Attribution },

    #[error("filesystem error at {path}: {source}")]
    FileSystemError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Aggregated failure from the Plan Executor: one Issue per problem site.
    #[error("validation failed with {} issue(s)", .issues.len())]
    ValidationError {
        issues: Vec<crate::plan::Issue>,
    },
}

impl GorefactorError {
    pub fn parse(message: impl Into<String>, at: Attribution) -> Self {
        Self::ParseError {
            message: message.into(),
            at,
        }
    }

    pub fn symbol_not_found(symbol: impl Into<String>) -> Self {
        Self::SymbolNotFound {
            symbol: symbol.into(),
            at: Attribution::none(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
            at: Attribution::none(),
        }
    }

    pub fn invalid_at(reason: impl Into<String>, at: Attribution) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
            at,
        }
    }

    pub fn name_conflict(name: impl Into<String>) -> Self {
        Self::NameConflict {
            name: name.into(),
            at: Attribution::none(),
        }
    }

    /// Returns the file attribution for this error, if any.
    pub fn attribution(&self) -> Option<&Attribution> {
        match self {
            Self::ParseError { at, .. }
            | Self::SymbolNotFound { at, .. }
            | Self::InvalidOperation { at, .. }
            | Self::CompilationError { at, .. }
            | Self::VisibilityViolation { at, .. }
            | Self::NameConflict { at, .. } => Some(at),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GorefactorError>;
