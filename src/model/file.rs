//! A single source file's text, parse tree, and pending in-memory edits.

use std::path::PathBuf;

use crate::base::LineIndex;
use crate::parser::{self, Parse};

/// A not-yet-applied text edit, expressed as a byte-range splice. Plans
/// accumulate these against a [`File`] before the executor commits them to
/// disk; see [`crate::executor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub range: text_size::TextRange,
    pub old_text: String,
    pub new_text: String,
}

/// One source file inside a [`super::Package`].
#[derive(Debug, Clone)]
pub struct File {
    pub path: PathBuf,
    pub text: String,
    pub line_index: LineIndex,
    pub parse_errors: Vec<String>,
    /// Whether the file parsed cleanly. Degraded files still contribute
    /// whatever top-level declarations the parser managed to recover, but
    /// are excluded from operations that require a fully sound tree.
    pub degraded: bool,
    syntax: parser::SyntaxNode,
}

impl File {
    pub fn load(path: PathBuf, text: String) -> Self {
        let Parse { green, errors } = parser::parse(&text);
        let syntax = parser::SyntaxNode::new_root(green);
        let line_index = LineIndex::new(&text);
        let degraded = !errors.is_empty();
        let parse_errors = errors.into_iter().map(|e| e.message).collect();
        Self {
            path,
            text,
            line_index,
            parse_errors,
            degraded,
            syntax,
        }
    }

    pub fn syntax(&self) -> &parser::SyntaxNode {
        &self.syntax
    }

    pub fn source_file(&self) -> Option<parser::SourceFile> {
        <parser::SourceFile as parser::AstNode>::cast(self.syntax.clone())
    }

    /// Re-parses after `text` has changed (file-watch update or an
    /// already-applied plan step), refreshing the tree and line index.
    pub fn reload(&mut self, text: String) {
        let Parse { green, errors } = parser::parse(&text);
        self.syntax = parser::SyntaxNode::new_root(green);
        self.line_index = LineIndex::new(&text);
        self.degraded = !errors.is_empty();
        self.parse_errors = errors.into_iter().map(|e| e.message).collect();
        self.text = text;
    }
}
