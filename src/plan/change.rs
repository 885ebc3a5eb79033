//! A single textual edit against one file.

use std::path::PathBuf;

use text_size::TextRange;

/// One splice: replace the bytes at `range` (which must equal `old_text`,
/// checked by the executor before applying) with `new_text`. Plans are
/// flat lists of these; there is no nested edit-tree, which keeps
/// overlap-checking and application order (§4.4: descending start offset)
/// simple to reason about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub file: PathBuf,
    pub range: TextRange,
    pub old_text: String,
    pub new_text: String,
    pub description: String,
}

impl Change {
    pub fn new(
        file: PathBuf,
        range: TextRange,
        old_text: impl Into<String>,
        new_text: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            file,
            range,
            old_text: old_text.into(),
            new_text: new_text.into(),
            description: description.into(),
        }
    }

    pub fn overlaps(&self, other: &Change) -> bool {
        if self.file != other.file {
            return false;
        }
        match self.range.intersect(other.range) {
            Some(overlap) => overlap.len() > text_size::TextSize::from(0),
            None => false,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.old_text == self.new_text
    }
}
