//! Byte-offset and line/column position tracking.
//!
//! Every position-bearing type in the model keeps two parallel
//! representations: an absolute byte offset (for splice math, carried as
//! [`TextRange`]/[`TextSize`] from `rowan`'s `text-size` crate) and a
//! 1-indexed line/column pair (for user-facing messages). [`LineIndex`] is
//! the bridge between them and is built once per file and cached on
//! [`crate::model::File`].

use text_size::TextSize;

/// A 1-indexed line/column position, per the Symbol/Reference data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A half-open line/column range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, position: Position) -> bool {
        position >= self.start && position <= self.end
    }
}

/// Alias kept for readability at call sites that think in "line, column"
/// rather than `Position`.
pub type LineCol = Position;

/// Maps byte offsets to 1-indexed line/column pairs for a single file's
/// text. Built once from the file's content and invalidated together with
/// the file's parse tree on every re-parse.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line, 0-indexed internally.
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        let mut offset = TextSize::from(0);
        for ch in text.chars() {
            let len = TextSize::of(ch);
            offset += len;
            if ch == '\n' {
                line_starts.push(offset);
            }
        }
        Self { line_starts }
    }

    /// Converts a byte offset into a 1-indexed line/column pair.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next_line) => next_line - 1,
        };
        let col = offset - self.line_starts[line];
        LineCol::new(line + 1, u32::from(col) as usize + 1)
    }

    /// Converts a 1-indexed line/column pair back into a byte offset.
    /// Returns `None` if the line is out of range.
    pub fn offset(&self, pos: LineCol) -> Option<TextSize> {
        let line_start = *self.line_starts.get(pos.line.checked_sub(1)?)?;
        Some(line_start + TextSize::from((pos.column - 1) as u32))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_roundtrip() {
        let text = "package a\nfunc F() {}\n\nvar x int\n";
        let index = LineIndex::new(text);
        assert_eq!(index.line_col(TextSize::from(0)), LineCol::new(1, 1));
        // 'f' of "func" is on line 2, column 1
        let func_offset = text.find("func").unwrap() as u32;
        assert_eq!(
            index.line_col(TextSize::from(func_offset)),
            LineCol::new(2, 1)
        );
        assert_eq!(
            index.offset(LineCol::new(2, 1)),
            Some(TextSize::from(func_offset))
        );
    }

    #[test]
    fn empty_file_has_one_line() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_col(TextSize::from(0)), LineCol::new(1, 1));
    }
}
