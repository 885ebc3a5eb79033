//! Foundation types shared by every other module.
//!
//! No dependencies on `parser`, `model`, `resolver`, `graph`, `plan`,
//! `executor`, `watcher`, or `ops` — this module is the bottom of the
//! dependency order.

mod ident;
mod position;

pub use ident::{is_exported, is_valid_identifier};
pub use position::{LineCol, LineIndex, Position, Span};

// Re-export text-size types for convenience; used directly by the parser's
// lossless tree and by byte-range Changes.
pub use text_size::{TextRange, TextSize};
