//! Source positions for diagnostic messages

use serde::{Deserialize, Serialize};

/// Position of a character within a line-oriented source.
///
/// Positions are advanced by the scanner while tokenizing and are only used
/// for diagnostics; they are never part of the persisted data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,

    /// Character offset within the line (0-indexed)
    pub offset: usize,
}

impl Position {
    /// Create a new position
    #[must_use]
    pub fn new(line: usize, offset: usize) -> Self {
        Self { line, offset }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, offset {}", self.line, self.offset)
    }
}
