//! Source location tracking

use serde::Serialize;

/// A span represents a range in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// 1-based line of `start`
    pub line: usize,
    /// 1-based column of `start`
    pub column: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self { start, end, line, column }
    }

    /// Create a dummy span (for testing and intrinsics)
    pub fn dummy() -> Self {
        Self { start: 0, end: 0, line: 0, column: 0 }
    }

    /// Merge two spans, keeping the position of whichever starts first
    pub fn merge(&self, other: &Span) -> Span {
        let first = if self.start <= other.start { self } else { other };
        Span {
            start: first.start,
            end: self.end.max(other.end),
            line: first.line,
            column: first.column,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
