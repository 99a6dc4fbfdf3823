//! Source locations

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte range in the original source plus the line/column of its start.
///
/// Nodes synthesized by a pass borrow the span of the statement they were
/// generated for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// 1-indexed line of `start` (0 when unknown)
    pub line: u32,
    /// 1-indexed column of `start` (0 when unknown)
    pub column: u32,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Span with no source location
    pub fn dummy() -> Self {
        Self::default()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_line_and_column() {
        assert_eq!(Span::new(22, 23, 2, 7).to_string(), "2:7");
        assert_eq!(Span::dummy().to_string(), "0:0");
    }
}
