use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// A point in a source file: 1-based line and column, 0-based byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: u32) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

/// A half-open region `[start, end)` of one source file.
///
/// The file name is shared between every span produced for the same file, so
/// cloning a span never copies the path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub file: Arc<str>,
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(file: Arc<str>, start: Position, end: Position) -> Self {
        Self { file, start, end }
    }

    /// Span for text the generator synthesised itself.
    pub fn synthetic() -> Self {
        Self {
            file: Arc::from(""),
            start: Position::default(),
            end: Position::default(),
        }
    }

    /// Smallest span covering both `self` and `other`. Both must belong to the
    /// same file; the file of `self` is kept.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            file: Arc::clone(&self.file),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Byte range suitable for diagnostic renderers. Never empty.
    pub fn byte_range(&self) -> Range<usize> {
        let start = self.start.offset as usize;
        let end = (self.end.offset as usize).max(start + 1);
        start..end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.start)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: u32, end: u32) -> Span {
        Span::new(
            Arc::from("a.go"),
            Position::new(1, start + 1, start),
            Position::new(1, end + 1, end),
        )
    }

    #[test]
    fn to_covers_both_regardless_of_order() {
        let a = span(4, 8);
        let b = span(1, 3);
        let merged = a.to(&b);
        assert_eq!(merged.start.offset, 1);
        assert_eq!(merged.end.offset, 8);
        assert_eq!(b.to(&a), merged);
    }

    #[test]
    fn byte_range_is_never_empty() {
        assert_eq!(span(5, 5).byte_range(), 5..6);
        assert_eq!(span(2, 7).byte_range(), 2..7);
    }

    #[test]
    fn display_uses_file_line_column() {
        assert_eq!(span(0, 3).to_string(), "a.go:1:1");
    }
}
