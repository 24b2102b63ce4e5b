//! Source locations for call sites and diagnostics.

/// A range in the source text.
///
/// Spans are byte offsets from the start of the source, matching the lexer's spans.
///
/// # Example
///
/// ```
/// use qblower::span::Span;
///
/// let span = Span::new(0, 5);
/// assert_eq!(span.start, 0);
/// assert_eq!(span.end, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the start of the span (inclusive).
    pub start: usize,
    /// Byte offset of the end of the span (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span from start to end byte offsets.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Creates a span that covers both `self` and `other`.
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// 1-based line and column of the span start within `source`.
    ///
    /// Columns count characters, not bytes. Offsets past the end clamp to
    /// the end of the source.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let mut offset = self.start.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        (line, column)
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(5, 10);
        let b = Span::new(2, 7);
        assert_eq!(a.merge(&b), Span::new(2, 10));
    }

    #[test]
    fn test_span_from_range() {
        let span: Span = (3..9).into();
        assert_eq!(span, Span::new(3, 9));
    }

    #[test]
    fn test_line_col() {
        let source = "CLS\nx = Len(a$)\n";
        assert_eq!(Span::new(0, 3).line_col(source), (1, 1));
        assert_eq!(Span::new(8, 11).line_col(source), (2, 5));
        assert_eq!(Span::new(100, 101).line_col(source), (3, 1));
    }
}
