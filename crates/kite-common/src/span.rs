//! Byte positions and spans.
//!
//! Positions live in one global space shared by every file in a
//! [`SourceMap`](crate::source::SourceMap), so a span alone identifies
//! both the file and the range inside it. The empty span at 0 marks
//! synthesized nodes.

use std::fmt;
use std::ops::Range;

/// An absolute byte offset in the global position space.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BytePos(pub u32);

impl BytePos {
    #[inline]
    pub const fn to_u32(self) -> u32 {
        self.0
    }
}

impl From<u32> for BytePos {
    fn from(pos: u32) -> Self {
        BytePos(pos)
    }
}

impl fmt::Debug for BytePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl fmt::Display for BytePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A half-open byte range `[start, end)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: BytePos,
    pub end: BytePos,
}

impl Span {
    #[inline]
    pub const fn new(start: BytePos, end: BytePos) -> Self {
        Span { start, end }
    }

    #[inline]
    pub const fn from_u32(start: u32, end: u32) -> Self {
        Span::new(BytePos(start), BytePos(end))
    }

    /// The span of nodes the checker synthesizes.
    #[inline]
    pub const fn dummy() -> Self {
        Span::from_u32(0, 0)
    }

    pub const fn is_dummy(&self) -> bool {
        self.start.0 == 0 && self.end.0 == 0
    }

    pub const fn len(&self) -> u32 {
        self.end.0.saturating_sub(self.start.0)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// From the start of `self` to the end of `last`.
    pub const fn to(self, last: Span) -> Span {
        Span::new(self.start, last.end)
    }
}

impl From<Range<u32>> for Span {
    fn from(r: Range<u32>) -> Self {
        Span::from_u32(r.start, r.end)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len() {
        let span = Span::from_u32(10, 20);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
        assert!(Span::from_u32(7, 7).is_empty());
        assert!(Span::dummy().is_dummy());
        assert!(!span.is_dummy());
    }

    #[test]
    fn test_span_to() {
        let open = Span::from_u32(10, 11);
        let close = Span::from_u32(25, 26);
        assert_eq!(open.to(close), Span::from_u32(10, 26));
    }

    #[test]
    fn test_span_from_range() {
        let span: Span = (3u32..9u32).into();
        assert_eq!(span, Span::from_u32(3, 9));
        assert_eq!(format!("{:?}", span), "3..9");
        assert_eq!(format!("{:?}", BytePos(4)), "@4");
    }
}
