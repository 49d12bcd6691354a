//! Source files in a global position space.
//!
//! Each file added to a [`SourceMap`] is given a base offset; the next file
//! starts one byte past the previous file's end, so file ranges never touch
//! and any [`BytePos`] maps back to exactly one file.

use std::fmt;
use std::sync::Arc;

use crate::span::{BytePos, Span};

/// Index of a file in its [`SourceMap`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FileId(u32);

impl FileId {
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

#[derive(Clone)]
pub struct SourceFile {
    id: FileId,
    name: Arc<str>,
    source: Arc<str>,
    base: u32,
}

impl SourceFile {
    #[inline]
    pub const fn id(&self) -> FileId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Exclusive end in global space.
    pub fn end_pos(&self) -> u32 {
        self.base + self.source.len() as u32
    }

    #[inline]
    pub fn local_offset(&self, pos: BytePos) -> u32 {
        pos.to_u32().saturating_sub(self.base)
    }

    /// The text under `span`, clamped to the file.
    pub fn span_text(&self, span: Span) -> &str {
        let len = self.source.len();
        let start = (self.local_offset(span.start) as usize).min(len);
        let end = (self.local_offset(span.end) as usize).clamp(start, len);
        &self.source[start..end]
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}+{}", self.name, self.base, self.source.len())
    }
}

/// Owns every source file of an analysis run.
#[derive(Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, name: impl Into<Arc<str>>, source: impl Into<Arc<str>>) -> FileId {
        let id = FileId(self.files.len() as u32);
        let base = self.files.last().map_or(0, |last| last.end_pos() + 1);
        self.files.push(SourceFile {
            id,
            name: name.into(),
            source: source.into(),
            base,
        });
        id
    }

    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    /// The file containing `pos`. A file's end position counts as inside
    /// it so that end-of-file spans resolve.
    pub fn lookup_file(&self, pos: BytePos) -> Option<&SourceFile> {
        let p = pos.to_u32();
        let idx = self.files.partition_point(|f| f.base <= p);
        let file = self.files.get(idx.checked_sub(1)?)?;
        (p <= file.end_pos()).then_some(file)
    }

    pub fn lookup_span(&self, span: Span) -> Option<&SourceFile> {
        self.lookup_file(span.start)
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    pub fn span_text(&self, span: Span) -> Option<&str> {
        self.lookup_span(span).map(|f| f.span_text(span))
    }
}

impl fmt::Debug for SourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.files).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_get_disjoint_bases() {
        let mut map = SourceMap::new();
        let a = map.add_file("a.kite", "package a\n");
        let b = map.add_file("b.kite", "package b\n");
        let fa = map.get_file(a).unwrap();
        let fb = map.get_file(b).unwrap();
        assert_eq!(fa.base(), 0);
        assert_eq!(fb.base(), fa.end_pos() + 1);
        assert_eq!(map.lookup_file(BytePos(fb.base() + 2)).unwrap().id(), b);
        assert_eq!(map.lookup_file(BytePos(fa.end_pos())).unwrap().id(), a);
    }

    #[test]
    fn test_span_text() {
        let mut map = SourceMap::new();
        map.add_file("main.kite", "package main\nvar x = 1\n");
        assert_eq!(map.span_text(Span::from_u32(13, 16)), Some("var"));
        assert_eq!(map.span_text(Span::from_u32(21, 99)), Some("1\n"));
    }

    #[test]
    fn test_unknown_position() {
        let map = SourceMap::new();
        assert!(map.lookup_file(BytePos(3)).is_none());
        assert!(map.span_text(Span::from_u32(3, 4)).is_none());
    }
}
