//! # kite-common
//!
//! Shared infrastructure for the Kite checker:
//! - global byte positions and spans
//! - identifier interning
//! - diagnostics and their rendering
//! - the source map that ties positions back to files

pub mod diagnostics;
pub mod source;
pub mod span;
pub mod symbol;

pub use diagnostics::{Diagnostic, DiagnosticEmitter, DiagnosticSink, Label, Severity};
pub use source::{FileId, SourceFile, SourceMap};
pub use span::{BytePos, Span};
pub use symbol::{Symbol, SymbolInterner};
