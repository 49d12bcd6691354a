//! Diagnostics and their rendering.
//!
//! Labels carry global spans only; the emitter maps them back to a file
//! through the [`SourceMap`] when rendering with `codespan-reporting`.

use std::fmt;

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label as CsLabel, Severity as CsSeverity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream, WriteColor};
use codespan_reporting::term::{self, Config};

pub use codespan_reporting::diagnostic::LabelStyle;

use crate::source::SourceMap;
use crate::span::Span;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

/// A source location attached to a diagnostic.
#[derive(Clone, Debug)]
pub struct Label {
    pub style: LabelStyle,
    pub span: Span,
    pub message: Option<String>,
}

impl Label {
    pub fn primary(span: impl Into<Span>) -> Self {
        Label {
            style: LabelStyle::Primary,
            span: span.into(),
            message: None,
        }
    }

    /// Points at related code, such as an earlier declaration.
    pub fn secondary(span: impl Into<Span>) -> Self {
        Label {
            style: LabelStyle::Secondary,
            ..Label::primary(span)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A problem in the analyzed source.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable numeric code, rendered as `E1234`.
    pub code: Option<u16>,
    pub message: String,
    pub labels: Vec<Label>,
}

impl Diagnostic {
    fn with_severity(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic::with_severity(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic::with_severity(Severity::Warning, message)
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|l| l.style == LabelStyle::Primary)
            .map(|l| l.span)
    }
}

/// Diagnostics in the order they were reported.
#[derive(Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        DiagnosticSink::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: DiagnosticSink) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Drops everything reported after the first `len` diagnostics.
    pub fn truncate(&mut self, len: usize) {
        self.diagnostics.truncate(len);
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.diagnostics.iter().map(|d| &d.message)).finish()
    }
}

/// Renders diagnostics against the files of a [`SourceMap`].
pub struct DiagnosticEmitter<'a> {
    source_map: &'a SourceMap,
    config: Config,
}

impl<'a> DiagnosticEmitter<'a> {
    pub fn new(source_map: &'a SourceMap) -> Self {
        DiagnosticEmitter {
            source_map,
            config: Config::default(),
        }
    }

    /// Writes every diagnostic of `sink` to stderr, colored when the
    /// terminal supports it.
    pub fn emit_all(&self, sink: &DiagnosticSink) {
        let stderr = StandardStream::stderr(ColorChoice::Auto);
        let mut writer = stderr.lock();
        for diagnostic in sink.iter() {
            self.emit_to(&mut writer, diagnostic);
        }
    }

    pub fn emit_to<W: WriteColor>(&self, writer: &mut W, diagnostic: &Diagnostic) {
        let mut files = SimpleFiles::new();
        for file in self.source_map.files() {
            files.add(file.name(), file.source());
        }
        // a failing writer has nowhere to report to
        let _ = term::emit(writer, &self.config, &files, &self.to_codespan(diagnostic));
    }

    fn to_codespan(&self, diagnostic: &Diagnostic) -> CsDiagnostic<usize> {
        let severity = match diagnostic.severity {
            Severity::Error => CsSeverity::Error,
            Severity::Warning => CsSeverity::Warning,
        };
        let mut cs = CsDiagnostic::new(severity).with_message(&diagnostic.message);
        if let Some(code) = diagnostic.code {
            cs = cs.with_code(format!("E{:04}", code));
        }
        // labels outside every file (synthesized nodes) are left out
        let labels = diagnostic.labels.iter().filter_map(|label| {
            let file = self.source_map.lookup_span(label.span)?;
            let range = file.local_offset(label.span.start) as usize..file.local_offset(label.span.end) as usize;
            let cs_label = CsLabel::new(label.style, file.id().as_u32() as usize, range);
            Some(match &label.message {
                Some(msg) => cs_label.with_message(msg),
                None => cs_label,
            })
        });
        cs.with_labels(labels.collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codespan_reporting::term::termcolor::Buffer;

    #[test]
    fn test_primary_span() {
        let diag = Diagnostic::error("undefined: x")
            .with_code(2200)
            .with_label(Label::secondary(1u32..2u32))
            .with_label(Label::primary(5u32..9u32).with_message("here"));
        assert!(diag.is_error());
        assert_eq!(diag.primary_span(), Some(Span::from_u32(5, 9)));
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn test_sink_counts() {
        let mut sink = DiagnosticSink::new();
        sink.emit(Diagnostic::error("a"));
        sink.emit(Diagnostic::warning("b"));

        let mut other = DiagnosticSink::new();
        other.emit(Diagnostic::error("c"));
        sink.extend(other);
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.error_count(), 2);
        assert_eq!(sink.warning_count(), 1);

        sink.truncate(1);
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 0);
        assert!(sink.has_errors());
    }

    #[test]
    fn test_emitter_renders_code_and_file() {
        let mut source_map = SourceMap::new();
        source_map.add_file("main.kite", "package main\nvar x = y\n");
        let base = source_map.files().next().map_or(0, |f| f.base());
        let diagnostic = Diagnostic::error("undeclared name: y")
            .with_code(2200)
            .with_label(Label::primary(base + 21..base + 22));
        let mut buffer = Buffer::no_color();
        DiagnosticEmitter::new(&source_map).emit_to(&mut buffer, &diagnostic);
        let output = String::from_utf8_lossy(buffer.as_slice());
        assert!(output.contains("E2200"));
        assert!(output.contains("undeclared name: y"));
        assert!(output.contains("main.kite"));
    }
}
