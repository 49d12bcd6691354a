//! Syntax error codes (1xxx).
//!
//! - 1000-1099: lexer errors
//! - 1100-1199: parser errors

use kite_common::{Diagnostic, Label, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SyntaxError {
    // === Lexer (1000-1099) ===
    UnterminatedBlockComment = 1000,
    UnterminatedString = 1010,
    UnterminatedRawString = 1011,
    UnterminatedRune = 1012,
    EmptyRune = 1013,
    MultiCharRune = 1014,
    UnknownEscape = 1030,
    HexNoDigits = 1040,
    BinaryNoDigits = 1045,
    ExponentNoDigits = 1047,
    UnexpectedChar = 1090,

    // === Parser (1100-1199) ===
    ExpectedToken = 1100,
    UnexpectedToken = 1101,
    ExpectedExpr = 1102,
    ExpectedType = 1104,
    ExpectedIdent = 1105,
    ExpectedPackage = 1120,
    UnterminatedBody = 1121,
    MixedNamedParams = 1124,
    InvalidReceiver = 1125,
}

impl SyntaxError {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn message(self) -> &'static str {
        match self {
            SyntaxError::UnterminatedBlockComment => "unterminated block comment",
            SyntaxError::UnterminatedString => "unterminated string literal",
            SyntaxError::UnterminatedRawString => "unterminated raw string literal",
            SyntaxError::UnterminatedRune => "unterminated rune literal",
            SyntaxError::EmptyRune => "empty rune literal",
            SyntaxError::MultiCharRune => "rune literal has more than one character",
            SyntaxError::UnknownEscape => "unknown escape sequence",
            SyntaxError::HexNoDigits => "hexadecimal literal has no digits",
            SyntaxError::BinaryNoDigits => "binary literal has no digits",
            SyntaxError::ExponentNoDigits => "exponent has no digits",
            SyntaxError::UnexpectedChar => "unexpected character",
            SyntaxError::ExpectedToken => "expected token",
            SyntaxError::UnexpectedToken => "unexpected token",
            SyntaxError::ExpectedExpr => "expected expression",
            SyntaxError::ExpectedType => "expected type",
            SyntaxError::ExpectedIdent => "expected identifier",
            SyntaxError::ExpectedPackage => "expected package clause",
            SyntaxError::UnterminatedBody => "function body is not terminated",
            SyntaxError::MixedNamedParams => "mixed named and unnamed parameters",
            SyntaxError::InvalidReceiver => "method has multiple receivers",
        }
    }

    pub fn at(self, span: impl Into<Span>) -> Diagnostic {
        Diagnostic::error(self.message())
            .with_code(self.code())
            .with_label(Label::primary(span))
    }

    pub fn at_with_message(self, span: impl Into<Span>, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(message)
            .with_code(self.code())
            .with_label(Label::primary(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SyntaxError::UnterminatedBlockComment.code(), 1000);
        assert_eq!(SyntaxError::UnexpectedChar.code(), 1090);
        assert_eq!(SyntaxError::ExpectedToken.code(), 1100);
        assert_eq!(SyntaxError::MixedNamedParams.code(), 1124);
    }

    #[test]
    fn test_at_with_span() {
        let diag = SyntaxError::UnterminatedString.at(10u32..20u32);
        assert_eq!(diag.code, Some(1010));
        assert_eq!(diag.message, "unterminated string literal");
        assert_eq!(diag.labels[0].span.start.0, 10);
        assert_eq!(diag.labels[0].span.end.0, 20);
    }
}
