//! Token definitions.

use std::fmt;

use kite_common::span::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TokenKind {
    Eof,
    /// A character the lexer could not make sense of.
    Invalid,

    Ident,
    IntLit,
    FloatLit,
    RuneLit,
    StringLit,
    RawStringLit,

    // Keywords
    Const,
    Func,
    Import,
    Interface,
    Map,
    Package,
    Struct,
    Type,
    Var,

    // Operators and punctuation
    Plus,
    Minus,
    Star,
    Amp,
    Not,
    Assign,
    Dot,
    Ellipsis,
    Comma,
    Semicolon,
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

impl TokenKind {
    /// Maps an identifier to its keyword kind.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        Some(match ident {
            "const" => TokenKind::Const,
            "func" => TokenKind::Func,
            "import" => TokenKind::Import,
            "interface" => TokenKind::Interface,
            "map" => TokenKind::Map,
            "package" => TokenKind::Package,
            "struct" => TokenKind::Struct,
            "type" => TokenKind::Type,
            "var" => TokenKind::Var,
            _ => return None,
        })
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntLit
                | TokenKind::FloatLit
                | TokenKind::RuneLit
                | TokenKind::StringLit
                | TokenKind::RawStringLit
        )
    }

    /// Whether a newline after this token becomes a semicolon.
    pub fn can_end_statement(self) -> bool {
        self.is_literal()
            || matches!(
                self,
                TokenKind::Ident
                    | TokenKind::RParen
                    | TokenKind::RBracket
                    | TokenKind::RBrace
            )
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Eof => "EOF",
            TokenKind::Invalid => "invalid token",
            TokenKind::Ident => "identifier",
            TokenKind::IntLit => "integer literal",
            TokenKind::FloatLit => "float literal",
            TokenKind::RuneLit => "rune literal",
            TokenKind::StringLit | TokenKind::RawStringLit => "string literal",
            TokenKind::Const => "'const'",
            TokenKind::Func => "'func'",
            TokenKind::Import => "'import'",
            TokenKind::Interface => "'interface'",
            TokenKind::Map => "'map'",
            TokenKind::Package => "'package'",
            TokenKind::Struct => "'struct'",
            TokenKind::Type => "'type'",
            TokenKind::Var => "'var'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Amp => "'&'",
            TokenKind::Not => "'!'",
            TokenKind::Assign => "'='",
            TokenKind::Dot => "'.'",
            TokenKind::Ellipsis => "'...'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(TokenKind::keyword("func"), Some(TokenKind::Func));
        assert_eq!(TokenKind::keyword("interface"), Some(TokenKind::Interface));
        assert_eq!(TokenKind::keyword("funcs"), None);
    }

    #[test]
    fn test_semicolon_insertion_triggers() {
        assert!(TokenKind::Ident.can_end_statement());
        assert!(TokenKind::RParen.can_end_statement());
        assert!(TokenKind::StringLit.can_end_statement());
        assert!(!TokenKind::Comma.can_end_statement());
        assert!(!TokenKind::LBrace.can_end_statement());
    }
}
