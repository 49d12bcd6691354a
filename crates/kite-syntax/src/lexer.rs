//! Hand-written lexer with automatic semicolon insertion.
//!
//! Positions are produced in the global position space: every span is
//! offset by the file's base so that it identifies the file on its own.
//!
//! A newline (or the end of input) after an identifier, a literal or a
//! closing bracket becomes a [`TokenKind::Semicolon`], which lets the
//! parser treat declarations uniformly whether or not they are written on
//! one line.

use std::str::Chars;

use kite_common::diagnostics::DiagnosticSink;
use kite_common::span::{BytePos, Span};

use crate::errors::SyntaxError;
use crate::token::{Token, TokenKind};

pub struct Lexer<'src> {
    source: &'src str,
    chars: Chars<'src>,
    base: u32,
    /// Byte offset into `source`.
    local_pos: u32,
    prev_kind: Option<TokenKind>,
    diagnostics: DiagnosticSink,
    /// Diagnostics count before the most recent token was scanned.
    token_mark: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, base: u32) -> Self {
        Self {
            source,
            chars: source.chars(),
            base,
            local_pos: 0,
            prev_kind: None,
            diagnostics: DiagnosticSink::new(),
            token_mark: 0,
        }
    }

    #[inline]
    fn pos(&self) -> u32 {
        self.base + self.local_pos
    }

    pub fn take_diagnostics(&mut self) -> DiagnosticSink {
        std::mem::take(&mut self.diagnostics)
    }

    /// The source text covered by a span produced by this lexer.
    pub fn text(&self, span: Span) -> &'src str {
        let start = (span.start.to_u32() - self.base) as usize;
        let end = (span.end.to_u32() - self.base) as usize;
        &self.source[start..end]
    }

    pub fn next_token(&mut self) -> Token {
        self.token_mark = self.diagnostics.len();
        if self.skip_whitespace_and_comments() {
            return self.semicolon();
        }
        let start = self.pos();
        let kind = match self.peek() {
            None => {
                if self.needs_semicolon() {
                    return self.semicolon();
                }
                TokenKind::Eof
            }
            Some(c) => self.scan_token(c),
        };
        self.prev_kind = Some(kind);
        Token::new(kind, Span::from_u32(start, self.pos()))
    }

    /// Skips a function body whose opening brace ends at `open_end`.
    ///
    /// Bodies are never checked, so they are skipped as raw text with only
    /// brace balancing, comments and quoted literals taken into account.
    /// Returns the closing brace, or `None` if the input ends first.
    pub fn skip_block(&mut self, open_end: BytePos) -> Option<Token> {
        // The token after the brace was already scanned as lookahead;
        // forget whatever it reported.
        self.diagnostics.truncate(self.token_mark);
        self.reset_to(open_end.to_u32() - self.base);
        let mut depth = 1usize;
        loop {
            let c = self.peek()?;
            match c {
                '{' => {
                    self.advance();
                    depth += 1;
                }
                '}' => {
                    let start = self.pos();
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        self.prev_kind = Some(TokenKind::RBrace);
                        return Some(Token::new(TokenKind::RBrace, Span::from_u32(start, self.pos())));
                    }
                }
                '/' if matches!(self.peek_next(), Some('/') | Some('*')) => {
                    if self.peek_next() == Some('/') {
                        self.skip_line_comment();
                    } else {
                        self.skip_block_comment();
                    }
                }
                '"' => {
                    self.scan_string();
                }
                '`' => {
                    self.scan_raw_string();
                }
                '\'' => {
                    self.scan_rune();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn reset_to(&mut self, local: u32) {
        self.local_pos = local;
        self.chars = self.source[local as usize..].chars();
    }

    fn semicolon(&mut self) -> Token {
        let pos = self.pos();
        self.prev_kind = Some(TokenKind::Semicolon);
        Token::new(TokenKind::Semicolon, Span::from_u32(pos, pos))
    }

    fn needs_semicolon(&self) -> bool {
        self.prev_kind.map_or(false, TokenKind::can_end_statement)
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.chars.clone();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.local_pos += c.len_utf8() as u32;
        Some(c)
    }

    fn advance_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Returns true when a newline must be turned into a semicolon.
    fn skip_whitespace_and_comments(&mut self) -> bool {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('\n') => {
                    let insert = self.needs_semicolon();
                    self.advance();
                    if insert {
                        return true;
                    }
                }
                Some('/') if self.peek_next() == Some('/') => self.skip_line_comment(),
                Some('/') if self.peek_next() == Some('*') => {
                    // A block comment spanning lines acts like a newline.
                    if self.skip_block_comment() && self.needs_semicolon() {
                        return true;
                    }
                }
                _ => return false,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Returns whether the comment contained a newline.
    fn skip_block_comment(&mut self) -> bool {
        let start = self.pos();
        self.advance();
        self.advance();
        let mut newline = false;
        loop {
            match self.advance() {
                None => {
                    self.diagnostics
                        .emit(SyntaxError::UnterminatedBlockComment.at(start..self.pos()));
                    return newline;
                }
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return newline;
                }
                Some('\n') => newline = true,
                Some(_) => {}
            }
        }
    }

    fn scan_token(&mut self, c: char) -> TokenKind {
        match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            ':' => self.single(TokenKind::Colon),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Star),
            '&' => self.single(TokenKind::Amp),
            '!' => self.single(TokenKind::Not),
            '=' => self.single(TokenKind::Assign),
            '.' => {
                self.advance();
                if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::Ellipsis
                } else if self.peek().map_or(false, |c| c.is_ascii_digit()) {
                    self.scan_fraction()
                } else {
                    TokenKind::Dot
                }
            }
            '"' => self.scan_string(),
            '`' => self.scan_raw_string(),
            '\'' => self.scan_rune(),
            '0'..='9' => self.scan_number(),
            c if is_ident_start(c) => self.scan_ident(),
            _ => {
                let start = self.pos();
                self.advance();
                self.diagnostics.emit(SyntaxError::UnexpectedChar.at_with_message(
                    start..self.pos(),
                    format!("unexpected character {:?}", c),
                ));
                TokenKind::Invalid
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn scan_ident(&mut self) -> TokenKind {
        let start = self.local_pos as usize;
        while self.peek().map_or(false, is_ident_continue) {
            self.advance();
        }
        TokenKind::keyword(&self.source[start..self.local_pos as usize]).unwrap_or(TokenKind::Ident)
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos();
        if self.advance() == Some('0') {
            match self.peek() {
                Some('x') | Some('X') => return self.scan_prefixed(start, 16, SyntaxError::HexNoDigits),
                Some('b') | Some('B') => return self.scan_prefixed(start, 2, SyntaxError::BinaryNoDigits),
                Some('o') | Some('O') => return self.scan_prefixed(start, 8, SyntaxError::UnexpectedChar),
                _ => {}
            }
        }
        self.scan_digits(10);
        match self.peek() {
            Some('.') if self.peek_next() != Some('.') => {
                self.advance();
                self.scan_fraction()
            }
            Some('e') | Some('E') => self.scan_exponent(),
            _ => TokenKind::IntLit,
        }
    }

    fn scan_prefixed(&mut self, start: u32, radix: u32, no_digits: SyntaxError) -> TokenKind {
        self.advance();
        if self.scan_digits(radix) == 0 {
            self.diagnostics.emit(no_digits.at(start..self.pos()));
            return TokenKind::Invalid;
        }
        TokenKind::IntLit
    }

    /// Digits after the decimal point, with an optional exponent.
    fn scan_fraction(&mut self) -> TokenKind {
        self.scan_digits(10);
        if matches!(self.peek(), Some('e') | Some('E')) {
            return self.scan_exponent();
        }
        TokenKind::FloatLit
    }

    fn scan_exponent(&mut self) -> TokenKind {
        let start = self.pos();
        self.advance();
        if matches!(self.peek(), Some('+') | Some('-')) {
            self.advance();
        }
        if self.scan_digits(10) == 0 {
            self.diagnostics
                .emit(SyntaxError::ExponentNoDigits.at(start..self.pos()));
            return TokenKind::Invalid;
        }
        TokenKind::FloatLit
    }

    /// Returns the number of digits consumed; underscores are separators.
    fn scan_digits(&mut self, radix: u32) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek() {
            if c == '_' {
                self.advance();
            } else if c.is_digit(radix) {
                self.advance();
                count += 1;
            } else {
                break;
            }
        }
        count
    }

    fn scan_string(&mut self) -> TokenKind {
        let start = self.pos();
        self.advance();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    self.diagnostics
                        .emit(SyntaxError::UnterminatedString.at(start..self.pos()));
                    return TokenKind::Invalid;
                }
                Some('"') => {
                    self.advance();
                    return TokenKind::StringLit;
                }
                Some('\\') => self.scan_escape('"'),
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn scan_raw_string(&mut self) -> TokenKind {
        let start = self.pos();
        self.advance();
        loop {
            match self.advance() {
                None => {
                    self.diagnostics
                        .emit(SyntaxError::UnterminatedRawString.at(start..self.pos()));
                    return TokenKind::Invalid;
                }
                Some('`') => return TokenKind::RawStringLit,
                Some(_) => {}
            }
        }
    }

    fn scan_rune(&mut self) -> TokenKind {
        let start = self.pos();
        self.advance();
        let mut count = 0;
        loop {
            match self.peek() {
                None | Some('\n') => {
                    self.diagnostics
                        .emit(SyntaxError::UnterminatedRune.at(start..self.pos()));
                    return TokenKind::Invalid;
                }
                Some('\'') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.scan_escape('\'');
                    count += 1;
                }
                Some(_) => {
                    self.advance();
                    count += 1;
                }
            }
        }
        match count {
            1 => TokenKind::RuneLit,
            0 => {
                self.diagnostics.emit(SyntaxError::EmptyRune.at(start..self.pos()));
                TokenKind::Invalid
            }
            _ => {
                self.diagnostics.emit(SyntaxError::MultiCharRune.at(start..self.pos()));
                TokenKind::Invalid
            }
        }
    }

    fn scan_escape(&mut self, quote: char) {
        let start = self.pos();
        self.advance();
        let (n, radix) = match self.advance() {
            Some(c) if c == quote => return,
            Some('a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\') => return,
            Some('0'..='7') => (2, 8),
            Some('x') => (2, 16),
            Some('u') => (4, 16),
            Some('U') => (8, 16),
            _ => {
                self.diagnostics
                    .emit(SyntaxError::UnknownEscape.at(start..self.pos()));
                return;
            }
        };
        for _ in 0..n {
            match self.peek() {
                Some(c) if c.is_digit(radix) => {
                    self.advance();
                }
                _ => {
                    self.diagnostics
                        .emit(SyntaxError::UnknownEscape.at(start..self.pos()));
                    return;
                }
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Decodes the text of a string or rune literal, quotes included.
///
/// The lexer has already validated escapes; malformed input decodes
/// leniently instead of failing.
pub fn unquote(lit: &str) -> String {
    if let Some(raw) = lit.strip_prefix('`') {
        return raw.trim_end_matches('`').replace('\r', "");
    }
    let inner = if lit.len() >= 2 { &lit[1..lit.len() - 1] } else { "" };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(e) = chars.next() else { break };
        let (n, radix, first) = match e {
            'a' => { out.push('\u{7}'); continue; }
            'b' => { out.push('\u{8}'); continue; }
            'f' => { out.push('\u{c}'); continue; }
            'n' => { out.push('\n'); continue; }
            'r' => { out.push('\r'); continue; }
            't' => { out.push('\t'); continue; }
            'v' => { out.push('\u{b}'); continue; }
            '0'..='7' => (2, 8, e.to_digit(8).unwrap_or(0)),
            'x' => (2, 16, 0),
            'u' => (4, 16, 0),
            'U' => (8, 16, 0),
            other => { out.push(other); continue; }
        };
        let mut value = first;
        for _ in 0..n {
            match chars.peek().and_then(|c| c.to_digit(radix)) {
                Some(d) => {
                    value = value * radix + d;
                    chars.next();
                }
                None => break,
            }
        }
        out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src, 0);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            out.push(tok.kind);
            if tok.kind == TokenKind::Eof {
                break;
            }
        }
        out
    }

    #[test]
    fn test_semicolon_insertion() {
        use TokenKind::*;
        assert_eq!(
            kinds("var x int\nvar y = f(1)\n"),
            vec![Var, Ident, Ident, Semicolon, Var, Ident, Assign, Ident, LParen, IntLit, RParen, Semicolon, Eof]
        );
    }

    #[test]
    fn test_no_semicolon_after_operator() {
        use TokenKind::*;
        assert_eq!(kinds("f(a,\n b)"), vec![Ident, LParen, Ident, Comma, Ident, RParen, Semicolon, Eof]);
    }

    #[test]
    fn test_numbers_and_ellipsis() {
        use TokenKind::*;
        assert_eq!(
            kinds("0x1F 1_000 3.14 1e9 .5 xs..."),
            vec![IntLit, IntLit, FloatLit, FloatLit, FloatLit, Ident, Ellipsis, Eof]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        use TokenKind::*;
        assert_eq!(kinds("a // note\n/* block */ b"), vec![Ident, Semicolon, Ident, Semicolon, Eof]);
    }

    #[test]
    fn test_unterminated_string_reports() {
        let mut lexer = Lexer::new("\"abc", 0);
        assert_eq!(lexer.next_token().kind, TokenKind::Invalid);
        let diags = lexer.take_diagnostics();
        assert_eq!(diags.diagnostics()[0].code, Some(SyntaxError::UnterminatedString.code()));
    }

    #[test]
    fn test_skip_block_balances_braces() {
        let src = "{ if x { y(\"}\") } } z";
        let mut lexer = Lexer::new(src, 100);
        let open = lexer.next_token();
        assert_eq!(open.kind, TokenKind::LBrace);
        let close = lexer.skip_block(open.span.end).unwrap();
        assert_eq!(close.span, Span::from_u32(118, 119));
        assert_eq!(lexer.next_token().kind, TokenKind::Ident);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"a\\tb\""), "a\tb");
        assert_eq!(unquote("\"\\x41\\u00e9\""), "Aé");
        assert_eq!(unquote("`raw\\n`"), "raw\\n");
        assert_eq!(unquote("'\\n'"), "\n");
        assert_eq!(unquote("\"\\101\""), "A");
    }
}
