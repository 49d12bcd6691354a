//! Recursive descent parser.
//!
//! The parser works on a two-token window (`current` and `peek`) over the
//! lexer. Errors are reported to the parser's sink and signalled with
//! `Err(())`; the top level resynchronizes at the next declaration so that
//! one malformed declaration does not hide the rest of the file.

mod decl;
mod expr;
mod types;

use kite_common::diagnostics::DiagnosticSink;
use kite_common::span::{BytePos, Span};
use kite_common::symbol::SymbolInterner;

use crate::ast::*;
use crate::errors::SyntaxError;
use crate::lexer::{unquote, Lexer};
use crate::token::{Token, TokenKind};

pub type ParseResult<T> = Result<T, ()>;

/// Parses one file whose text starts at `base` in the global position space.
///
/// Always returns a `File`; whatever could not be parsed is reported in the
/// returned sink and left out of the tree.
pub fn parse_file(
    source: &str,
    base: u32,
    interner: &mut SymbolInterner,
    ids: &mut IdGen,
) -> (File, DiagnosticSink) {
    let mut parser = Parser::new(source, base, interner, ids);
    let file = parser.parse_file();
    let mut diagnostics = parser.lexer.take_diagnostics();
    diagnostics.extend(parser.take_diagnostics());
    (file, diagnostics)
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peek: Token,
    /// End of the last consumed token.
    prev_end: BytePos,
    interner: &'a mut SymbolInterner,
    ids: &'a mut IdGen,
    diagnostics: DiagnosticSink,
}

impl<'a> Parser<'a> {
    pub fn new(
        source: &'a str,
        base: u32,
        interner: &'a mut SymbolInterner,
        ids: &'a mut IdGen,
    ) -> Self {
        let mut lexer = Lexer::new(source, base);
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            current,
            peek,
            prev_end: BytePos(base),
            interner,
            ids,
            diagnostics: DiagnosticSink::new(),
        }
    }

    pub fn take_diagnostics(&mut self) -> DiagnosticSink {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn parse_file(&mut self) -> File {
        let start = self.current.span.start;

        let package = if self.at(TokenKind::Package) {
            self.advance();
            let name = self.parse_ident().ok();
            self.expect_semi();
            name
        } else {
            self.diagnostics.emit(SyntaxError::ExpectedPackage.at(self.current.span));
            None
        };

        let mut imports = Vec::new();
        while self.at(TokenKind::Import) {
            if self.parse_import_decl(&mut imports).is_err() {
                self.synchronize_to_decl();
            }
        }

        let mut decls = Vec::new();
        while !self.at_eof() {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            if self.parse_top_level_decl(&mut decls).is_err() {
                self.synchronize_to_decl();
            }
        }

        File {
            package,
            imports,
            decls,
            span: Span::new(start, self.current.span.end),
        }
    }

    fn parse_import_decl(&mut self, imports: &mut Vec<ImportSpec>) -> ParseResult<()> {
        self.expect(TokenKind::Import)?;
        if self.eat(TokenKind::LParen) {
            while !self.at(TokenKind::RParen) && !self.at_eof() {
                imports.push(self.parse_import_spec()?);
                self.expect_semi_in_group(TokenKind::RParen);
            }
            self.expect(TokenKind::RParen)?;
        } else {
            imports.push(self.parse_import_spec()?);
        }
        self.expect_semi();
        Ok(())
    }

    fn parse_import_spec(&mut self) -> ParseResult<ImportSpec> {
        let start = self.current.span.start;
        let name = if self.at(TokenKind::Ident) {
            Some(self.parse_ident()?)
        } else {
            None
        };
        if !matches!(self.current.kind, TokenKind::StringLit | TokenKind::RawStringLit) {
            self.error_expected("import path");
            return Err(());
        }
        let tok = self.advance();
        let path = unquote(self.lexer.text(tok.span));
        Ok(ImportSpec {
            name,
            path,
            path_span: tok.span,
            span: self.span_from(start),
        })
    }

    // =========================================================================
    // Token manipulation
    // =========================================================================

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        let token = std::mem::replace(&mut self.current, std::mem::replace(&mut self.peek, next));
        self.prev_end = token.span.end;
        token
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    fn at_eof(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            self.error_expected(kind.name());
            Err(())
        }
    }

    /// Declarations end with a semicolon, which may be implicit before EOF.
    fn expect_semi(&mut self) {
        if !self.eat(TokenKind::Semicolon) && !self.at_eof() {
            self.error_expected("';'");
        }
    }

    /// Inside `( ... )` or `{ ... }` the separator may be omitted before the
    /// closing token.
    fn expect_semi_in_group(&mut self, close: TokenKind) {
        if !self.eat(TokenKind::Semicolon) && !self.at(close) {
            self.error_expected("';'");
        }
    }

    fn span_from(&self, start: BytePos) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    fn synchronize_to_decl(&mut self) {
        loop {
            match self.current.kind {
                TokenKind::Eof => return,
                TokenKind::Const
                | TokenKind::Var
                | TokenKind::Type
                | TokenKind::Func
                | TokenKind::Import => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // =========================================================================
    // Node construction
    // =========================================================================

    fn parse_ident(&mut self) -> ParseResult<Ident> {
        if !self.at(TokenKind::Ident) {
            self.diagnostics.emit(SyntaxError::ExpectedIdent.at_with_message(
                self.current.span,
                format!("expected identifier, found {}", self.current.kind),
            ));
            return Err(());
        }
        let tok = self.advance();
        Ok(self.make_ident(tok))
    }

    fn make_ident(&mut self, tok: Token) -> Ident {
        let text = self.lexer.text(tok.span);
        Ident {
            id: self.ids.ident(),
            symbol: self.interner.intern(text),
            span: tok.span,
        }
    }

    fn make_expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        Expr {
            id: self.ids.expr(),
            kind,
            span,
        }
    }

    fn ident_expr(&mut self, ident: Ident) -> Expr {
        self.make_expr(ExprKind::Ident(ident), ident.span)
    }

    // =========================================================================
    // Errors
    // =========================================================================

    fn error_expected(&mut self, what: &str) {
        self.diagnostics.emit(SyntaxError::ExpectedToken.at_with_message(
            self.current.span,
            format!("expected {}, found {}", what, self.current.kind),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn parse(src: &str) -> (File, DiagnosticSink, SymbolInterner) {
        let mut interner = SymbolInterner::new();
        let mut ids = IdGen::new();
        let (file, diags) = parse_file(src, 0, &mut interner, &mut ids);
        (file, diags, interner)
    }

    #[test]
    fn test_package_and_imports() {
        let (file, diags, interner) = parse(
            "package main\n\nimport \"fmt\"\nimport (\n\tm \"math\"\n\t\"C\"\n)\n",
        );
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let pkg = file.package.unwrap();
        assert_eq!(interner.resolve(pkg.symbol), Some("main"));
        let paths: Vec<_> = file.imports.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["fmt", "math", "C"]);
        assert_eq!(interner.resolve(file.imports[1].name.unwrap().symbol), Some("m"));
    }

    #[test]
    fn test_missing_package_clause() {
        let (_, diags, _) = parse("var x int\n");
        assert_eq!(diags.diagnostics()[0].code, Some(SyntaxError::ExpectedPackage.code()));
    }

    #[test]
    fn test_recovers_at_next_decl() {
        let (file, diags, _) = parse("package p\nvar = 1\nvar y int\n");
        assert!(diags.has_errors());
        assert_eq!(file.decls.len(), 1);
    }
}
