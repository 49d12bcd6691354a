//! Expression parsing.
//!
//! There are no binary operators in declarations the checker accepts, so
//! an expression is a chain of prefix operators over a primary expression.

use super::{ParseResult, Parser};
use crate::ast::*;
use crate::errors::SyntaxError;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_unary()
    }

    pub(super) fn parse_expr_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut list = vec![self.parse_expr()?];
        while self.eat(TokenKind::Comma) {
            list.push(self.parse_expr()?);
        }
        Ok(list)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.current.span.start;
        let op = match self.current.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Amp => UnaryOp::Addr,
            TokenKind::Star => {
                self.advance();
                let inner = self.parse_unary()?;
                let span = self.span_from(start);
                return Ok(self.make_expr(ExprKind::Star(Box::new(inner)), span));
            }
            _ => return self.parse_primary_expr(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        let span = self.span_from(start);
        Ok(self.make_expr(ExprKind::Unary(Box::new(UnaryExpr { op, operand })), span))
    }

    fn parse_primary_expr(&mut self) -> ParseResult<Expr> {
        let operand = self.parse_operand()?;
        self.parse_primary_suffix(operand)
    }

    fn parse_operand(&mut self) -> ParseResult<Expr> {
        let start = self.current.span.start;
        let lit = match self.current.kind {
            TokenKind::Ident => {
                let ident = self.parse_ident()?;
                return Ok(self.ident_expr(ident));
            }
            TokenKind::IntLit => LitKind::Int,
            TokenKind::FloatLit => LitKind::Float,
            TokenKind::RuneLit => LitKind::Rune,
            TokenKind::StringLit | TokenKind::RawStringLit => LitKind::String,
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                let span = self.span_from(start);
                return Ok(self.make_expr(ExprKind::Paren(Box::new(inner)), span));
            }
            TokenKind::LBracket
            | TokenKind::Map
            | TokenKind::Func
            | TokenKind::Struct
            | TokenKind::Interface => return self.parse_type_literal(),
            TokenKind::Invalid => {
                // already reported by the lexer
                let tok = self.advance();
                return Ok(self.make_expr(ExprKind::Bad, tok.span));
            }
            _ => {
                self.diagnostics.emit(SyntaxError::ExpectedExpr.at_with_message(
                    self.current.span,
                    format!("expected expression, found {}", self.current.kind),
                ));
                return Err(());
            }
        };
        let tok = self.advance();
        let raw = self.lexer.text(tok.span).to_string();
        Ok(self.make_expr(ExprKind::BasicLit(BasicLit { kind: lit, raw }), tok.span))
    }

    /// Selectors, type assertions, index expressions and calls.
    pub(super) fn parse_primary_suffix(&mut self, mut x: Expr) -> ParseResult<Expr> {
        let start = x.span.start;
        loop {
            let kind = match self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    if self.at(TokenKind::Ident) {
                        let sel = self.parse_ident()?;
                        ExprKind::Selector(Box::new(SelectorExpr { expr: x, sel }))
                    } else if self.eat(TokenKind::LParen) {
                        let ty = self.parse_type()?;
                        self.expect(TokenKind::RParen)?;
                        ExprKind::TypeAssert(Box::new(TypeAssertExpr { expr: x, ty }))
                    } else {
                        self.error_expected("name or '('");
                        return Err(());
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    if self.at(TokenKind::RBracket) {
                        self.diagnostics.emit(SyntaxError::ExpectedExpr.at_with_message(
                            self.current.span,
                            "expected operand",
                        ));
                        return Err(());
                    }
                    let mut indices = vec![self.parse_expr()?];
                    while self.eat(TokenKind::Comma) {
                        if self.at(TokenKind::RBracket) {
                            break;
                        }
                        indices.push(self.parse_expr()?);
                    }
                    self.expect(TokenKind::RBracket)?;
                    ExprKind::Index(Box::new(IndexExpr { expr: x, indices }))
                }
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    let mut spread = false;
                    while !self.at(TokenKind::RParen) && !self.at_eof() {
                        args.push(self.parse_expr()?);
                        if self.eat(TokenKind::Ellipsis) {
                            spread = true;
                        }
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    ExprKind::Call(Box::new(CallExpr { func: x, args, spread }))
                }
                _ => return Ok(x),
            };
            let span = self.span_from(start);
            x = self.make_expr(kind, span);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse;
    use crate::ast::*;

    fn var_value(src: &str) -> Expr {
        let (file, diags, _) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        match file.decls.into_iter().next() {
            Some(Decl::Var(mut spec)) => spec.values.remove(0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_call_with_spread() {
        let e = var_value("package p\nvar x = f(a, b...)\n");
        let ExprKind::Call(call) = e.kind else { panic!() };
        assert_eq!(call.args.len(), 2);
        assert!(call.spread);
    }

    #[test]
    fn test_selector_chain_and_type_assert() {
        let e = var_value("package p\nvar x = a.b.c.(T)\n");
        let ExprKind::TypeAssert(ta) = e.kind else { panic!() };
        assert!(matches!(ta.expr.kind, ExprKind::Selector(_)));
    }

    #[test]
    fn test_multi_index_instantiation() {
        let e = var_value("package p\nvar x = Map[string, int](m)\n");
        let ExprKind::Call(call) = e.kind else { panic!() };
        let ExprKind::Index(ix) = &call.func.kind else { panic!() };
        assert_eq!(ix.indices.len(), 2);
    }

    #[test]
    fn test_type_literals_as_operands() {
        let e = var_value("package p\nvar x = []byte(s)\n");
        let ExprKind::Call(call) = e.kind else { panic!() };
        assert!(matches!(call.func.kind, ExprKind::ArrayType(_)));
    }

    #[test]
    fn test_unary_chain_and_literals() {
        let e = var_value("package p\nvar x = -*&y\n");
        let ExprKind::Unary(u) = e.kind else { panic!() };
        assert_eq!(u.op, UnaryOp::Neg);
        assert!(matches!(u.operand.kind, ExprKind::Star(_)));

        let e = var_value("package p\nvar s = \"hi\"\n");
        let ExprKind::BasicLit(lit) = e.kind else { panic!() };
        assert_eq!(lit.kind, LitKind::String);
        assert_eq!(lit.raw, "\"hi\"");
    }

    #[test]
    fn test_spans_cover_expression() {
        let e = var_value("package p\nvar x = f(1)\n");
        assert_eq!(e.span.start.0, 18);
        assert_eq!(e.span.end.0, 22);
    }
}
