//! Package-level declarations.

use super::{ParseResult, Parser};
use crate::ast::*;
use crate::errors::SyntaxError;
use crate::token::TokenKind;
use kite_common::span::Span;

impl<'a> Parser<'a> {
    pub(super) fn parse_top_level_decl(&mut self, decls: &mut Vec<Decl>) -> ParseResult<()> {
        match self.current.kind {
            TokenKind::Const => self.parse_value_decl(decls, true),
            TokenKind::Var => self.parse_value_decl(decls, false),
            TokenKind::Type => self.parse_type_decl(decls),
            TokenKind::Func => {
                let decl = self.parse_func_decl()?;
                decls.push(Decl::Func(decl));
                Ok(())
            }
            TokenKind::Import => {
                let span = self.current.span;
                self.diagnostics.emit(SyntaxError::UnexpectedToken.at_with_message(
                    span,
                    "imports must appear before other declarations",
                ));
                let mut ignored = Vec::new();
                self.parse_import_decl(&mut ignored)
            }
            _ => {
                self.diagnostics.emit(SyntaxError::UnexpectedToken.at_with_message(
                    self.current.span,
                    format!("non-declaration {} outside function body", self.current.kind),
                ));
                self.advance();
                Err(())
            }
        }
    }

    fn parse_value_decl(&mut self, decls: &mut Vec<Decl>, is_const: bool) -> ParseResult<()> {
        self.advance();
        let wrap = |spec| if is_const { Decl::Const(spec) } else { Decl::Var(spec) };
        if self.eat(TokenKind::LParen) {
            let mut iota = 0;
            let mut prev: Option<(Option<Expr>, Vec<Expr>)> = None;
            while !self.at(TokenKind::RParen) && !self.at_eof() {
                let mut spec = self.parse_value_spec(iota)?;
                if is_const {
                    if spec.ty.is_none() && spec.values.is_empty() {
                        if let Some((ty, values)) = &prev {
                            spec.ty = ty.clone();
                            spec.values = values.clone();
                            spec.implicit = true;
                        }
                    } else {
                        prev = Some((spec.ty.clone(), spec.values.clone()));
                    }
                }
                decls.push(wrap(spec));
                iota += 1;
                self.expect_semi_in_group(TokenKind::RParen);
            }
            self.expect(TokenKind::RParen)?;
        } else {
            let spec = self.parse_value_spec(0)?;
            decls.push(wrap(spec));
        }
        self.expect_semi();
        Ok(())
    }

    fn parse_value_spec(&mut self, iota: u32) -> ParseResult<ValueSpec> {
        let start = self.current.span.start;
        let mut names = vec![self.parse_ident()?];
        while self.eat(TokenKind::Comma) {
            names.push(self.parse_ident()?);
        }
        let ty = if self.at(TokenKind::Assign) || self.at(TokenKind::Semicolon) || self.at(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_type()?)
        };
        let values = if self.eat(TokenKind::Assign) {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        Ok(ValueSpec {
            names,
            ty,
            values,
            iota,
            implicit: false,
            span: self.span_from(start),
        })
    }

    fn parse_type_decl(&mut self, decls: &mut Vec<Decl>) -> ParseResult<()> {
        self.advance();
        if self.eat(TokenKind::LParen) {
            while !self.at(TokenKind::RParen) && !self.at_eof() {
                let spec = self.parse_type_spec()?;
                decls.push(Decl::Type(spec));
                self.expect_semi_in_group(TokenKind::RParen);
            }
            self.expect(TokenKind::RParen)?;
        } else {
            let spec = self.parse_type_spec()?;
            decls.push(Decl::Type(spec));
        }
        self.expect_semi();
        Ok(())
    }

    fn parse_type_spec(&mut self) -> ParseResult<TypeSpec> {
        let start = self.current.span.start;
        let name = self.parse_ident()?;
        let mut tparams = Vec::new();

        // `type A [N]int` and `type L[T any] ...` only differ after the
        // first identifier inside the brackets.
        let mut array: Option<Expr> = None;
        if self.at(TokenKind::LBracket) && self.peek_is(TokenKind::Ident) {
            let lbrack = self.advance();
            let first = self.parse_ident()?;
            if self.starts_type() || self.at(TokenKind::Comma) {
                tparams = self.parse_type_params_from(first)?;
                self.expect(TokenKind::RBracket)?;
            } else {
                let len = self.ident_expr(first);
                let len = self.parse_primary_suffix(len)?;
                self.expect(TokenKind::RBracket)?;
                let elem = self.parse_type()?;
                let span = self.span_from(lbrack.span.start);
                array = Some(self.make_expr(
                    ExprKind::ArrayType(Box::new(ArrayTypeExpr { len: Some(len), elem })),
                    span,
                ));
            }
        }

        let (assign, ty) = match array {
            Some(ty) => (false, ty),
            None => {
                let assign = self.eat(TokenKind::Assign);
                (assign, self.parse_type()?)
            }
        };
        Ok(TypeSpec {
            name,
            tparams,
            assign,
            ty,
            span: self.span_from(start),
        })
    }

    /// Parses `[T any, U comparable]` after the opening bracket.
    pub(super) fn parse_type_params(&mut self) -> ParseResult<Vec<TypeParamDecl>> {
        let first = self.parse_ident()?;
        self.parse_type_params_from(first)
    }

    fn parse_type_params_from(&mut self, first: Ident) -> ParseResult<Vec<TypeParamDecl>> {
        let mut groups = Vec::new();
        let mut names = vec![first];
        loop {
            while self.eat(TokenKind::Comma) {
                if self.at(TokenKind::RBracket) {
                    break;
                }
                names.push(self.parse_ident()?);
            }
            if self.at(TokenKind::RBracket) {
                self.error_expected("type constraint");
                return Err(());
            }
            let constraint = self.parse_type()?;
            groups.push(TypeParamDecl {
                names: std::mem::take(&mut names),
                constraint,
            });
            if !self.eat(TokenKind::Comma) || self.at(TokenKind::RBracket) {
                break;
            }
            names.push(self.parse_ident()?);
        }
        Ok(groups)
    }

    fn parse_func_decl(&mut self) -> ParseResult<FuncDecl> {
        let start = self.current.span.start;
        self.expect(TokenKind::Func)?;

        let recv = if self.at(TokenKind::LParen) {
            let lparen = self.current.span;
            let mut params = self.parse_params()?;
            if params.len() != 1 {
                let err = if params.is_empty() {
                    SyntaxError::InvalidReceiver.at_with_message(lparen, "method has no receiver")
                } else {
                    SyntaxError::InvalidReceiver.at(params[1].span)
                };
                self.diagnostics.emit(err);
            }
            if params.is_empty() {
                None
            } else {
                Some(params.swap_remove(0))
            }
        } else {
            None
        };

        let name = self.parse_ident()?;
        let tparams = if self.at(TokenKind::LBracket) {
            self.advance();
            let tparams = self.parse_type_params()?;
            self.expect(TokenKind::RBracket)?;
            tparams
        } else {
            Vec::new()
        };
        let sig = self.parse_signature()?;

        let body = if self.at(TokenKind::LBrace) {
            Some(self.skip_body()?)
        } else {
            None
        };
        let span = self.span_from(start);
        self.expect_semi();
        Ok(FuncDecl {
            recv,
            name,
            tparams,
            sig,
            body,
            span,
        })
    }

    /// Skips a function body as raw text. `current` must be the opening brace.
    fn skip_body(&mut self) -> ParseResult<Span> {
        let open = self.current;
        match self.lexer.skip_block(open.span.end) {
            Some(close) => {
                self.current = close;
                self.peek = self.lexer.next_token();
                self.advance();
                Ok(open.span.to(close.span))
            }
            None => {
                self.diagnostics.emit(SyntaxError::UnterminatedBody.at(open.span));
                self.current = self.lexer.next_token();
                self.peek = self.lexer.next_token();
                Err(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse;
    use crate::ast::*;

    #[test]
    fn test_const_group_repeats_values() {
        let (file, diags, _) = parse("package p\nconst (\n\tA = iota\n\tB\n\tC\n)\n");
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        assert_eq!(file.decls.len(), 3);
        match &file.decls[2] {
            Decl::Const(spec) => {
                assert_eq!(spec.iota, 2);
                assert!(spec.implicit);
                assert_eq!(spec.values.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_generic_type_and_array_type() {
        let (file, diags, _) = parse("package p\ntype L[K comparable, V any] struct{}\ntype A [N]int\n");
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        match &file.decls[0] {
            Decl::Type(spec) => {
                assert_eq!(spec.tparams.len(), 2);
                assert!(matches!(spec.ty.kind, ExprKind::StructType(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
        match &file.decls[1] {
            Decl::Type(spec) => {
                assert!(spec.tparams.is_empty());
                assert!(matches!(spec.ty.kind, ExprKind::ArrayType(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_type_params_sharing_constraint() {
        let (file, diags, _) = parse("package p\nfunc F[T, U any](t T, u U) {}\n");
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        match &file.decls[0] {
            Decl::Func(f) => {
                assert_eq!(f.tparams.len(), 1);
                assert_eq!(f.tparams[0].names.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_method_with_generic_receiver_and_body() {
        let src = "package p\nfunc (l *List[T]) Push(v T) {\n\tl.items = append(l.items, v)\n}\nvar x int\n";
        let (file, diags, _) = parse(src);
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        assert_eq!(file.decls.len(), 2);
        match &file.decls[0] {
            Decl::Func(f) => {
                let recv = f.recv.as_ref().unwrap();
                assert!(recv.name.is_some());
                assert!(matches!(recv.ty.kind, ExprKind::Star(_)));
                assert!(f.body.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_body() {
        let (_, diags, _) = parse("package p\nfunc f() {\n");
        assert!(diags
            .iter()
            .any(|d| d.code == Some(crate::errors::SyntaxError::UnterminatedBody.code())));
    }
}
