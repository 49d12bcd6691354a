//! Type parsing: type expressions, signatures, parameter lists, struct and
//! interface bodies.

use super::{ParseResult, Parser};
use crate::ast::*;
use crate::errors::SyntaxError;
use crate::token::TokenKind;
use kite_common::span::{BytePos, Span};

/// A parameter list entry before Go-style name grouping is applied.
enum Entry {
    /// A lone identifier: a name in `a, b int`, or a type in `(int, string)`.
    Bare(Ident),
    Named(Ident, Expr, bool),
    Type(Expr, bool),
}

impl<'a> Parser<'a> {
    /// Whether the current token can begin a type.
    pub(super) fn starts_type(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Ident
                | TokenKind::Star
                | TokenKind::LBracket
                | TokenKind::Map
                | TokenKind::Func
                | TokenKind::Struct
                | TokenKind::Interface
                | TokenKind::LParen
        )
    }

    pub fn parse_type(&mut self) -> ParseResult<Expr> {
        let start = self.current.span.start;
        match self.current.kind {
            TokenKind::Ident => {
                let ident = self.parse_ident()?;
                let mut ty = self.ident_expr(ident);
                if self.eat(TokenKind::Dot) {
                    let sel = self.parse_ident()?;
                    let span = self.span_from(start);
                    ty = self.make_expr(ExprKind::Selector(Box::new(SelectorExpr { expr: ty, sel })), span);
                }
                if self.at(TokenKind::LBracket) {
                    self.advance();
                    let indices = self.parse_type_list(TokenKind::RBracket)?;
                    self.expect(TokenKind::RBracket)?;
                    let span = self.span_from(start);
                    ty = self.make_expr(ExprKind::Index(Box::new(IndexExpr { expr: ty, indices })), span);
                }
                Ok(ty)
            }
            TokenKind::Star => {
                self.advance();
                let base = self.parse_type()?;
                let span = self.span_from(start);
                Ok(self.make_expr(ExprKind::Star(Box::new(base)), span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.expect(TokenKind::RParen)?;
                let span = self.span_from(start);
                Ok(self.make_expr(ExprKind::Paren(Box::new(inner)), span))
            }
            TokenKind::LBracket | TokenKind::Map | TokenKind::Func | TokenKind::Struct | TokenKind::Interface => {
                self.parse_type_literal()
            }
            _ => {
                self.diagnostics.emit(SyntaxError::ExpectedType.at_with_message(
                    self.current.span,
                    format!("expected type, found {}", self.current.kind),
                ));
                Err(())
            }
        }
    }

    /// `[]T`, `[N]T`, `map[K]V`, `func(...)`, `struct{...}`, `interface{...}`.
    pub(super) fn parse_type_literal(&mut self) -> ParseResult<Expr> {
        let start = self.current.span.start;
        let kind = match self.current.kind {
            TokenKind::LBracket => {
                self.advance();
                let len = if self.eat(TokenKind::RBracket) {
                    None
                } else {
                    let len = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    Some(len)
                };
                let elem = self.parse_type()?;
                ExprKind::ArrayType(Box::new(ArrayTypeExpr { len, elem }))
            }
            TokenKind::Map => {
                self.advance();
                self.expect(TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.expect(TokenKind::RBracket)?;
                let value = self.parse_type()?;
                ExprKind::MapType(Box::new(MapTypeExpr { key, value }))
            }
            TokenKind::Func => {
                self.advance();
                ExprKind::FuncType(Box::new(self.parse_signature()?))
            }
            TokenKind::Struct => {
                self.advance();
                ExprKind::StructType(Box::new(self.parse_struct_body()?))
            }
            TokenKind::Interface => {
                self.advance();
                ExprKind::InterfaceType(Box::new(self.parse_interface_body()?))
            }
            _ => {
                self.error_expected("type");
                return Err(());
            }
        };
        let span = self.span_from(start);
        Ok(self.make_expr(kind, span))
    }

    fn parse_type_list(&mut self, close: TokenKind) -> ParseResult<Vec<Expr>> {
        let mut list = Vec::new();
        while !self.at(close) && !self.at_eof() {
            list.push(self.parse_type()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(list)
    }

    /// Parameters and optional results, after `func` or a function name.
    pub(super) fn parse_signature(&mut self) -> ParseResult<FuncTypeExpr> {
        let params = self.parse_params()?;
        let results = if self.at(TokenKind::LParen) {
            self.parse_params()?
        } else if self.starts_type() {
            let ty = self.parse_type()?;
            let span = ty.span;
            vec![Param {
                name: None,
                ty,
                variadic: false,
                span,
            }]
        } else {
            Vec::new()
        };
        Ok(FuncTypeExpr { params, results })
    }

    /// `( [name] [...]Type, ... )`
    pub(super) fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(TokenKind::LParen)?;
        let mut entries = Vec::new();
        while !self.at(TokenKind::RParen) && !self.at_eof() {
            let start = self.current.span.start;
            let entry = self.parse_param_entry()?;
            entries.push((entry, self.span_from(start)));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(self.group_params(entries))
    }

    fn parse_param_entry(&mut self) -> ParseResult<Entry> {
        if self.eat(TokenKind::Ellipsis) {
            return Ok(Entry::Type(self.parse_type()?, true));
        }
        if !self.at(TokenKind::Ident) {
            return Ok(Entry::Type(self.parse_type()?, false));
        }
        match self.peek.kind {
            TokenKind::Dot => Ok(Entry::Type(self.parse_type()?, false)),
            TokenKind::Comma | TokenKind::RParen => Ok(Entry::Bare(self.parse_ident()?)),
            TokenKind::LBracket => {
                let ident = self.parse_ident()?;
                match self.parse_bracket_after_ident(ident)? {
                    (Some(name), ty) => Ok(Entry::Named(name, ty, false)),
                    (None, ty) => Ok(Entry::Type(ty, false)),
                }
            }
            _ => {
                let name = self.parse_ident()?;
                let variadic = self.eat(TokenKind::Ellipsis);
                Ok(Entry::Named(name, self.parse_type()?, variadic))
            }
        }
    }

    /// Disambiguates `name []T`, `name [N]T` and `Generic[A, B]` after an
    /// identifier followed by `[`.
    ///
    /// Returns the name when the identifier names a parameter or field.
    fn parse_bracket_after_ident(&mut self, ident: Ident) -> ParseResult<(Option<Ident>, Expr)> {
        let lbrack = self.expect(TokenKind::LBracket)?;
        if self.eat(TokenKind::RBracket) {
            let elem = self.parse_type()?;
            let span = self.span_from(lbrack.span.start);
            let ty = self.make_expr(ExprKind::ArrayType(Box::new(ArrayTypeExpr { len: None, elem })), span);
            return Ok((Some(ident), ty));
        }
        let mut list = self.parse_expr_list()?;
        self.expect(TokenKind::RBracket)?;
        if list.len() == 1 && self.starts_type() {
            let elem = self.parse_type()?;
            let span = self.span_from(lbrack.span.start);
            let len = list.pop();
            let ty = self.make_expr(ExprKind::ArrayType(Box::new(ArrayTypeExpr { len, elem })), span);
            return Ok((Some(ident), ty));
        }
        let base = self.ident_expr(ident);
        let span = self.span_from(ident.span.start);
        let ty = self.make_expr(ExprKind::Index(Box::new(IndexExpr { expr: base, indices: list })), span);
        Ok((None, ty))
    }

    fn group_params(&mut self, entries: Vec<(Entry, Span)>) -> Vec<Param> {
        let named = entries.iter().any(|(e, _)| matches!(e, Entry::Named(..)));
        let mut params = Vec::with_capacity(entries.len());
        if !named {
            for (entry, span) in entries {
                let (ty, variadic) = match entry {
                    Entry::Bare(ident) => (self.ident_expr(ident), false),
                    Entry::Type(ty, variadic) => (ty, variadic),
                    Entry::Named(..) => unreachable!(),
                };
                params.push(Param { name: None, ty, variadic, span });
            }
            return params;
        }

        let mut pending: Vec<(Ident, Span)> = Vec::new();
        for (entry, span) in entries {
            match entry {
                Entry::Bare(ident) => pending.push((ident, span)),
                Entry::Named(name, ty, variadic) => {
                    for (p, pspan) in pending.drain(..) {
                        params.push(Param {
                            name: Some(p),
                            ty: ty.clone(),
                            variadic,
                            span: pspan,
                        });
                    }
                    params.push(Param {
                        name: Some(name),
                        ty,
                        variadic,
                        span,
                    });
                }
                Entry::Type(ty, _) => {
                    self.diagnostics.emit(SyntaxError::MixedNamedParams.at(ty.span));
                }
            }
        }
        if let Some((ident, _)) = pending.first() {
            self.diagnostics.emit(SyntaxError::MixedNamedParams.at(ident.span));
        }
        params
    }

    fn parse_struct_body(&mut self) -> ParseResult<StructTypeExpr> {
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            fields.push(self.parse_field_decl()?);
            self.expect_semi_in_group(TokenKind::RBrace);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(StructTypeExpr { fields })
    }

    fn parse_field_decl(&mut self) -> ParseResult<FieldDecl> {
        let start = self.current.span.start;
        if !self.at(TokenKind::Ident) {
            // *T or another embedded type
            let ty = self.parse_type()?;
            return Ok(self.field(Vec::new(), ty, start));
        }
        match self.peek.kind {
            TokenKind::Dot | TokenKind::Semicolon | TokenKind::RBrace => {
                let ty = self.parse_type()?;
                Ok(self.field(Vec::new(), ty, start))
            }
            TokenKind::LBracket => {
                let ident = self.parse_ident()?;
                match self.parse_bracket_after_ident(ident)? {
                    (Some(name), ty) => Ok(self.field(vec![name], ty, start)),
                    (None, ty) => Ok(self.field(Vec::new(), ty, start)),
                }
            }
            _ => {
                let mut names = vec![self.parse_ident()?];
                while self.eat(TokenKind::Comma) {
                    names.push(self.parse_ident()?);
                }
                let ty = self.parse_type()?;
                Ok(self.field(names, ty, start))
            }
        }
    }

    fn field(&self, names: Vec<Ident>, ty: Expr, start: BytePos) -> FieldDecl {
        FieldDecl {
            names,
            ty,
            span: self.span_from(start),
        }
    }

    fn parse_interface_body(&mut self) -> ParseResult<InterfaceTypeExpr> {
        self.expect(TokenKind::LBrace)?;
        let mut elems = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let start = self.current.span.start;
            if self.at(TokenKind::Ident) && self.peek_is(TokenKind::LParen) {
                let name = self.parse_ident()?;
                let sig = self.parse_signature()?;
                elems.push(InterfaceElem::Method {
                    name,
                    sig,
                    span: self.span_from(start),
                });
            } else {
                elems.push(InterfaceElem::Embedded(self.parse_type()?));
            }
            self.expect_semi_in_group(TokenKind::RBrace);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(InterfaceTypeExpr { elems })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse;
    use crate::ast::*;
    use crate::errors::SyntaxError;

    fn var_type(file: &File, i: usize) -> &Expr {
        match &file.decls[i] {
            Decl::Var(spec) => spec.ty.as_ref().unwrap(),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_grouped_param_names() {
        let (file, diags, interner) = parse("package p\nvar f func(a, b int, rest ...string) (n int, err error)\n");
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let ExprKind::FuncType(sig) = &var_type(&file, 0).kind else {
            panic!("expected func type")
        };
        assert_eq!(sig.params.len(), 3);
        assert_eq!(interner.resolve(sig.params[1].name.unwrap().symbol), Some("b"));
        assert!(sig.params[2].variadic);
        assert_eq!(sig.results.len(), 2);
    }

    #[test]
    fn test_unnamed_params_and_single_result() {
        let (file, diags, _) = parse("package p\nvar f func(int, List[string]) error\n");
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let ExprKind::FuncType(sig) = &var_type(&file, 0).kind else {
            panic!("expected func type")
        };
        assert!(sig.params.iter().all(|p| p.name.is_none()));
        assert!(matches!(sig.params[1].ty.kind, ExprKind::Index(_)));
        assert_eq!(sig.results.len(), 1);
    }

    #[test]
    fn test_named_slice_param() {
        let (file, diags, _) = parse("package p\nvar f func(xs []int, a [4]byte)\n");
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let ExprKind::FuncType(sig) = &var_type(&file, 0).kind else {
            panic!("expected func type")
        };
        assert!(sig.params.iter().all(|p| p.name.is_some()));
        assert!(matches!(sig.params[1].ty.kind, ExprKind::ArrayType(_)));
    }

    #[test]
    fn test_mixed_named_params() {
        let (_, diags, _) = parse("package p\nvar f func(a int, string)\n");
        assert_eq!(diags.diagnostics()[0].code, Some(SyntaxError::MixedNamedParams.code()));
    }

    #[test]
    fn test_struct_fields_and_embedding() {
        let (file, diags, _) = parse(
            "package p\ntype T struct {\n\tBase\n\t*Other\n\tpkg.Ext\n\tBox[int]\n\tx, y int\n\tzs []string\n}\n",
        );
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Decl::Type(spec) = &file.decls[0] else { panic!() };
        let ExprKind::StructType(st) = &spec.ty.kind else { panic!() };
        let embedded: Vec<bool> = st.fields.iter().map(|f| f.is_embedded()).collect();
        assert_eq!(embedded, vec![true, true, true, true, false, false]);
        assert_eq!(st.fields[4].names.len(), 2);
    }

    #[test]
    fn test_interface_methods_and_embeds() {
        let (file, diags, _) = parse("package p\ntype I interface {\n\tfmt.Stringer\n\tRead(p []byte) (int, error)\n}\n");
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Decl::Type(spec) = &file.decls[0] else { panic!() };
        let ExprKind::InterfaceType(it) = &spec.ty.kind else { panic!() };
        assert!(matches!(it.elems[0], InterfaceElem::Embedded(_)));
        assert!(matches!(it.elems[1], InterfaceElem::Method { .. }));
    }
}
