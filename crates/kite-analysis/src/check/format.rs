//! Source-like rendering of expressions for diagnostics.

use std::fmt::Write;

use kite_common::symbol::SymbolInterner;
use kite_syntax::ast::{Expr, ExprKind, FuncTypeExpr, InterfaceElem, Param};

pub fn expr_string(e: &Expr, interner: &SymbolInterner) -> String {
    let mut out = String::new();
    write_expr(&mut out, e, interner);
    out
}

fn write_expr(out: &mut String, e: &Expr, interner: &SymbolInterner) {
    let name = |ident: &kite_syntax::ast::Ident| interner.resolve(ident.symbol).unwrap_or("_").to_string();
    match &e.kind {
        ExprKind::Bad => out.push_str("BadExpr"),
        ExprKind::Ident(ident) => out.push_str(&name(ident)),
        ExprKind::BasicLit(lit) => out.push_str(&lit.raw),
        ExprKind::Paren(inner) => {
            out.push('(');
            write_expr(out, inner, interner);
            out.push(')');
        }
        ExprKind::Selector(sel) => {
            write_expr(out, &sel.expr, interner);
            out.push('.');
            out.push_str(&name(&sel.sel));
        }
        ExprKind::Call(call) => {
            write_expr(out, &call.func, interner);
            out.push('(');
            write_list(out, &call.args, interner);
            if call.spread {
                out.push_str("...");
            }
            out.push(')');
        }
        ExprKind::Index(index) => {
            write_expr(out, &index.expr, interner);
            out.push('[');
            write_list(out, &index.indices, interner);
            out.push(']');
        }
        ExprKind::TypeAssert(assert) => {
            write_expr(out, &assert.expr, interner);
            out.push_str(".(");
            write_expr(out, &assert.ty, interner);
            out.push(')');
        }
        ExprKind::Unary(unary) => {
            out.push_str(unary.op.as_str());
            write_expr(out, &unary.operand, interner);
        }
        ExprKind::Star(inner) => {
            out.push('*');
            write_expr(out, inner, interner);
        }
        ExprKind::ArrayType(array) => {
            out.push('[');
            if let Some(len) = &array.len {
                write_expr(out, len, interner);
            }
            out.push(']');
            write_expr(out, &array.elem, interner);
        }
        ExprKind::MapType(map) => {
            out.push_str("map[");
            write_expr(out, &map.key, interner);
            out.push(']');
            write_expr(out, &map.value, interner);
        }
        ExprKind::FuncType(sig) => {
            out.push_str("func");
            write_sig(out, sig, interner);
        }
        ExprKind::StructType(st) => {
            out.push_str("struct{");
            for (i, field) in st.fields.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                for (j, n) in field.names.iter().enumerate() {
                    if j > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&name(n));
                }
                if !field.names.is_empty() {
                    out.push(' ');
                }
                write_expr(out, &field.ty, interner);
            }
            out.push('}');
        }
        ExprKind::InterfaceType(iface) => {
            out.push_str("interface{");
            for (i, elem) in iface.elems.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                match elem {
                    InterfaceElem::Method { name: m, sig, .. } => {
                        out.push_str(&name(m));
                        write_sig(out, sig, interner);
                    }
                    InterfaceElem::Embedded(e) => write_expr(out, e, interner),
                }
            }
            out.push('}');
        }
    }
}

fn write_list(out: &mut String, list: &[Expr], interner: &SymbolInterner) {
    for (i, e) in list.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, e, interner);
    }
}

fn write_sig(out: &mut String, sig: &FuncTypeExpr, interner: &SymbolInterner) {
    write_params(out, &sig.params, interner);
    match sig.results.as_slice() {
        [] => {}
        [single] if single.name.is_none() => {
            out.push(' ');
            write_expr(out, &single.ty, interner);
        }
        results => {
            out.push(' ');
            write_params(out, results, interner);
        }
    }
}

fn write_params(out: &mut String, params: &[Param], interner: &SymbolInterner) {
    out.push('(');
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if let Some(n) = &p.name {
            let _ = write!(out, "{} ", interner.resolve(n.symbol).unwrap_or("_"));
        }
        if p.variadic {
            out.push_str("...");
        }
        write_expr(out, &p.ty, interner);
    }
    out.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;
    use kite_syntax::ast::{IdGen, Decl};

    fn first_value(src: &str) -> (String, SymbolInterner) {
        let mut interner = SymbolInterner::new();
        let mut ids = IdGen::new();
        let (file, diags) = kite_syntax::parse_file(src, 0, &mut interner, &mut ids);
        assert!(!diags.has_errors(), "{:?}", diags);
        let value = match &file.decls[0] {
            Decl::Var(spec) => spec.values[0].clone(),
            other => panic!("unexpected decl {:?}", other),
        };
        (expr_string(&value, &interner), interner)
    }

    #[test]
    fn test_calls_and_selectors() {
        let (s, _) = first_value("package p\nvar x = f(a, b.c...)");
        assert_eq!(s, "f(a, b.c...)");
        let (s, _) = first_value("package p\nvar x = m[k].(T)");
        assert_eq!(s, "m[k].(T)");
    }

    #[test]
    fn test_unary_and_types() {
        let (s, _) = first_value("package p\nvar x = -(1)");
        assert_eq!(s, "-(1)");
        let (s, _) = first_value("package p\nvar x = []map[string]*T(nil)");
        assert_eq!(s, "[]map[string]*T(nil)");
    }
}
