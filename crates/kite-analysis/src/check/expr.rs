//! Expression evaluation.
//!
//! Every expression is evaluated into an [`Operand`]. Untyped results are
//! remembered until the context they are used in gives them a type; all
//! other results are recorded right away.

use kite_common::span::Span;
use kite_syntax::ast::{BasicLit, Expr, ExprKind, Ident, IndexExpr, LitKind, TypeAssertExpr, UnaryExpr, UnaryOp};

use super::checker::DeclState;
use super::errors::TypeError;
use super::Checker;
use crate::constant::{self, Value};
use crate::obj::EntityType;
use crate::objects::TypeKey;
use crate::operand::{Operand, OperandMode};
use crate::scope::Scope;
use crate::typ::{self, BasicType, Type};

/// Operand modes rejected by [`Checker::exclude`].
pub(crate) const NOVALUE: u8 = 1;
pub(crate) const BUILTIN: u8 = 1 << 1;
pub(crate) const TYPEXPR: u8 = 1 << 2;

impl<'a> Checker<'a> {
    /// Evaluates `e` and records its type and value.
    pub(crate) fn raw_expr(&mut self, x: &mut Operand<'a>, e: &'a Expr) {
        self.trace_begin(e);
        self.expr_internal(x, e);

        let t = match x.mode {
            OperandMode::Invalid => self.invalid_type(),
            OperandMode::NoValue => x.typ.unwrap_or_else(|| self.tc_objs.universe().no_value_tuple()),
            _ => self.typ_of(x),
        };
        if typ::is_untyped(t, self.tc_objs) {
            self.remember_untyped(e, x.mode.clone(), t);
        } else {
            self.record_type_and_value(e, x.mode.clone(), t);
        }
        self.trace_end(x);
    }

    fn expr_internal(&mut self, x: &mut Operand<'a>, e: &'a Expr) {
        x.mode = OperandMode::Invalid;
        x.typ = Some(self.invalid_type());

        match &e.kind {
            ExprKind::Bad => {}
            ExprKind::Ident(ident) => self.ident(x, e, ident, false),
            ExprKind::BasicLit(lit) => self.basic_lit(x, e, lit),
            ExprKind::Paren(inner) => self.raw_expr(x, inner),
            ExprKind::Selector(sel) => self.selector(x, e, sel),
            ExprKind::Call(call) => self.call(x, e, call),
            ExprKind::Index(index) => {
                if self.index_expr(x, e, index) {
                    self.func_inst(x, e, index);
                }
            }
            ExprKind::TypeAssert(assert) => self.type_assert(x, assert),
            ExprKind::Unary(unary) => self.unary(x, unary),
            ExprKind::Star(base) => self.star(x, base),
            ExprKind::ArrayType(_)
            | ExprKind::MapType(_)
            | ExprKind::FuncType(_)
            | ExprKind::StructType(_)
            | ExprKind::InterfaceType(_) => {
                x.typ = Some(self.typ(e));
                x.mode = OperandMode::TypeExpr;
            }
        }
        if x.mode == OperandMode::Invalid {
            x.typ = Some(self.invalid_type());
        }
        x.expr = Some(e);
    }

    // ------------------------------------------------------------------------
    // Operand filters

    /// Evaluates `e` into a single value.
    pub(crate) fn expr(&mut self, x: &mut Operand<'a>, e: &'a Expr) {
        self.raw_expr(x, e);
        self.exclude(x, NOVALUE | BUILTIN | TYPEXPR);
        self.single_value(x);
    }

    /// Like `expr`, but a call may produce several values.
    pub(crate) fn multi_expr(&mut self, x: &mut Operand<'a>, e: &'a Expr) {
        self.raw_expr(x, e);
        self.exclude(x, NOVALUE | BUILTIN | TYPEXPR);
    }

    /// Evaluates `e` into a single value or a type.
    pub(crate) fn expr_or_type(&mut self, x: &mut Operand<'a>, e: &'a Expr) {
        self.raw_expr(x, e);
        self.exclude(x, NOVALUE);
        self.single_value(x);
    }

    pub(crate) fn multi_expr_or_type(&mut self, x: &mut Operand<'a>, e: &'a Expr) {
        self.raw_expr(x, e);
        self.exclude(x, NOVALUE | BUILTIN);
    }

    /// Evaluates expressions only for their side effects on recorded uses,
    /// typically after an error made their values irrelevant.
    pub(crate) fn use_exprs(&mut self, list: &'a [Expr]) {
        for e in list {
            let mut x = Operand::new();
            self.raw_expr(&mut x, e);
        }
    }

    /// Invalidates `x` if its mode is in `modeset`.
    pub(crate) fn exclude(&mut self, x: &mut Operand<'a>, modeset: u8) {
        let (bit, msg) = match x.mode {
            OperandMode::NoValue => (
                NOVALUE,
                if modeset & TYPEXPR != 0 {
                    (TypeError::UsedAsValue, "used as value")
                } else {
                    (TypeError::UsedAsValue, "used as value or type")
                },
            ),
            OperandMode::Builtin(_) => (BUILTIN, (TypeError::MustBeCalled, "must be called")),
            OperandMode::TypeExpr => (TYPEXPR, (TypeError::NotAnExpression, "is not an expression")),
            _ => return,
        };
        if modeset & bit == 0 {
            return;
        }
        let (code, what) = msg;
        let msg = format!("{} {}", self.op_str(x), what);
        self.error(code, self.op_span(x), msg);
        x.mode = OperandMode::Invalid;
    }

    /// Rejects multi-valued operands.
    pub(crate) fn single_value(&mut self, x: &mut Operand<'a>) {
        if x.mode != OperandMode::Value {
            return;
        }
        let n = match x.typ.and_then(|t| self.tc_objs.types[t].try_as_tuple()) {
            Some(tuple) => tuple.vars.len(),
            None => return,
        };
        let msg = format!("{}-valued {} where single value is expected", n, self.op_str(x));
        self.error(TypeError::MultiValueInSingleContext, self.op_span(x), msg);
        x.mode = OperandMode::Invalid;
    }

    // ------------------------------------------------------------------------
    // Identifiers and literals

    /// Resolves an identifier. `want_type` is set when the identifier is
    /// evaluated as a type.
    pub(crate) fn ident(&mut self, x: &mut Operand<'a>, e: &'a Expr, ident: &'a Ident, want_type: bool) {
        x.mode = OperandMode::Invalid;
        x.expr = Some(e);
        x.typ = Some(self.invalid_type());

        let name = self.name(ident.symbol);
        if name == "_" {
            self.error(TypeError::BlankAsValue, ident.span, "cannot use _ as value");
            return;
        }
        let obj = match Scope::lookup_parent(self.current_scope(), name, self.tc_objs) {
            Some((_, obj)) => obj,
            None => {
                self.error(TypeError::Undefined, ident.span, format!("undeclared name: {}", name));
                return;
            }
        };
        self.record_use(ident, obj);

        let is_type_name = self.tc_objs.lobjs[obj].entity_type().is_type_name();
        let in_progress = self.decl_state(obj) == DeclState::InProgress;
        if self.tc_objs.lobjs[obj].typ().is_none() || (is_type_name && want_type) || in_progress {
            self.obj_decl(obj);
        }
        // a function used in its own signature, reported as a cycle
        if in_progress && self.tc_objs.lobjs[obj].entity_type().is_func() {
            return;
        }
        let t = self.obj_type(obj);
        let invalid = t == self.invalid_type();

        match self.tc_objs.lobjs[obj].entity_type().clone() {
            EntityType::PkgName { .. } => {
                let msg = format!("use of package {} not in selector", name);
                self.error(TypeError::UseOfPackageName, ident.span, msg);
                return;
            }
            EntityType::Const { val } => {
                if invalid {
                    return;
                }
                let val = if obj == self.tc_objs.universe().iota() {
                    match &self.octx.iota {
                        Some(iota) => iota.clone(),
                        None => {
                            self.error(
                                TypeError::IotaOutsideConst,
                                ident.span,
                                "cannot use iota outside constant declaration",
                            );
                            return;
                        }
                    }
                } else {
                    val
                };
                x.mode = OperandMode::Constant(val);
            }
            EntityType::TypeName => x.mode = OperandMode::TypeExpr,
            EntityType::Var(_) => {
                if self.tc_objs.lobjs[obj].pkg() == Some(self.pkg) {
                    self.tc_objs.lobjs[obj].set_var_used();
                }
                if invalid {
                    return;
                }
                x.mode = OperandMode::Variable;
            }
            EntityType::Func { .. } | EntityType::Nil => x.mode = OperandMode::Value,
            EntityType::Builtin(id) => x.mode = OperandMode::Builtin(id),
        }
        x.typ = Some(t);
    }

    fn basic_lit(&mut self, x: &mut Operand<'a>, e: &'a Expr, lit: &BasicLit) {
        let kind = match lit.kind {
            LitKind::Int => BasicType::UntypedInt,
            LitKind::Float => BasicType::UntypedFloat,
            LitKind::Rune => BasicType::UntypedRune,
            LitKind::String => BasicType::UntypedString,
        };
        match Value::from_literal(lit.kind, &lit.raw) {
            Some(val) => {
                x.mode = OperandMode::Constant(val);
                x.typ = Some(self.basic_type(kind));
            }
            None => {
                self.error(TypeError::InvalidOp, e.span, format!("malformed constant: {}", lit.raw));
            }
        }
    }

    // ------------------------------------------------------------------------
    // Unary expressions

    fn star(&mut self, x: &mut Operand<'a>, base: &'a Expr) {
        self.expr_or_type(x, base);
        match x.mode {
            OperandMode::Invalid => {}
            OperandMode::TypeExpr => {
                let base_t = self.typ_of(x);
                x.typ = Some(self.tc_objs.new_t_pointer(base_t));
            }
            _ => match self.tc_objs.types[typ::underlying_type(self.typ_of(x), self.tc_objs)].try_as_pointer() {
                Some(elem) => {
                    x.mode = OperandMode::Variable;
                    x.typ = Some(elem);
                }
                None => {
                    let msg = format!("invalid operation: cannot indirect {}", self.op_str(x));
                    self.error(TypeError::CannotIndirect, self.op_span(x), msg);
                    x.mode = OperandMode::Invalid;
                }
            },
        }
    }

    fn unary(&mut self, x: &mut Operand<'a>, u: &'a UnaryExpr) {
        self.expr(x, &u.operand);
        if x.invalid() {
            return;
        }

        if u.op == UnaryOp::Addr {
            if x.mode != OperandMode::Variable {
                let msg = format!("invalid operation: cannot take address of {}", self.op_str(x));
                self.error(TypeError::CannotTakeAddress, self.op_span(x), msg);
                x.mode = OperandMode::Invalid;
                return;
            }
            let base = self.typ_of(x);
            x.mode = OperandMode::Value;
            x.typ = Some(self.tc_objs.new_t_pointer(base));
            return;
        }

        let t = self.typ_of(x);
        let ok = match u.op {
            UnaryOp::Neg | UnaryOp::Pos => typ::is_numeric(t, self.tc_objs),
            UnaryOp::Not => typ::is_boolean(t, self.tc_objs),
            UnaryOp::Addr => unreachable!(),
        };
        if !ok {
            let msg = format!("invalid operation: operator {} not defined on {}", u.op.as_str(), self.op_str(x));
            self.error(TypeError::InvalidOp, self.op_span(x), msg);
            x.mode = OperandMode::Invalid;
            return;
        }

        if let OperandMode::Constant(val) = &x.mode {
            if val.is_unknown() {
                return;
            }
            let folded = constant::unary_op(u.op, val);
            x.mode = OperandMode::Constant(folded);
            self.overflow(x);
            return;
        }
        x.mode = OperandMode::Value;
    }

    /// Typed constants must stay representable by their type.
    fn overflow(&mut self, x: &mut Operand<'a>) {
        let t = self.typ_of(x);
        if typ::is_typed(t, self.tc_objs) {
            if let Some(b) = typ::underlying_basic(t, self.tc_objs) {
                self.representable(x, b);
            }
        }
    }

    /// Checks that the constant `x` is representable by `b`, rounding its
    /// value. Invalidates `x` otherwise.
    pub(crate) fn representable(&mut self, x: &mut Operand<'a>, b: BasicType) {
        let val = match &x.mode {
            OperandMode::Constant(val) => val,
            _ => return,
        };
        match val.representable(b) {
            Some(rounded) => x.mode = OperandMode::Constant(rounded),
            None => {
                let xt = self.typ_of(x);
                let target = self.basic_type(b);
                let msg = if typ::is_numeric(xt, self.tc_objs) && b.is_numeric() {
                    if !typ::is_integer(xt, self.tc_objs) && b.is_integer() {
                        format!("{} truncated to {}", self.op_str(x), self.type_str(target))
                    } else {
                        format!("{} overflows {}", self.op_str(x), self.type_str(target))
                    }
                } else {
                    format!("cannot convert {} to {}", self.op_str(x), self.type_str(target))
                };
                self.error(TypeError::Overflow, self.op_span(x), msg);
                x.mode = OperandMode::Invalid;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Untyped operands

    /// Gives the remembered untyped expression `e` the type `t`. Final types
    /// are recorded; intermediate untyped types only update the memo.
    pub(crate) fn update_expr_type(&mut self, e: &'a Expr, t: TypeKey, final_type: bool) {
        let old = match self.untyped.get(&e.id) {
            Some(info) => info.clone(),
            None => return,
        };
        if let ExprKind::Paren(inner) = &e.kind {
            self.update_expr_type(inner, t, final_type);
        }
        if !final_type && typ::is_untyped(t, self.tc_objs) {
            if let Some(info) = self.untyped.get_mut(&e.id) {
                info.typ = t;
            }
            return;
        }
        self.untyped.remove(&e.id);
        self.record_type_and_value(e, old.mode, t);
    }

    /// Converts an untyped operand to `target`, or to the default type when
    /// the target is an interface.
    pub(crate) fn convert_untyped(&mut self, x: &mut Operand<'a>, target: TypeKey) {
        let xt = self.typ_of(x);
        if x.invalid() || typ::is_typed(xt, self.tc_objs) || target == self.invalid_type() {
            return;
        }

        if typ::is_untyped(target, self.tc_objs) {
            let (xk, tk) = match (
                self.tc_objs.types[xt].try_as_basic(),
                self.tc_objs.types[target].try_as_basic(),
            ) {
                (Some(xk), Some(tk)) => (xk, tk),
                _ => return,
            };
            if xk.is_numeric() && tk.is_numeric() {
                if xk < tk {
                    x.typ = Some(target);
                    if let Some(e) = x.expr {
                        self.update_expr_type(e, target, false);
                    }
                }
            } else if xk != tk {
                self.convert_error(x, target);
            }
            return;
        }

        let tu = typ::underlying_type(target, self.tc_objs);
        let final_target = match self.tc_objs.types[tu].clone() {
            Type::Basic(b) => {
                if x.mode.constant_val().is_some() {
                    self.representable(x, b);
                    if x.invalid() {
                        return;
                    }
                } else {
                    let ok = match self.tc_objs.types[xt].try_as_basic() {
                        Some(BasicType::UntypedBool) => b.is_boolean(),
                        Some(BasicType::UntypedInt | BasicType::UntypedRune | BasicType::UntypedFloat) => {
                            b.is_numeric()
                        }
                        Some(BasicType::UntypedString) => b.is_string(),
                        Some(BasicType::UntypedNil) => typ::has_nil(target, self.tc_objs),
                        _ => false,
                    };
                    if !ok {
                        self.convert_error(x, target);
                        return;
                    }
                }
                target
            }
            Type::Interface(_) => {
                if x.is_nil(self.tc_objs) {
                    self.basic_type(BasicType::UntypedNil)
                } else if typ::is_empty_interface(tu, self.tc_objs) {
                    typ::untyped_default_type(xt, self.tc_objs)
                } else {
                    self.convert_error(x, target);
                    return;
                }
            }
            Type::Pointer(_) | Type::Signature(_) | Type::Slice(_) | Type::Map(_) => {
                if !x.is_nil(self.tc_objs) {
                    self.convert_error(x, target);
                    return;
                }
                // nil stays untyped
                self.basic_type(BasicType::UntypedNil)
            }
            _ => {
                self.convert_error(x, target);
                return;
            }
        };
        x.typ = Some(final_target);
        if let Some(e) = x.expr {
            self.update_expr_type(e, final_target, true);
        }
    }

    fn convert_error(&mut self, x: &mut Operand<'a>, target: TypeKey) {
        let msg = format!("cannot convert {} to {}", self.op_str(x), self.type_str(target));
        self.error(TypeError::InvalidConversion, self.op_span(x), msg);
        x.mode = OperandMode::Invalid;
    }

    // ------------------------------------------------------------------------
    // Index expressions and type assertions

    /// Evaluates `x[i]`. Returns true if `x` is a generic function and the
    /// expression is an instantiation; `x` is left as the function then.
    fn index_expr(&mut self, x: &mut Operand<'a>, e: &'a Expr, ix: &'a IndexExpr) -> bool {
        self.expr_or_type(x, &ix.expr);
        if x.invalid() {
            self.use_exprs(&ix.indices);
            return false;
        }

        if x.mode == OperandMode::TypeExpr {
            // List[int]
            let t = self.typ(e);
            x.mode = if t == self.invalid_type() {
                OperandMode::Invalid
            } else {
                OperandMode::TypeExpr
            };
            x.typ = Some(t);
            return false;
        }

        let xt = self.typ_of(x);
        let generic_func = self.tc_objs.types[typ::underlying_type(xt, self.tc_objs)]
            .try_as_signature()
            .map_or(false, |sig| !sig.tparams.is_empty());
        if x.mode == OperandMode::Value && generic_func {
            return true;
        }

        let index = match ix.indices.as_slice() {
            [index] => index,
            [] => {
                let msg = format!("invalid operation: missing index for {}", self.op_str(x));
                self.error(TypeError::InvalidIndex, e.span, msg);
                x.mode = OperandMode::Invalid;
                return false;
            }
            [_, extra, ..] => {
                self.error(TypeError::InvalidIndex, extra.span, "invalid operation: more than one index");
                self.use_exprs(&ix.indices);
                x.mode = OperandMode::Invalid;
                return false;
            }
        };

        let mut valid = false;
        let mut length = None;
        let under = typ::underlying_type(xt, self.tc_objs);
        match self.tc_objs.types[under].clone() {
            Type::Basic(b) if b.is_string() => {
                valid = true;
                if let Some(s) = x.mode.constant_val().and_then(|v| v.str_val()) {
                    length = Some(s.len() as u64);
                }
                // an indexed string is a byte value, even for constants
                x.mode = OperandMode::Value;
                x.typ = Some(self.tc_objs.universe().byte());
            }
            Type::Array(a) => {
                valid = true;
                length = a.len;
                if x.mode != OperandMode::Variable {
                    x.mode = OperandMode::Value;
                }
                x.typ = Some(a.elem);
            }
            Type::Pointer(base) => {
                let base_u = typ::underlying_type(base, self.tc_objs);
                if let Some(a) = self.tc_objs.types[base_u].try_as_array() {
                    valid = true;
                    length = a.len;
                    x.mode = OperandMode::Variable;
                    x.typ = Some(a.elem);
                }
            }
            Type::Slice(elem) => {
                valid = true;
                x.mode = OperandMode::Variable;
                x.typ = Some(elem);
            }
            Type::Map(m) => {
                let mut key = Operand::new();
                self.expr(&mut key, index);
                self.assignment(&mut key, Some(m.key), "map index");
                x.mode = OperandMode::MapIndex;
                x.typ = Some(m.elem);
                return false;
            }
            _ => {}
        }

        if !valid {
            let msg = format!("invalid operation: cannot index {}", self.op_str(x));
            self.error(TypeError::CannotIndex, self.op_span(x), msg);
            self.use_exprs(&ix.indices);
            x.mode = OperandMode::Invalid;
            return false;
        }
        self.index(index, length);
        false
    }

    /// Checks an index value against an optional length. Returns whether the
    /// index is usable and its value if constant.
    pub(crate) fn index(&mut self, e: &'a Expr, max: Option<u64>) -> (bool, Option<i64>) {
        let mut x = Operand::new();
        self.expr(&mut x, e);
        if x.invalid() {
            return (false, None);
        }
        let int = self.basic_type(BasicType::Int);
        self.convert_untyped(&mut x, int);
        if x.invalid() {
            return (false, None);
        }
        if !typ::is_integer(self.typ_of(&x), self.tc_objs) {
            let msg = format!("invalid argument: index {} must be integer", self.op_str(&x));
            self.error(TypeError::InvalidIndex, e.span, msg);
            return (false, None);
        }
        let val = match x.mode.constant_val() {
            Some(val) => val.clone(),
            None => return (true, None),
        };
        if val.is_negative() {
            let msg = format!("invalid argument: index {} must not be negative", self.op_str(&x));
            self.error(TypeError::InvalidIndex, e.span, msg);
            return (false, None);
        }
        match val.to_int().int64_val() {
            Some(v) if max.map_or(true, |max| (v as u64) < max) => (true, Some(v)),
            _ => {
                let msg = format!("invalid argument: index {} is out of bounds", self.op_str(&x));
                self.error(TypeError::InvalidIndex, e.span, msg);
                (false, None)
            }
        }
    }

    /// `f[int, string]`: explicit instantiation of a generic function.
    fn func_inst(&mut self, x: &mut Operand<'a>, e: &'a Expr, ix: &'a IndexExpr) {
        let targs = match self.type_list(&ix.indices) {
            Some(targs) => targs,
            None => {
                x.mode = OperandMode::Invalid;
                return;
            }
        };
        let sig_t = typ::underlying_type(self.typ_of(x), self.tc_objs);
        let tparams = match self.tc_objs.types[sig_t].try_as_signature() {
            Some(sig) => sig.tparams.clone(),
            None => unreachable!("function instantiation of a non-signature"),
        };

        let (got, want) = (targs.len(), tparams.len());
        if got > want {
            let msg = format!("got {} type arguments but want {}", got, want);
            self.error(TypeError::WrongTypeArgCount, ix.indices[want].span, msg);
            x.mode = OperandMode::Invalid;
            return;
        }
        if got < want {
            let msg = format!("cannot infer {}", self.tc_objs.lobjs[tparams[got]].name());
            self.error(TypeError::CannotInfer, e.span, msg);
            x.mode = OperandMode::Invalid;
            return;
        }

        let spans: Vec<Span> = ix.indices.iter().map(|a| a.span).collect();
        let inst = self.instantiate(e.span, sig_t, &targs, &spans);
        self.record_inferred(e, targs, inst);
        x.mode = OperandMode::Value;
        x.typ = Some(inst);
    }

    fn type_assert(&mut self, x: &mut Operand<'a>, assert: &'a TypeAssertExpr) {
        self.expr(x, &assert.expr);
        if x.invalid() {
            return;
        }
        let xt = self.typ_of(x);
        let is_iface = self.tc_objs.types[xt].try_as_type_param().is_none() && typ::is_interface(xt, self.tc_objs);
        if !is_iface {
            let msg = format!("invalid operation: {} is not an interface", self.op_str(x));
            self.error(TypeError::NonInterfaceAssert, self.op_span(x), msg);
            x.mode = OperandMode::Invalid;
            return;
        }
        let t = self.typ(&assert.ty);
        if t == self.invalid_type() {
            x.mode = OperandMode::Invalid;
            return;
        }
        if let Some((m, wrong)) = self.assertable_to(xt, t) {
            let msg = format!(
                "impossible type assertion: {} cannot have dynamic type {} ({} {})",
                self.expr_str(&assert.expr),
                self.type_str(t),
                if wrong { "wrong type for method" } else { "missing method" },
                self.tc_objs.lobjs[m].name()
            );
            self.error(TypeError::ImpossibleAssert, assert.ty.span, msg);
        }
        x.mode = OperandMode::CommaOk;
        x.typ = Some(t);
    }
}
