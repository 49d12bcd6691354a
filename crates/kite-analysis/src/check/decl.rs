//! Completion of package-level declarations.
//!
//! Objects are declared lazily: `obj_decl` is called for every object in
//! source order, and again whenever an expression refers to an object whose
//! type is not known yet. The declaration state of each object detects
//! cycles.

use std::collections::{HashMap, HashSet};

use kite_syntax::ast::{Expr, ExprKind, FuncDecl, TypeSpec};

use super::checker::{DeclInfo, DeclState, ObjContext};
use super::errors::TypeError;
use super::Checker;
use crate::constant;
use crate::obj::{ConstValue, EntityType};
use crate::objects::{ObjKey, TypeKey};
use crate::operand::{Operand, OperandMode};
use crate::typ::{self, Type};

impl<'a> Checker<'a> {
    /// Completes the declaration of a package-level object. Objects without
    /// a declaration (universe, imported, local) are left alone.
    pub(crate) fn obj_decl(&mut self, obj: ObjKey) {
        if !self.decls.contains_key(&obj) {
            return;
        }
        match self.decl_state(obj) {
            DeclState::Done => return,
            DeclState::InProgress => {
                self.cycle_error(obj);
                return;
            }
            DeclState::Unresolved => {}
        }
        // Variables of `var a, b = f()` get their types together.
        if self.tc_objs.lobjs[obj].typ().is_some() {
            self.decl_states.insert(obj, DeclState::Done);
            return;
        }

        let info = self.decls[&obj].clone();
        self.decl_states.insert(obj, DeclState::InProgress);
        let saved = std::mem::replace(
            &mut self.octx,
            ObjContext {
                decl: Some(obj),
                scope: Some(info.file_scope()),
                ..ObjContext::default()
            },
        );
        tracing::trace!(obj = %self.tc_objs.lobjs[obj].name(), "declaring");

        match info {
            DeclInfo::Const {
                typ, init, inherited, iota, ..
            } => self.const_decl(obj, typ, init, inherited, iota),
            DeclInfo::Var { lhs, typ, init, .. } => self.var_decl(obj, lhs, typ, init),
            DeclInfo::Type { spec, .. } => self.type_decl(obj, spec),
            DeclInfo::Func { decl, .. } => self.func_decl(obj, decl),
        }

        self.octx = saved;
        self.decl_states.insert(obj, DeclState::Done);
    }

    /// An object was reached again while its declaration was in progress.
    /// Types may refer to themselves; constants, variables and functions
    /// whose signature is being checked may not.
    fn cycle_error(&mut self, obj: ObjKey) {
        let lobj = &self.tc_objs.lobjs[obj];
        let report = match lobj.entity_type() {
            EntityType::Const { .. } | EntityType::Func { .. } => true,
            EntityType::Var(_) | EntityType::TypeName => lobj.typ().is_none(),
            _ => false,
        };
        if !report {
            return;
        }
        let (span, msg) = (lobj.span(), format!("illegal cycle in declaration of {}", lobj.name()));
        self.error(TypeError::IllegalCycle, span, msg);
        if self.tc_objs.lobjs[obj].typ().is_none() {
            let invalid = self.invalid_type();
            self.tc_objs.lobjs[obj].set_type(Some(invalid));
        }
    }

    // ------------------------------------------------------------------------
    // Constants

    fn const_decl(
        &mut self,
        obj: ObjKey,
        typ: Option<&'a Expr>,
        init: Option<&'a Expr>,
        inherited: bool,
        iota: u32,
    ) {
        self.octx.iota = Some(constant::make_int64(iota as i64));
        self.tc_objs.lobjs[obj].set_const_val(ConstValue::Unknown);

        if let Some(te) = typ {
            let t = self.typ(te);
            if !typ::is_const_type(t, self.tc_objs) {
                if t != self.invalid_type() {
                    let msg = format!("invalid constant type {}", self.type_str(t));
                    self.error(TypeError::InvalidConstType, te.span, msg);
                }
                let invalid = self.invalid_type();
                self.tc_objs.lobjs[obj].set_type(Some(invalid));
                return;
            }
            self.tc_objs.lobjs[obj].set_type(Some(t));
        }

        let mut x = Operand::new();
        if let Some(e) = init {
            if inherited {
                // Errors in a repeated initializer are reported at the
                // constant that repeats it.
                self.octx.errpos = Some(self.tc_objs.lobjs[obj].span());
            }
            self.expr(&mut x, e);
        }
        self.init_const(obj, &mut x);
    }

    fn init_const(&mut self, lhs: ObjKey, x: &mut Operand<'a>) {
        let invalid = self.invalid_type();
        let lhs_typ = self.tc_objs.lobjs[lhs].typ();
        if x.invalid() || self.typ_of(x) == invalid || lhs_typ == Some(invalid) {
            if lhs_typ.is_none() {
                self.tc_objs.lobjs[lhs].set_type(Some(invalid));
            }
            return;
        }

        if !matches!(x.mode, OperandMode::Constant(_)) {
            let msg = format!("{} is not constant", self.op_str(x));
            self.error(TypeError::NotConstant, self.op_span(x), msg);
            if lhs_typ.is_none() {
                self.tc_objs.lobjs[lhs].set_type(Some(invalid));
            }
            return;
        }

        // An untyped constant stays untyped unless a type was declared.
        let target = match lhs_typ {
            Some(t) => t,
            None => {
                let t = self.typ_of(x);
                self.tc_objs.lobjs[lhs].set_type(Some(t));
                t
            }
        };
        self.assignment(x, Some(target), "constant declaration");
        if let OperandMode::Constant(val) = &x.mode {
            self.tc_objs.lobjs[lhs].set_const_val(val.clone());
        }
    }

    // ------------------------------------------------------------------------
    // Variables

    fn var_decl(&mut self, obj: ObjKey, lhs: Option<Vec<ObjKey>>, typ: Option<&'a Expr>, init: Option<&'a Expr>) {
        if let Some(te) = typ {
            let t = self.typ(te);
            self.tc_objs.lobjs[obj].set_type(Some(t));
        }

        let init = match init {
            Some(init) => init,
            None => {
                if typ.is_none() {
                    let invalid = self.invalid_type();
                    self.tc_objs.lobjs[obj].set_type(Some(invalid));
                }
                return;
            }
        };

        let lhs = match lhs {
            Some(lhs) if lhs.len() > 1 => lhs,
            _ => {
                let mut x = Operand::new();
                self.expr(&mut x, init);
                self.init_var(obj, &mut x, "variable declaration");
                return;
            }
        };

        // All variables share the declared type.
        if let Some(t) = self.tc_objs.lobjs[obj].typ() {
            for &v in &lhs {
                self.tc_objs.lobjs[v].set_type(Some(t));
            }
        }
        self.init_vars(&lhs, init);
    }

    /// Initializes a variable with an operand and returns the variable's
    /// type, or `None` if either side is invalid.
    pub(crate) fn init_var(&mut self, lhs: ObjKey, x: &mut Operand<'a>, context: &str) -> Option<TypeKey> {
        let invalid = self.invalid_type();
        let lhs_typ = self.tc_objs.lobjs[lhs].typ();
        if x.invalid() || self.typ_of(x) == invalid || lhs_typ == Some(invalid) {
            if lhs_typ.is_none() {
                self.tc_objs.lobjs[lhs].set_type(Some(invalid));
            }
            return None;
        }

        // Without a declared type the variable takes the operand's default
        // type.
        let target = match lhs_typ {
            Some(t) => t,
            None => {
                let mut t = self.typ_of(x);
                if typ::is_untyped(t, self.tc_objs) {
                    if x.is_nil(self.tc_objs) {
                        let msg = format!("use of untyped nil in {}", context);
                        self.error(TypeError::UntypedNil, self.op_span(x), msg);
                        self.tc_objs.lobjs[lhs].set_type(Some(invalid));
                        return None;
                    }
                    t = typ::untyped_default_type(t, self.tc_objs);
                }
                self.tc_objs.lobjs[lhs].set_type(Some(t));
                t
            }
        };

        self.assignment(x, Some(target), context);
        if x.invalid() {
            return None;
        }
        x.typ
    }

    /// Initializes several variables from one multi-valued expression.
    fn init_vars(&mut self, lhs: &[ObjKey], init: &'a Expr) {
        let (mut rhs, comma_ok) = self.expr_list(std::slice::from_ref(init), lhs.len() == 2);

        if lhs.len() != rhs.len() {
            let invalid = self.invalid_type();
            for &v in lhs {
                if self.tc_objs.lobjs[v].typ().is_none() {
                    self.tc_objs.lobjs[v].set_type(Some(invalid));
                }
            }
            if rhs.iter().any(Operand::invalid) {
                return;
            }
            self.assign_error(init, lhs.len(), rhs.len());
            return;
        }

        if comma_ok {
            let t0 = self.init_var(lhs[0], &mut rhs[0], "assignment");
            let t1 = self.init_var(lhs[1], &mut rhs[1], "assignment");
            if let (Some(t0), Some(t1)) = (t0, t1) {
                self.record_comma_ok_types(init, t0, t1);
            }
            return;
        }

        for (&v, x) in lhs.iter().zip(rhs.iter_mut()) {
            self.init_var(v, x, "assignment");
        }
    }

    fn assign_error(&mut self, rhs: &Expr, nvars: usize, nvals: usize) {
        let measure = |n: usize, unit: &str| format!("{} {}{}", n, unit, if n == 1 { "" } else { "s" });
        let vars = measure(nvars, "variable");
        let vals = measure(nvals, "value");
        let msg = match &rhs.unparen().kind {
            ExprKind::Call(call) => format!(
                "assignment mismatch: {} but {} returns {}",
                vars,
                self.expr_str(&call.func),
                vals
            ),
            _ => format!("assignment mismatch: {} but {}", vars, vals),
        };
        self.error(TypeError::AssignMismatch, rhs.span, msg);
    }

    // ------------------------------------------------------------------------
    // Types

    fn type_decl(&mut self, obj: ObjKey, spec: &'a TypeSpec) {
        if spec.assign {
            if !spec.tparams.is_empty() {
                self.error(TypeError::GenericAlias, spec.name.span, "generic type cannot be alias");
            }
            let t = self.typ(&spec.ty);
            self.tc_objs.lobjs[obj].set_type(Some(t));
            return;
        }

        let named = self.tc_objs.new_t_named(Some(obj), None, Vec::new());

        let saved_scope = self.octx.scope;
        if !spec.tparams.is_empty() {
            let scope = self.tc_objs.new_scope(Some(self.current_scope()), "type parameters");
            self.octx.scope = Some(scope);
            let tparams = self.declare_type_params(scope, &spec.tparams);
            if let Some(n) = self.tc_objs.types[named].try_as_named_mut() {
                n.tparams = tparams;
            }
        }

        let rhs = self.typ(&spec.ty);
        self.octx.scope = saved_scope;

        let (mut underlying, is_tparam) = match &self.tc_objs.types[rhs] {
            Type::Named(n) => (n.underlying, false),
            Type::TypeParam(_) => (None, true),
            _ => (Some(rhs), false),
        };
        if is_tparam {
            self.error(
                TypeError::NotAType,
                spec.ty.span,
                "cannot use a type parameter as RHS in type declaration",
            );
            underlying = Some(self.invalid_type());
        }
        match underlying {
            Some(u) => self.set_underlying(named, u),
            None => {
                // The right-hand side is still being declared; its
                // underlying type is filled in once that completes.
                self.pending_underlying.push((named, rhs, obj));
            }
        }

        self.resolve_pending_underlying(false);
        self.expand_pending();
        self.collect_methods(obj, named);
    }

    fn set_underlying(&mut self, named: TypeKey, u: TypeKey) {
        if let Some(n) = self.tc_objs.types[named].try_as_named_mut() {
            n.underlying = Some(u);
        }
    }

    /// Propagates underlying types along chains like `type A B; type B C`
    /// where `B` was declared while `A` was in progress. On the final pass
    /// whatever is left is part of a cycle with no underlying type.
    pub(crate) fn resolve_pending_underlying(&mut self, final_pass: bool) {
        loop {
            let mut progress = false;
            let mut i = 0;
            while i < self.pending_underlying.len() {
                let (named, rhs, _) = self.pending_underlying[i];
                let u = self.tc_objs.types[rhs].try_as_named().and_then(|n| n.underlying);
                match u {
                    Some(u) => {
                        self.set_underlying(named, u);
                        self.pending_underlying.remove(i);
                        progress = true;
                    }
                    None => i += 1,
                }
            }
            if !progress {
                break;
            }
        }
        if !final_pass || self.pending_underlying.is_empty() {
            return;
        }

        let mut pending = std::mem::take(&mut self.pending_underlying);
        pending.sort_by_key(|(_, _, obj)| self.tc_objs.lobjs[*obj].span().start);
        let rhs_of: HashMap<TypeKey, TypeKey> = pending.iter().map(|(n, r, _)| (*n, *r)).collect();
        let mut reported = HashSet::new();
        let invalid = self.invalid_type();
        for (named, _, obj) in pending {
            if !reported.contains(&named) {
                let lobj = &self.tc_objs.lobjs[obj];
                let (span, msg) = (lobj.span(), format!("invalid recursive type {}", lobj.name()));
                self.error(TypeError::InvalidRecursiveType, span, msg);
                // One report per cycle.
                let mut cur = named;
                while reported.insert(cur) {
                    match rhs_of.get(&cur) {
                        Some(next) => cur = *next,
                        None => break,
                    }
                }
            }
            self.set_underlying(named, invalid);
        }
    }

    /// Moves the methods collected for a type name onto its named type.
    fn collect_methods(&mut self, obj: ObjKey, named: TypeKey) {
        let methods = match self.methods.remove(&obj) {
            Some(methods) => methods,
            None => return,
        };

        let mut seen: HashMap<String, ObjKey> = HashMap::new();
        let detail = match self.tc_objs.types[named].try_as_named() {
            Some(n) => n.clone(),
            None => return,
        };
        if let Some(s) = detail.underlying.and_then(|u| self.tc_objs.types[u].try_as_struct()) {
            for &f in &s.fields {
                let name = self.tc_objs.lobjs[f].name();
                if name != "_" {
                    seen.insert(name.to_string(), f);
                }
            }
        }
        for &m in &detail.methods {
            seen.insert(self.tc_objs.lobjs[m].name().to_string(), m);
        }

        let type_name = self.tc_objs.lobjs[obj].name().to_string();
        let mut added = Vec::new();
        for m in methods {
            let (name, span) = {
                let lobj = &self.tc_objs.lobjs[m];
                (lobj.name().to_string(), lobj.span())
            };
            if let Some(&alt) = seen.get(&name) {
                let msg = if self.tc_objs.lobjs[alt].entity_type().is_var() {
                    format!("field and method with the same name {}", name)
                } else {
                    format!("method {} already declared for {}", name, type_name)
                };
                self.error_with_alt(TypeError::Redeclared, span, msg, alt);
                continue;
            }
            seen.insert(name, m);
            added.push(m);
        }
        if let Some(n) = self.tc_objs.types[named].try_as_named_mut() {
            n.methods.extend(added);
        }
    }

    // ------------------------------------------------------------------------
    // Functions

    fn func_decl(&mut self, obj: ObjKey, decl: &'a FuncDecl) {
        // The signature is filled in place so that recursive references see
        // the final type.
        let no_value = self.tc_objs.universe().no_value_tuple();
        let sig = self.tc_objs.new_t_signature(None, None, no_value, no_value, false);
        self.tc_objs.lobjs[obj].set_type(Some(sig));
        self.func_type(sig, decl.recv.as_ref(), &decl.tparams, &decl.sig);
    }
}
