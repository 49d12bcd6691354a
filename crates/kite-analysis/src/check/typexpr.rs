//! Type expressions and signatures.

use std::collections::HashMap;

use kite_common::span::Span;
use kite_syntax::ast::{
    Expr, ExprKind, FuncTypeExpr, Ident, InterfaceElem, InterfaceTypeExpr, Param, StructTypeExpr, TypeParamDecl,
};

use super::errors::TypeError;
use super::Checker;
use crate::objects::{ObjKey, ScopeKey, TypeKey};
use crate::operand::{Operand, OperandMode};
use crate::typ::{self, SignatureDetail, Type};

impl<'a> Checker<'a> {
    /// Evaluates a type expression and records it. Generic types must be
    /// instantiated.
    pub(crate) fn typ(&mut self, e: &'a Expr) -> TypeKey {
        let mut t = self.type_internal(e);
        if typ::is_generic(t, self.tc_objs) {
            let msg = format!("cannot use generic type {} without instantiation", self.type_str(t));
            self.error(TypeError::GenericWithoutInst, e.span, msg);
            t = self.invalid_type();
        }
        self.record_type_and_value(e, OperandMode::TypeExpr, t);
        t
    }

    /// Evaluates a type expression that must denote a generic type.
    pub(crate) fn generic_type(&mut self, e: &'a Expr, report: bool) -> TypeKey {
        let mut t = self.type_internal(e);
        if t != self.invalid_type() && !typ::is_generic(t, self.tc_objs) {
            if report {
                let msg = format!("{} is not a generic type", self.type_str(t));
                self.error(TypeError::NotGeneric, e.span, msg);
            }
            t = self.invalid_type();
        }
        self.record_type_and_value(e, OperandMode::TypeExpr, t);
        t
    }

    fn type_internal(&mut self, e: &'a Expr) -> TypeKey {
        let invalid = self.invalid_type();
        match &e.kind {
            ExprKind::Bad => invalid,
            ExprKind::Ident(_) | ExprKind::Selector(_) => {
                let mut x = Operand::new();
                match &e.kind {
                    ExprKind::Ident(ident) => self.ident(&mut x, e, ident, true),
                    ExprKind::Selector(sel) => self.selector(&mut x, e, sel),
                    _ => unreachable!(),
                }
                match x.mode {
                    OperandMode::TypeExpr => self.typ_of(&x),
                    OperandMode::Invalid => invalid,
                    OperandMode::NoValue => {
                        let msg = format!("{} used as type", self.expr_str(e));
                        self.error(TypeError::NotAType, e.span, msg);
                        invalid
                    }
                    _ => {
                        let msg = format!("{} is not a type", self.expr_str(e));
                        self.error(TypeError::NotAType, e.span, msg);
                        invalid
                    }
                }
            }
            ExprKind::Index(index) => self.instantiated_type(&index.expr, &index.indices, e.span),
            ExprKind::Paren(inner) => {
                let t = self.type_internal(inner);
                self.record_type_and_value(inner, OperandMode::TypeExpr, t);
                t
            }
            ExprKind::ArrayType(array) => match &array.len {
                Some(len) => {
                    let n = self.array_length(len);
                    let elem = self.typ(&array.elem);
                    self.tc_objs.new_t_array(elem, n)
                }
                None => {
                    let elem = self.typ(&array.elem);
                    self.tc_objs.new_t_slice(elem)
                }
            },
            ExprKind::Star(base) => {
                let base = self.typ(base);
                self.tc_objs.new_t_pointer(base)
            }
            ExprKind::FuncType(ftype) => {
                let no_value = self.tc_objs.universe().no_value_tuple();
                let sig = self.tc_objs.new_t_signature(None, None, no_value, no_value, false);
                self.func_type(sig, None, &[], ftype);
                sig
            }
            ExprKind::InterfaceType(iface) => self.interface_type(iface),
            ExprKind::MapType(map) => {
                let key = self.typ(&map.key);
                let elem = self.typ(&map.value);
                // A key type still being declared is checked when used.
                let pending = matches!(&self.tc_objs.types[key], Type::Named(n) if n.underlying.is_none());
                if key != invalid && !pending && !typ::comparable(key, self.tc_objs) {
                    let msg = if self.tc_objs.types[key].try_as_type_param().is_some() {
                        format!("invalid map key type {} (missing comparable constraint)", self.type_str(key))
                    } else {
                        format!("invalid map key type {}", self.type_str(key))
                    };
                    self.error(TypeError::InvalidMapKey, map.key.span, msg);
                }
                self.tc_objs.new_t_map(key, elem)
            }
            ExprKind::StructType(st) => self.struct_type(st),
            _ => {
                let msg = format!("{} is not a type", self.expr_str(e));
                self.error(TypeError::NotAType, e.span, msg);
                invalid
            }
        }
    }

    /// The constant length of an array type, or `None` after an error.
    fn array_length(&mut self, e: &'a Expr) -> Option<u64> {
        let mut x = Operand::new();
        self.expr(&mut x, e);
        let val = match &x.mode {
            OperandMode::Constant(val) => val.clone(),
            OperandMode::Invalid => return None,
            _ => {
                let msg = format!("array length {} must be constant", self.op_str(&x));
                self.error(TypeError::InvalidArrayLen, e.span, msg);
                return None;
            }
        };
        let t = self.typ_of(&x);
        if typ::is_untyped(t, self.tc_objs) || typ::is_integer(t, self.tc_objs) {
            if let Some(n) = val.to_int().int64_val() {
                if n >= 0 {
                    return Some(n as u64);
                }
                let msg = format!("invalid array length {}", self.op_str(&x));
                self.error(TypeError::InvalidArrayLen, e.span, msg);
                return None;
            }
        }
        let msg = format!("array length {} must be integer", self.op_str(&x));
        self.error(TypeError::InvalidArrayLen, e.span, msg);
        None
    }

    fn struct_type(&mut self, st: &'a StructTypeExpr) -> TypeKey {
        let pkg = Some(self.pkg);
        let mut fields = Vec::new();
        let mut seen: HashMap<String, ObjKey> = HashMap::new();

        for field in &st.fields {
            let t = self.typ(&field.ty);
            if !field.is_embedded() {
                for ident in &field.names {
                    let name = self.name(ident.symbol).to_string();
                    let fld = self.tc_objs.new_field(ident.span, pkg, name, Some(t), false);
                    self.add_field(&mut fields, &mut seen, fld, ident);
                }
                continue;
            }

            let ident = match embedded_field_ident(&field.ty) {
                Some(ident) => ident,
                None => {
                    let msg = format!("invalid embedded field type {}", self.expr_str(&field.ty));
                    self.error(TypeError::NotAType, field.ty.span, msg);
                    continue;
                }
            };
            let name = self.name(ident.symbol).to_string();
            let fld = self.tc_objs.new_field(ident.span, pkg, name, Some(t), true);
            self.add_field(&mut fields, &mut seen, fld, ident);

            // An embedded type must be a type name or a pointer to a
            // non-interface type name.
            let (base, is_ptr) = match self.tc_objs.types[t].try_as_pointer() {
                Some(base) => (base, true),
                None => (t, false),
            };
            let under = match &self.tc_objs.types[base] {
                Type::Named(n) => n.underlying,
                _ => Some(base),
            };
            let msg = match under.map(|u| &self.tc_objs.types[u]) {
                Some(Type::Pointer(_)) => Some("embedded field type cannot be a pointer"),
                Some(Type::Interface(_)) if is_ptr => Some("embedded field type cannot be a pointer to an interface"),
                _ => None,
            };
            if let Some(msg) = msg {
                self.error(TypeError::EmbeddedPointerInterface, field.ty.span, msg);
            }
        }
        self.tc_objs.new_t_struct(fields)
    }

    fn add_field(&mut self, fields: &mut Vec<ObjKey>, seen: &mut HashMap<String, ObjKey>, fld: ObjKey, ident: &Ident) {
        let name = self.tc_objs.lobjs[fld].name().to_string();
        if name != "_" {
            if let Some(&alt) = seen.get(&name) {
                self.error_with_alt(TypeError::Redeclared, ident.span, format!("{} redeclared", name), alt);
                return;
            }
            seen.insert(name, fld);
        }
        fields.push(fld);
        self.record_def(ident, Some(fld));
    }

    fn interface_type(&mut self, iface: &'a InterfaceTypeExpr) -> TypeKey {
        let pkg = Some(self.pkg);
        let mut methods = Vec::new();
        let mut embeddeds = Vec::new();
        let mut seen: HashMap<String, ObjKey> = HashMap::new();

        for elem in &iface.elems {
            match elem {
                InterfaceElem::Method { name, sig, .. } => {
                    let no_value = self.tc_objs.universe().no_value_tuple();
                    let sig_t = self.tc_objs.new_t_signature(None, None, no_value, no_value, false);
                    self.func_type(sig_t, None, &[], sig);
                    let mname = self.name(name.symbol).to_string();
                    let m = self.tc_objs.new_func(name.span, pkg, mname.clone(), Some(sig_t));
                    self.record_def(name, Some(m));
                    if mname == "_" {
                        self.error(TypeError::NotAType, name.span, "methods must have a unique non-blank name");
                        continue;
                    }
                    if let Some(&alt) = seen.get(&mname) {
                        self.error_with_alt(TypeError::Redeclared, name.span, format!("duplicate method {}", mname), alt);
                        continue;
                    }
                    seen.insert(mname, m);
                    methods.push(m);
                }
                InterfaceElem::Embedded(e) => {
                    let t = self.typ(e);
                    if t == self.invalid_type() {
                        continue;
                    }
                    let pending = matches!(&self.tc_objs.types[t], Type::Named(n) if n.underlying.is_none());
                    if !pending && !typ::is_interface(t, self.tc_objs) {
                        let msg = format!("{} is not an interface", self.type_str(t));
                        self.error(TypeError::NotAnInterface, e.span, msg);
                        continue;
                    }
                    embeddeds.push(t);
                }
            }
        }
        self.tc_objs.new_t_interface(methods, embeddeds)
    }

    /// `T[A, B]`: instantiates the generic type `T`.
    fn instantiated_type(&mut self, base: &'a Expr, targ_exprs: &'a [Expr], span: Span) -> TypeKey {
        let invalid = self.invalid_type();
        let generic = self.generic_type(base, true);
        if generic == invalid {
            self.use_exprs(targ_exprs);
            return invalid;
        }
        let targs = match self.type_list(targ_exprs) {
            Some(targs) => targs,
            None => return invalid,
        };
        let want = self.tc_objs.types[generic].try_as_named().map_or(0, |n| n.tparams.len());
        if targs.len() != want {
            let msg = format!(
                "got {} type arguments but {} has {} type parameters",
                targs.len(),
                self.type_str(generic),
                want
            );
            self.error(TypeError::WrongTypeArgCount, span, msg);
            return invalid;
        }
        let spans: Vec<Span> = targ_exprs.iter().map(|e| e.span).collect();
        self.instantiate(span, generic, &targs, &spans)
    }

    /// Evaluates a list of type expressions. Returns `None` if any of them
    /// is invalid.
    pub(crate) fn type_list(&mut self, list: &'a [Expr]) -> Option<Vec<TypeKey>> {
        let invalid = self.invalid_type();
        let types: Vec<TypeKey> = list.iter().map(|e| self.typ(e)).collect();
        if types.contains(&invalid) {
            None
        } else {
            Some(types)
        }
    }

    // ------------------------------------------------------------------------
    // Signatures

    /// Fills the signature `sig` in place from a function type, with an
    /// optional receiver and type parameters.
    pub(crate) fn func_type(
        &mut self,
        sig: TypeKey,
        recv: Option<&'a Param>,
        tparams: &'a [TypeParamDecl],
        ftype: &'a FuncTypeExpr,
    ) {
        let scope = self.tc_objs.new_scope(Some(self.current_scope()), "function");
        let saved_scope = self.octx.scope.replace(scope);

        let mut rparams = Vec::new();
        if let Some(recv) = recv {
            let (base, rparam_idents) = self.unpack_recv(&recv.ty);
            if !rparam_idents.is_empty() {
                rparams = self.declare_rparams(scope, base, &rparam_idents);
            }
        }

        let mut tps = Vec::new();
        if let Some(first) = tparams.first() {
            if recv.is_some() {
                let span = first.names.first().map_or(first.constraint.span, |n| n.span);
                self.error(TypeError::MethodTypeParams, span, "methods cannot have type parameters");
            } else {
                tps = self.declare_type_params(scope, tparams);
            }
        }

        let recv_var = match recv {
            Some(recv) => self.collect_params(scope, std::slice::from_ref(recv), false).0.first().copied(),
            None => None,
        };
        let (params, variadic) = self.collect_params(scope, &ftype.params, true);
        let (results, _) = self.collect_params(scope, &ftype.results, false);

        if let (Some(recv), Some(rv)) = (recv, recv_var) {
            self.validate_recv(recv.span, rv);
        }

        let params = self.tc_objs.new_t_tuple(params);
        let results = self.tc_objs.new_t_tuple(results);
        self.tc_objs.types[sig] = Type::Signature(SignatureDetail {
            scope: Some(scope),
            recv: recv_var,
            params,
            results,
            variadic,
            tparams: tps,
            rparams,
        });
        self.octx.scope = saved_scope;
    }

    /// Splits `*T[P, Q]` into the base type expression and the receiver
    /// type parameter names.
    fn unpack_recv(&mut self, recv_ty: &'a Expr) -> (&'a Expr, Vec<&'a Ident>) {
        let mut e = recv_ty.unparen();
        if let ExprKind::Star(inner) = &e.kind {
            e = inner.unparen();
        }
        let mut idents = Vec::new();
        if let ExprKind::Index(index) = &e.kind {
            for arg in &index.indices {
                match arg.as_ident() {
                    Some(ident) => idents.push(ident),
                    None => {
                        let msg = format!("receiver type parameter {} must be an identifier", self.expr_str(arg));
                        self.error(TypeError::InvalidRecv, arg.span, msg);
                    }
                }
            }
            e = index.expr.unparen();
        }
        (e, idents)
    }

    /// Declares the type parameters of a generic receiver. Their bounds are
    /// those of the receiver base type, with its type parameters replaced by
    /// the receiver's.
    fn declare_rparams(&mut self, scope: ScopeKey, base: &'a Expr, idents: &[&'a Ident]) -> Vec<ObjKey> {
        let pkg = Some(self.pkg);
        let mut rparams = Vec::with_capacity(idents.len());
        for (i, ident) in idents.iter().enumerate() {
            let name = self.name(ident.symbol).to_string();
            let obj = self.tc_objs.new_type_name(ident.span, pkg, name, None);
            self.tc_objs.new_t_type_param(obj, i, None);
            self.declare(scope, Some(ident), obj);
            rparams.push(obj);
        }

        let base_t = self.generic_type(base, false);
        let base_tparams = match self.tc_objs.types[base_t].try_as_named() {
            Some(n) => n.tparams.clone(),
            None => Vec::new(),
        };
        if base_tparams.len() != rparams.len() {
            // Reported when the receiver type is instantiated.
            let any = self.tc_objs.universe().any_type();
            for &rp in &rparams {
                self.set_constraint(rp, any);
            }
            return rparams;
        }

        let rparam_types: Vec<TypeKey> = rparams.iter().map(|&rp| self.obj_type(rp)).collect();
        let smap = super::subst::SubstMap::new(&base_tparams, &rparam_types, self.tc_objs);
        for (i, &tp) in base_tparams.iter().enumerate() {
            let tp_t = self.obj_type(tp);
            let bound = self.tc_objs.types[tp_t]
                .try_as_type_param()
                .and_then(|d| d.constraint)
                .unwrap_or_else(|| self.tc_objs.universe().any_type());
            let bound = self.subst(bound, &smap);
            self.set_constraint(rparams[i], bound);
        }
        rparams
    }

    fn validate_recv(&mut self, span: Span, recv: ObjKey) {
        let rt = self.obj_type(recv);
        let t = self.tc_objs.types[rt].try_as_pointer().unwrap_or(rt);
        if t == self.invalid_type() {
            return;
        }
        let err = match &self.tc_objs.types[t] {
            Type::Named(n) => {
                let obj_pkg = n.obj.and_then(|o| self.tc_objs.lobjs[o].pkg());
                if obj_pkg != Some(self.pkg) {
                    Some("type not defined in this package")
                } else {
                    match n.underlying.map(|u| &self.tc_objs.types[u]) {
                        Some(Type::Pointer(_)) | Some(Type::Interface(_)) => Some("pointer or interface type"),
                        _ => None,
                    }
                }
            }
            _ => Some("basic or unnamed type"),
        };
        if let Some(err) = err {
            let msg = format!("invalid receiver {} ({})", self.type_str(rt), err);
            self.error(TypeError::InvalidRecv, span, msg);
        }
    }

    /// Declares type parameters in `scope`. Bounds are evaluated after all
    /// names are declared so they may refer to each other.
    pub(crate) fn declare_type_params(&mut self, scope: ScopeKey, decls: &'a [TypeParamDecl]) -> Vec<ObjKey> {
        let pkg = Some(self.pkg);
        let mut tparams = Vec::new();
        for group in decls {
            for ident in &group.names {
                let name = self.name(ident.symbol).to_string();
                let obj = self.tc_objs.new_type_name(ident.span, pkg, name, None);
                self.tc_objs.new_t_type_param(obj, tparams.len(), None);
                self.declare(scope, Some(ident), obj);
                tparams.push(obj);
            }
        }

        let mut next = 0;
        for group in decls {
            let bound = self.bound(&group.constraint);
            for _ in &group.names {
                self.set_constraint(tparams[next], bound);
                next += 1;
            }
        }
        tparams
    }

    /// A type parameter bound; must be an interface.
    fn bound(&mut self, e: &'a Expr) -> TypeKey {
        let t = self.typ(e);
        let any = self.tc_objs.universe().any_type();
        if t == self.invalid_type() {
            return any;
        }
        if !typ::is_interface(t, self.tc_objs) || self.tc_objs.types[t].try_as_type_param().is_some() {
            let msg = format!("{} is not an interface", self.type_str(t));
            self.error(TypeError::NotAnInterface, e.span, msg);
            return any;
        }
        t
    }

    fn set_constraint(&mut self, tparam: ObjKey, bound: TypeKey) {
        let t = self.obj_type(tparam);
        if let Some(tp) = self.tc_objs.types[t].try_as_type_param_mut() {
            tp.constraint = Some(bound);
        }
    }

    /// Declares parameters (or results) in the signature scope. Returns the
    /// parameter variables and whether the last one is variadic.
    fn collect_params(&mut self, scope: ScopeKey, params: &'a [Param], variadic_ok: bool) -> (Vec<ObjKey>, bool) {
        let pkg = Some(self.pkg);
        let mut vars = Vec::with_capacity(params.len());
        let mut variadic = false;
        for (i, p) in params.iter().enumerate() {
            let mut t = self.typ(&p.ty);
            if p.variadic {
                if variadic_ok && i + 1 == params.len() {
                    variadic = true;
                    t = self.tc_objs.new_t_slice(t);
                } else {
                    self.error(
                        TypeError::MisplacedVariadic,
                        p.span,
                        "can only use ... with final parameter in list",
                    );
                }
            }
            let var = match &p.name {
                Some(ident) => {
                    let name = self.name(ident.symbol).to_string();
                    let var = self.tc_objs.new_param(ident.span, pkg, name, Some(t));
                    self.declare(scope, Some(ident), var);
                    var
                }
                None => self.tc_objs.new_param(p.ty.span, pkg, String::new(), Some(t)),
            };
            vars.push(var);
        }
        (vars, variadic)
    }
}

/// The name an embedded field takes from its type: `T`, `*T`, `p.T` and
/// `T[A]` all embed a field named `T`.
fn embedded_field_ident(e: &Expr) -> Option<&Ident> {
    match &e.kind {
        ExprKind::Ident(ident) => Some(ident),
        ExprKind::Star(base) => match &base.kind {
            // `**T` does not embed.
            ExprKind::Star(_) => None,
            _ => embedded_field_ident(base),
        },
        ExprKind::Selector(sel) => Some(&sel.sel),
        ExprKind::Index(index) => embedded_field_ident(&index.expr),
        _ => None,
    }
}
