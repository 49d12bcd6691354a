//! Type argument inference.
//!
//! Function arguments are unified with parameter types in two passes:
//! typed arguments first, then untyped constants with their default types
//! for parameters that are still unbound.

use kite_common::span::Span;

use super::errors::TypeError;
use super::subst::SubstMap;
use super::Checker;
use crate::objects::{ObjKey, TCObjects, TypeKey};
use crate::operand::Operand;
use crate::typ::{self, Type};

/// Unifies types that mention a fixed set of type parameters, binding each
/// parameter at most once.
struct Unifier<'t> {
    tparams: &'t [TypeKey],
    bound: Vec<Option<TypeKey>>,
    objs: &'t TCObjects,
}

impl<'t> Unifier<'t> {
    fn new(tparams: &'t [TypeKey], objs: &'t TCObjects) -> Unifier<'t> {
        Unifier {
            tparams,
            bound: vec![None; tparams.len()],
            objs,
        }
    }

    fn index(&self, t: TypeKey) -> Option<usize> {
        self.tparams.iter().position(|p| *p == t)
    }

    fn unify(&mut self, x: TypeKey, y: TypeKey) -> bool {
        if x == y {
            return true;
        }
        if let Some(i) = self.index(x) {
            return match self.bound[i] {
                Some(bx) => bx == y || self.unify(bx, y),
                None => {
                    self.bound[i] = Some(y);
                    true
                }
            };
        }
        if let Some(i) = self.index(y) {
            return match self.bound[i] {
                Some(by) => by == x || self.unify(x, by),
                None => {
                    self.bound[i] = Some(x);
                    true
                }
            };
        }

        let objs = self.objs;
        // A defined type unifies with a type literal through its underlying
        // type.
        let is_defined = |t: TypeKey| objs.types[t].try_as_named().is_some();
        if is_defined(x) && !typ::is_named(y, objs) {
            return self.unify(typ::underlying_type(x, objs), y);
        }
        if is_defined(y) && !typ::is_named(x, objs) {
            return self.unify(x, typ::underlying_type(y, objs));
        }

        match (&objs.types[x], &objs.types[y]) {
            (Type::Basic(a), Type::Basic(b)) => a == b,
            (Type::Array(a), Type::Array(b)) => {
                (a.len.is_none() || b.len.is_none() || a.len == b.len) && self.unify(a.elem, b.elem)
            }
            (Type::Slice(a), Type::Slice(b)) | (Type::Pointer(a), Type::Pointer(b)) => self.unify(*a, *b),
            (Type::Map(a), Type::Map(b)) => self.unify(a.key, b.key) && self.unify(a.elem, b.elem),
            (Type::Struct(a), Type::Struct(b)) => {
                a.fields.len() == b.fields.len()
                    && a.fields.iter().zip(&b.fields).all(|(f, g)| {
                        let (f, g) = (&objs.lobjs[*f], &objs.lobjs[*g]);
                        f.var_embedded() == g.var_embedded()
                            && g.same_id(f.pkg(), f.name())
                            && self.unify_opt(f.typ(), g.typ())
                    })
            }
            (Type::Tuple(a), Type::Tuple(b)) => {
                a.vars.len() == b.vars.len()
                    && a
                        .vars
                        .iter()
                        .zip(&b.vars)
                        .all(|(v, w)| self.unify_opt(objs.lobjs[*v].typ(), objs.lobjs[*w].typ()))
            }
            (Type::Signature(a), Type::Signature(b)) => {
                a.tparams.is_empty()
                    && b.tparams.is_empty()
                    && a.variadic == b.variadic
                    && self.unify(a.params, b.params)
                    && self.unify(a.results, b.results)
            }
            (Type::Interface(_), Type::Interface(_)) => {
                if typ::interface_is_comparable(x, objs) != typ::interface_is_comparable(y, objs) {
                    return false;
                }
                let mut a = typ::all_methods(x, objs);
                let mut b = typ::all_methods(y, objs);
                if a.len() != b.len() {
                    return false;
                }
                let by_name = |k: &ObjKey| objs.lobjs[*k].name().to_string();
                a.sort_by_key(by_name);
                b.sort_by_key(by_name);
                a.iter().zip(&b).all(|(m, n)| {
                    let (m, n) = (&objs.lobjs[*m], &objs.lobjs[*n]);
                    n.same_id(m.pkg(), m.name()) && self.unify_opt(m.typ(), n.typ())
                })
            }
            (Type::Named(a), Type::Named(b)) => {
                a.orig.is_some()
                    && a.orig == b.orig
                    && a.targs.len() == b.targs.len()
                    && a.targs.iter().zip(&b.targs).all(|(s, t)| self.unify(*s, *t))
            }
            _ => false,
        }
    }

    fn unify_opt(&mut self, x: Option<TypeKey>, y: Option<TypeKey>) -> bool {
        match (x, y) {
            (Some(x), Some(y)) => self.unify(x, y),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Why inference stopped: the argument index, whether its default type was
/// used, and the argument type that did not unify.
struct Mismatch {
    arg: usize,
    default: bool,
    targ: TypeKey,
}

impl<'a> Checker<'a> {
    /// Infers the type arguments of `tparams` from call arguments. `params`
    /// is the parameter tuple, adjusted for variadic calls so that it lines
    /// up with `args`. Returns `None` after reporting an error.
    pub(crate) fn infer(
        &mut self,
        span: Span,
        tparams: &[ObjKey],
        params: TypeKey,
        args: &[Operand<'a>],
    ) -> Option<Vec<TypeKey>> {
        let (bound, mismatch) = self.unify_args(tparams, params, args);
        if let Some(m) = mismatch {
            self.report_mismatch(tparams, params, args, &bound, m);
            return None;
        }
        match bound.iter().position(Option::is_none) {
            Some(i) => {
                let msg = format!("cannot infer {}", self.tc_objs.lobjs[tparams[i]].name());
                self.error(TypeError::CannotInfer, span, msg);
                None
            }
            None => bound.into_iter().collect(),
        }
    }

    /// Like `infer`, without reporting errors.
    pub(crate) fn try_infer(&mut self, tparams: &[ObjKey], params: TypeKey, args: &[Operand<'a>]) -> Option<Vec<TypeKey>> {
        let (bound, mismatch) = self.unify_args(tparams, params, args);
        if mismatch.is_some() {
            return None;
        }
        bound.into_iter().collect()
    }

    fn unify_args(
        &self,
        tparams: &[ObjKey],
        params: TypeKey,
        args: &[Operand<'a>],
    ) -> (Vec<Option<TypeKey>>, Option<Mismatch>) {
        let objs: &TCObjects = self.tc_objs;
        let tparam_types: Vec<TypeKey> = tparams.iter().map(|tp| self.obj_type(*tp)).collect();
        let param_types = objs.tuple_types(params);
        let mut u = Unifier::new(&tparam_types, objs);

        // Typed arguments first.
        let mut untyped = Vec::new();
        for (i, (arg, &par)) in args.iter().zip(&param_types).enumerate() {
            if arg.invalid() || !typ::mentions_type_params(par, tparams, objs) {
                continue;
            }
            let targ = self.typ_of(arg);
            if typ::is_typed(targ, objs) {
                if !u.unify(par, targ) {
                    let bound = u.bound;
                    return (
                        bound,
                        Some(Mismatch {
                            arg: i,
                            default: false,
                            targ,
                        }),
                    );
                }
            } else {
                untyped.push(i);
            }
        }

        // Untyped constants only bind parameters that are still free and
        // that they are passed to directly.
        for i in untyped {
            let par = param_types[i];
            let free = u.index(par).map_or(false, |k| u.bound[k].is_none());
            if !free {
                continue;
            }
            let targ = typ::untyped_default_type(self.typ_of(&args[i]), objs);
            if typ::is_typed(targ, objs) && !u.unify(par, targ) {
                let bound = u.bound;
                return (
                    bound,
                    Some(Mismatch {
                        arg: i,
                        default: true,
                        targ,
                    }),
                );
            }
        }
        (u.bound, None)
    }

    fn report_mismatch(
        &mut self,
        tparams: &[ObjKey],
        params: TypeKey,
        args: &[Operand<'a>],
        bound: &[Option<TypeKey>],
        m: Mismatch,
    ) {
        let par = self.tc_objs.tuple_types(params)[m.arg];
        let arg = &args[m.arg];
        let kind = if m.default { "default type" } else { "type" };
        let arg_str = arg.expr.map(|e| self.expr_str(e)).unwrap_or_default();
        let targ = self.type_str(m.targ);

        let msg = if bound.iter().all(Option::is_none) {
            let names: Vec<&str> = tparams.iter().map(|tp| self.tc_objs.lobjs[*tp].name()).collect();
            format!(
                "{} {} of {} does not match {} (cannot infer {})",
                kind,
                targ,
                arg_str,
                self.type_str(par),
                names.join(", ")
            )
        } else {
            let pairs: Vec<(TypeKey, TypeKey)> = tparams
                .iter()
                .zip(bound)
                .filter_map(|(tp, b)| b.map(|b| (self.obj_type(*tp), b)))
                .collect();
            let inferred = self.subst(par, &SubstMap::from_pairs(pairs));
            if inferred != par {
                format!(
                    "{} {} of {} does not match inferred type {} for {}",
                    kind,
                    targ,
                    arg_str,
                    self.type_str(inferred),
                    self.type_str(par)
                )
            } else {
                format!("{} {} of {} does not match {}", kind, targ, arg_str, self.type_str(par))
            }
        };
        self.error(TypeError::InferenceMismatch, self.op_span(arg), msg);
    }
}
