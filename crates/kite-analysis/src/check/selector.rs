//! Selector expressions: qualified identifiers and field or method access.

use kite_common::span::Span;
use kite_syntax::ast::{Expr, SelectorExpr};

use super::checker::DeclState;
use super::errors::TypeError;
use super::subst::SubstMap;
use super::Checker;
use crate::lookup::{lookup_field_or_method, LookupResult};
use crate::obj::EntityType;
use crate::objects::{ObjKey, PackageKey, TypeKey};
use crate::operand::{Operand, OperandMode};
use crate::scope::Scope;
use crate::selection::{Selection, SelectionKind};
use crate::typ::{self, SignatureDetail, Type};

/// Foreign declarations live in the current package under these prefixes,
/// tried in order.
const FOREIGN_PREFIXES: [&str; 8] = [
    "_Ciconst_",
    "_Cfconst_",
    "_Csconst_",
    "_Ctype_",
    "_Cvar_", // a pointer to the variable
    "_Cfpvar_fp_",
    "_Cfunc_",
    "_Cmacro_", // a function evaluating the macro
];

impl<'a> Checker<'a> {
    pub(crate) fn selector(&mut self, x: &mut Operand<'a>, e: &'a Expr, sel: &'a SelectorExpr) {
        x.expr = Some(e);
        if let Some(ident) = sel.expr.as_ident() {
            let name = self.name(ident.symbol);
            if let Some((_, obj)) = Scope::lookup_parent(self.current_scope(), name, self.tc_objs) {
                if let Some(imported) = self.tc_objs.lobjs[obj].pkg_name_imported() {
                    self.record_use(ident, obj);
                    self.tc_objs.lobjs[obj].set_pkg_name_used();
                    self.qualified(x, sel, imported);
                    x.expr = Some(e);
                    return;
                }
            }
        }

        self.expr_or_type(x, &sel.expr);
        x.expr = Some(e);
        if x.invalid() {
            return;
        }
        let xt = self.typ_of(x);
        if x.mode == OperandMode::TypeExpr && typ::is_generic(xt, self.tc_objs) {
            let msg = format!("cannot use generic type {} without instantiation", self.type_str(xt));
            self.error(TypeError::GenericWithoutInst, sel.expr.span, msg);
            x.mode = OperandMode::Invalid;
            return;
        }

        let name = self.name(sel.sel.symbol);
        let addressable = x.mode == OperandMode::Variable;
        let (obj, indices, indirect) =
            match lookup_field_or_method(xt, addressable, Some(self.pkg), name, self.tc_objs) {
                LookupResult::Entry { obj, indices, indirect } => (obj, indices, indirect),
                failure => {
                    self.report_lookup_failure(x, sel, failure);
                    x.mode = OperandMode::Invalid;
                    return;
                }
            };

        // A method's signature may not be complete yet.
        let is_method = self.tc_objs.lobjs[obj].entity_type().is_func();
        let obj = if is_method {
            let in_progress = self.decl_state(obj) == DeclState::InProgress;
            self.obj_decl(obj);
            if in_progress {
                // a method used in its own signature, reported as a cycle
                x.mode = OperandMode::Invalid;
                return;
            }
            self.specialize_method(x, obj, &indices)
        } else {
            obj
        };

        if x.mode == OperandMode::TypeExpr {
            // T.m: the receiver becomes the first parameter
            if !is_method {
                let msg = format!(
                    "{}.{} undefined (type {} has no method {})",
                    self.expr_str(&sel.expr),
                    name,
                    self.type_str(xt),
                    name
                );
                self.error(TypeError::FieldOrMethodUndefined, sel.sel.span, msg);
                x.mode = OperandMode::Invalid;
                return;
            }
            self.record_selection(
                e,
                &sel.sel,
                Selection::new(SelectionKind::MethodExpr, xt, obj, indices, indirect),
            );
            x.mode = OperandMode::Value;
            x.typ = Some(self.method_expr_sig(xt, obj));
            return;
        }

        match self.tc_objs.lobjs[obj].entity_type().clone() {
            EntityType::Var(_) => {
                self.record_selection(
                    e,
                    &sel.sel,
                    Selection::new(SelectionKind::FieldVal, xt, obj, indices, indirect),
                );
                if x.mode != OperandMode::Variable && !indirect {
                    x.mode = OperandMode::Value;
                } else {
                    x.mode = OperandMode::Variable;
                }
                x.typ = Some(self.obj_type(obj));
            }
            EntityType::Func { .. } => {
                self.record_selection(
                    e,
                    &sel.sel,
                    Selection::new(SelectionKind::MethodVal, xt, obj, indices, indirect),
                );
                x.mode = OperandMode::Value;
                x.typ = Some(self.method_value_sig(obj));
            }
            other => unreachable!("lookup returned {:?}", other),
        }
    }

    /// `pkg.Name`: looks the name up in the imported package, or among the
    /// foreign declarations of the current package for `"C"`.
    fn qualified(&mut self, x: &mut Operand<'a>, sel: &'a SelectorExpr, pkg: PackageKey) {
        x.mode = OperandMode::Invalid;
        let mut name = self.name(sel.sel.symbol).to_string();
        let foreign = self.tc_objs.pkgs[pkg].foreign();
        let mut func_mode = OperandMode::Value;

        let exp = if foreign {
            // C.malloc does not support two-result calls
            if name == "malloc" {
                name = "_CMalloc".to_string();
            } else {
                func_mode = OperandMode::ForeignFunc;
            }
            let scope = self.current_scope();
            let found = FOREIGN_PREFIXES
                .iter()
                .find_map(|prefix| Scope::lookup_parent(scope, &format!("{}{}", prefix, name), self.tc_objs));
            match found {
                Some((_, exp)) => {
                    self.obj_decl(exp);
                    exp
                }
                None => {
                    let msg = format!("{} not declared by package C", name);
                    self.error(TypeError::NotDeclaredByPackage, sel.sel.span, msg);
                    return;
                }
            }
        } else {
            let scope = self.tc_objs.pkgs[pkg].scope();
            match self.tc_objs.scopes[scope].lookup(&name) {
                Some(exp) => {
                    if !self.tc_objs.lobjs[exp].exported() {
                        let msg = format!("{} not exported by package {}", name, self.tc_objs.pkgs[pkg].name());
                        self.error(TypeError::NotExported, sel.sel.span, msg);
                    }
                    exp
                }
                None => {
                    if !self.tc_objs.pkgs[pkg].fake() {
                        let msg = format!("{} not declared by package {}", name, self.tc_objs.pkgs[pkg].name());
                        self.error(TypeError::NotDeclaredByPackage, sel.sel.span, msg);
                    }
                    return;
                }
            }
        };
        self.record_use(&sel.sel, exp);

        let t = self.obj_type(exp);
        let exp_name = self.tc_objs.lobjs[exp].name().to_string();
        x.typ = Some(t);
        match self.tc_objs.lobjs[exp].entity_type().clone() {
            EntityType::Const { val } => x.mode = OperandMode::Constant(val),
            EntityType::TypeName => x.mode = OperandMode::TypeExpr,
            EntityType::Var(_) => {
                x.mode = OperandMode::Variable;
                if foreign && exp_name.starts_with("_Cvar_") {
                    x.typ = Some(typ::try_deref(t, self.tc_objs).0);
                }
            }
            EntityType::Func { .. } => {
                x.mode = func_mode;
                if foreign && exp_name.starts_with("_Cmacro_") {
                    let results = self.tc_objs.types[t].try_as_signature().map(|sig| sig.results);
                    let first = results.and_then(|r| self.tc_objs.tuple_vars(r).first().copied());
                    match first {
                        Some(v) => {
                            x.mode = OperandMode::Value;
                            x.typ = Some(self.obj_type(v));
                        }
                        None => {
                            x.mode = OperandMode::NoValue;
                            x.typ = results;
                        }
                    }
                }
            }
            EntityType::Builtin(id) => x.mode = OperandMode::Builtin(id),
            other => unreachable!("unexpected object {:?} in package scope", other),
        }
    }

    fn report_lookup_failure(&mut self, x: &Operand<'a>, sel: &'a SelectorExpr, failure: LookupResult) {
        let name = self.name(sel.sel.symbol);
        let base = self.expr_str(&sel.expr);
        let xt = self.typ_of(x);
        let (code, msg) = match failure {
            LookupResult::Ambiguous(_) => (
                TypeError::AmbiguousSelector,
                format!("ambiguous selector {}.{}", base, name),
            ),
            LookupResult::PointerRecvOnly if x.mode == OperandMode::TypeExpr => (
                TypeError::PointerMethodOnValue,
                format!(
                    "invalid method expression {}.{} (needs pointer receiver (*{}).{})",
                    base,
                    name,
                    self.type_str(xt),
                    name
                ),
            ),
            LookupResult::PointerRecvOnly => (
                TypeError::PointerMethodOnValue,
                format!("cannot call pointer method {} on {}", name, self.type_str(xt)),
            ),
            LookupResult::NotFound => {
                let mut why = match self.tc_objs.types[xt].try_as_type_param().map(|tp| tp.constraint) {
                    Some(bound) => {
                        let bound_obj = bound
                            .and_then(|b| self.tc_objs.types[b].try_as_named())
                            .and_then(|n| n.obj);
                        match bound_obj {
                            Some(obj) => format!("interface {} has no method {}", self.tc_objs.lobjs[obj].name(), name),
                            None => format!("type bound for {} has no method {}", self.type_str(xt), name),
                        }
                    }
                    None => format!("type {} has no field or method {}", self.type_str(xt), name),
                };
                if let Some(other) = swap_first_case(name) {
                    let addressable = x.mode == OperandMode::Variable;
                    let found = lookup_field_or_method(xt, addressable, Some(self.pkg), &other, self.tc_objs);
                    if found.obj().is_some() {
                        why.push_str(", but does have ");
                        why.push_str(&other);
                    }
                }
                (
                    TypeError::FieldOrMethodUndefined,
                    format!("{}.{} undefined ({})", base, name, why),
                )
            }
            LookupResult::Entry { .. } => unreachable!("lookup succeeded"),
        };
        self.error(code, sel.sel.span, msg);
    }

    /// For methods of generic types, a copy of `m` whose signature has the
    /// receiver's type arguments substituted. `m` itself is not changed.
    fn specialize_method(&mut self, x: &Operand<'a>, m: ObjKey, indices: &[usize]) -> ObjKey {
        let sig_t = self.obj_type(m);
        let (recv, rparams) = match self.tc_objs.types[sig_t].try_as_signature() {
            Some(SignatureDetail {
                recv: Some(recv),
                rparams,
                ..
            }) if !rparams.is_empty() => (*recv, rparams.clone()),
            _ => return m,
        };

        // The receiver is inferred from the type the method was found in,
        // with the pointer-ness of the declared receiver.
        let recv_t = self.obj_type(recv);
        let (recv_base, ptr_recv) = typ::try_deref(recv_t, self.tc_objs);
        let base = self.embedded_base(self.typ_of(x), indices);
        if recv_base == self.invalid_type() {
            // a malformed receiver was reported with its declaration
            return m;
        }
        let orig_of = |t: TypeKey| self.tc_objs.types[t].try_as_named().and_then(|n| n.orig);
        assert!(
            orig_of(recv_base).is_some() && orig_of(recv_base) == orig_of(base),
            "method {} found in {} which does not instantiate its receiver type",
            self.tc_objs.lobjs[m].name(),
            self.type_str(base)
        );
        let arg_t = if ptr_recv {
            self.tc_objs.new_t_pointer(base)
        } else {
            base
        };
        let arg = Operand::with(OperandMode::Value, x.expr, Some(arg_t));
        let params = self.tc_objs.new_t_tuple(vec![recv]);
        let targs = match self.try_infer(&rparams, params, std::slice::from_ref(&arg)) {
            Some(targs) => targs,
            None => panic!(
                "receiver type parameter inference failed for method {}",
                self.tc_objs.lobjs[m].name()
            ),
        };

        let smap = SubstMap::new(&rparams, &targs, self.tc_objs);
        let specialized = self.subst(sig_t, &smap);
        let specialized = self.strip_rparams(specialized);
        let copy = self.tc_objs.lobjs[m].specialized_copy(m, specialized);
        let key = self.tc_objs.lobjs.insert(copy);
        tracing::trace!(method = %self.tc_objs.lobjs[m].name(), sig = %self.type_str(specialized), "specialized method");
        key
    }

    /// The function type of method expression `T.m`: the method's signature
    /// with a leading parameter of type `T` and no receiver.
    fn method_expr_sig(&mut self, recv_t: TypeKey, m: ObjKey) -> TypeKey {
        let sig = match self.tc_objs.types[self.obj_type(m)].try_as_signature() {
            Some(sig) => sig.clone(),
            None => unreachable!("method without signature"),
        };
        let first = self
            .tc_objs
            .new_var(Span::dummy(), Some(self.pkg), "_".to_string(), Some(recv_t));
        let mut vars = vec![first];
        vars.extend_from_slice(self.tc_objs.tuple_vars(sig.params));
        let params = self.tc_objs.new_t_tuple(vars);
        self.tc_objs.types.insert(Type::Signature(SignatureDetail {
            scope: None,
            recv: None,
            params,
            rparams: Vec::new(),
            ..sig
        }))
    }

    /// The type of method value `x.m`: the signature without its receiver.
    fn method_value_sig(&mut self, m: ObjKey) -> TypeKey {
        let sig = match self.tc_objs.types[self.obj_type(m)].try_as_signature() {
            Some(sig) => sig.clone(),
            None => unreachable!("method without signature"),
        };
        self.tc_objs
            .types
            .insert(Type::Signature(SignatureDetail { recv: None, ..sig }))
    }
}

/// `name` with the case of its first letter swapped, if it has a cased
/// first letter.
fn swap_first_case(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let first = chars.next()?;
    let swapped: String = if first.is_uppercase() {
        first.to_lowercase().collect()
    } else if first.is_lowercase() {
        first.to_uppercase().collect()
    } else {
        return None;
    };
    Some(swapped + chars.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_first_case() {
        assert_eq!(swap_first_case("value").as_deref(), Some("Value"));
        assert_eq!(swap_first_case("Value").as_deref(), Some("value"));
        assert_eq!(swap_first_case("_x"), None);
        assert_eq!(swap_first_case(""), None);
    }
}
