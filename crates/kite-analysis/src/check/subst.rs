//! Type parameter substitution and instantiation.

use std::collections::HashMap;

use kite_common::span::Span;

use super::checker::Instance;
use super::errors::TypeError;
use super::Checker;
use crate::objects::{ObjKey, TCObjects, TypeKey};
use crate::typ::{self, InterfaceDetail, NamedDetail, SignatureDetail, Type};

/// Maps type parameter types to their replacements.
#[derive(Debug, Default, Clone)]
pub(crate) struct SubstMap {
    map: HashMap<TypeKey, TypeKey>,
}

impl SubstMap {
    /// Pairs type parameters (by their type name objects) with type
    /// arguments. Extra entries on either side are ignored.
    pub(crate) fn new(tparams: &[ObjKey], targs: &[TypeKey], objs: &TCObjects) -> SubstMap {
        let map = tparams
            .iter()
            .zip(targs)
            .filter_map(|(tp, targ)| objs.lobjs[*tp].typ().map(|t| (t, *targ)))
            .collect();
        SubstMap { map }
    }

    pub(crate) fn from_pairs(pairs: impl IntoIterator<Item = (TypeKey, TypeKey)>) -> SubstMap {
        SubstMap {
            map: pairs.into_iter().collect(),
        }
    }

    pub(crate) fn lookup(&self, t: TypeKey) -> Option<TypeKey> {
        self.map.get(&t).copied()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<'a> Checker<'a> {
    /// Replaces type parameters in `t`. Types that mention none of them are
    /// returned as they are.
    pub(crate) fn subst(&mut self, t: TypeKey, smap: &SubstMap) -> TypeKey {
        if smap.is_empty() {
            return t;
        }
        match self.tc_objs.types[t].clone() {
            Type::Basic(_) => t,
            Type::TypeParam(_) => smap.lookup(t).unwrap_or(t),
            Type::Array(a) => {
                let elem = self.subst(a.elem, smap);
                if elem == a.elem {
                    t
                } else {
                    self.tc_objs.new_t_array(elem, a.len)
                }
            }
            Type::Slice(elem) => {
                let e = self.subst(elem, smap);
                if e == elem {
                    t
                } else {
                    self.tc_objs.new_t_slice(e)
                }
            }
            Type::Pointer(base) => {
                let b = self.subst(base, smap);
                if b == base {
                    t
                } else {
                    self.tc_objs.new_t_pointer(b)
                }
            }
            Type::Map(m) => {
                let key = self.subst(m.key, smap);
                let elem = self.subst(m.elem, smap);
                if key == m.key && elem == m.elem {
                    t
                } else {
                    self.tc_objs.new_t_map(key, elem)
                }
            }
            Type::Struct(s) => match self.subst_vars(&s.fields, smap) {
                Some(fields) => self.tc_objs.new_t_struct(fields),
                None => t,
            },
            Type::Tuple(tuple) => match self.subst_vars(&tuple.vars, smap) {
                Some(vars) => self.tc_objs.new_t_tuple(vars),
                None => t,
            },
            Type::Signature(sig) => {
                let params = self.subst(sig.params, smap);
                let results = self.subst(sig.results, smap);
                let recv = match sig.recv {
                    Some(r) => self.subst_vars(&[r], smap).map(|v| v[0]),
                    None => None,
                };
                if params == sig.params && results == sig.results && recv.is_none() {
                    return t;
                }
                self.tc_objs.types.insert(Type::Signature(SignatureDetail {
                    recv: recv.or(sig.recv),
                    params,
                    results,
                    ..sig
                }))
            }
            Type::Interface(iface) => {
                let methods = self.subst_vars(&iface.methods, smap);
                let embeddeds: Vec<TypeKey> = iface.embeddeds.iter().map(|e| self.subst(*e, smap)).collect();
                if methods.is_none() && embeddeds == iface.embeddeds {
                    return t;
                }
                self.tc_objs.types.insert(Type::Interface(InterfaceDetail {
                    methods: methods.unwrap_or(iface.methods),
                    embeddeds,
                    is_comparable: iface.is_comparable,
                }))
            }
            Type::Named(n) => {
                if n.targs.is_empty() {
                    return t;
                }
                let targs: Vec<TypeKey> = n.targs.iter().map(|a| self.subst(*a, smap)).collect();
                if targs == n.targs {
                    return t;
                }
                let orig = n.orig.unwrap_or(t);
                self.instantiate_named(orig, targs)
            }
        }
    }

    /// Substitutes the types of variables (or methods), copying those whose
    /// type changes. Returns `None` if nothing changed.
    fn subst_vars(&mut self, vars: &[ObjKey], smap: &SubstMap) -> Option<Vec<ObjKey>> {
        let mut out = Vec::with_capacity(vars.len());
        let mut changed = false;
        for &v in vars {
            let vt = match self.tc_objs.lobjs[v].typ() {
                Some(vt) => vt,
                None => {
                    out.push(v);
                    continue;
                }
            };
            let nt = self.subst(vt, smap);
            if nt == vt {
                out.push(v);
                continue;
            }
            let mut copy = self.tc_objs.lobjs[v].clone();
            copy.set_type(Some(nt));
            out.push(self.tc_objs.lobjs.insert(copy));
            changed = true;
        }
        changed.then_some(out)
    }

    /// Instantiates a generic type or function with type arguments after
    /// checking them against their constraints. `spans` locate the type
    /// arguments for error reporting.
    pub(crate) fn instantiate(&mut self, span: Span, generic: TypeKey, targs: &[TypeKey], spans: &[Span]) -> TypeKey {
        let tparams = match &self.tc_objs.types[generic] {
            Type::Named(n) => n.tparams.clone(),
            Type::Signature(sig) => sig.tparams.clone(),
            _ => unreachable!("instantiate of a non-generic type"),
        };
        let smap = SubstMap::new(&tparams, targs, self.tc_objs);

        for (i, &tp) in tparams.iter().enumerate() {
            let tp_t = self.obj_type(tp);
            let bound = self.tc_objs.types[tp_t].try_as_type_param().and_then(|d| d.constraint);
            if let (Some(bound), Some(&targ)) = (bound, targs.get(i)) {
                let bound = self.subst(bound, &smap);
                let at = spans.get(i).copied().unwrap_or(span);
                self.satisfies(at, targ, bound);
            }
        }

        if self.tc_objs.types[generic].try_as_named().is_some() {
            self.instantiate_named(generic, targs.to_vec())
        } else {
            self.instantiate_signature(generic, &smap)
        }
    }

    /// Reports whether `targ` satisfies the constraint `bound`.
    fn satisfies(&mut self, span: Span, targ: TypeKey, bound: TypeKey) -> bool {
        if typ::interface_is_comparable(bound, self.tc_objs) && !typ::comparable(targ, self.tc_objs) {
            let msg = format!("{} does not satisfy comparable", self.type_str(targ));
            self.error(TypeError::UnsatisfiedConstraint, span, msg);
            return false;
        }
        if let Some((m, wrong)) = self.missing_method(targ, bound, true) {
            let msg = format!(
                "{} does not satisfy {} ({} {})",
                self.type_str(targ),
                self.type_str(bound),
                if wrong { "wrong type for method" } else { "missing method" },
                self.tc_objs.lobjs[m].name()
            );
            self.error(TypeError::UnsatisfiedConstraint, span, msg);
            return false;
        }
        true
    }

    /// The instance of generic named type `orig` for `targs`. Instances are
    /// shared; the underlying type is computed as soon as the generic type's
    /// own underlying type is known.
    pub(crate) fn instantiate_named(&mut self, orig: TypeKey, targs: Vec<TypeKey>) -> TypeKey {
        let objs: &TCObjects = self.tc_objs;
        let existing = self.instances.iter().find(|inst| {
            inst.orig == orig
                && inst.targs.len() == targs.len()
                && inst.targs.iter().zip(&targs).all(|(a, b)| typ::identical(*a, *b, objs))
        });
        if let Some(inst) = existing {
            return inst.inst;
        }

        let obj = self.tc_objs.types[orig].try_as_named().and_then(|n| n.obj);
        let inst = self.tc_objs.types.insert(Type::Named(NamedDetail {
            obj,
            orig: Some(orig),
            underlying: None,
            methods: Vec::new(),
            tparams: Vec::new(),
            targs: targs.clone(),
        }));
        self.instances.push(Instance { orig, targs, inst });
        tracing::trace!(instance = %self.type_str(inst), "instantiated");

        let orig_known = self.tc_objs.types[orig].try_as_named().map_or(false, |n| n.underlying.is_some());
        if orig_known {
            self.expand_instance(inst);
        } else {
            self.pending_expansions.push(inst);
        }
        inst
    }

    fn expand_instance(&mut self, inst: TypeKey) {
        let (orig, targs) = match self.tc_objs.types[inst].try_as_named() {
            Some(NamedDetail {
                orig: Some(orig), targs, ..
            }) => (*orig, targs.clone()),
            _ => return,
        };
        let (tparams, under) = match self.tc_objs.types[orig].try_as_named() {
            Some(n) => (n.tparams.clone(), n.underlying),
            None => return,
        };
        let under = match under {
            Some(u) => u,
            None => return,
        };
        let smap = SubstMap::new(&tparams, &targs, self.tc_objs);
        let u = self.subst(under, &smap);
        if let Some(n) = self.tc_objs.types[inst].try_as_named_mut() {
            n.underlying = Some(u);
        }
    }

    /// Expands instances created before their generic type was complete.
    pub(crate) fn expand_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending_expansions);
        let mut waiting = Vec::new();
        for inst in pending {
            let orig = self.tc_objs.types[inst].try_as_named().and_then(|n| n.orig);
            let ready = orig
                .and_then(|o| self.tc_objs.types[o].try_as_named())
                .map_or(false, |n| n.underlying.is_some());
            if ready {
                self.expand_instance(inst);
            } else {
                waiting.push(inst);
            }
        }
        self.pending_expansions.extend(waiting);
    }

    /// A non-generic copy of a generic signature with its type parameters
    /// replaced.
    fn instantiate_signature(&mut self, sig: TypeKey, smap: &SubstMap) -> TypeKey {
        let detail = match self.tc_objs.types[sig].try_as_signature() {
            Some(detail) => detail.clone(),
            None => return sig,
        };
        let params = self.subst(detail.params, smap);
        let results = self.subst(detail.results, smap);
        self.tc_objs.types.insert(Type::Signature(SignatureDetail {
            params,
            results,
            tparams: Vec::new(),
            ..detail
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subst_map_pairs_type_params() {
        let mut objs = TCObjects::new();
        let pkg = objs.new_package("p".to_string());
        let t_obj = objs.new_type_name(Span::dummy(), Some(pkg), "T".to_string(), None);
        let t = objs.new_t_type_param(t_obj, 0, None);
        let int = objs.basic_type(typ::BasicType::Int);
        let smap = SubstMap::new(&[t_obj], &[int], &objs);
        assert_eq!(smap.lookup(t), Some(int));
        assert_eq!(smap.lookup(int), None);
        assert!(SubstMap::default().is_empty());
    }
}
