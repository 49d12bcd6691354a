//! Method sets against interfaces.

use crate::lookup::{lookup_field_or_method, LookupResult};
use crate::objects::{ObjKey, TypeKey};
use crate::typ::{self, SignatureDetail, Type};

use super::subst::SubstMap;
use super::Checker;

impl<'a> Checker<'a> {
    /// Finds a method of interface `iface` that `v` does not implement.
    /// Returns the method and whether `v` has it with the wrong type.
    ///
    /// If `v` is an interface and `is_static` is false, methods missing from
    /// `v` are fine: a dynamic value may still have them.
    pub(crate) fn missing_method(&mut self, v: TypeKey, iface: TypeKey, is_static: bool) -> Option<(ObjKey, bool)> {
        let methods = typ::all_methods(iface, self.tc_objs);
        if methods.is_empty() {
            return None;
        }

        if self.tc_objs.types[v].try_as_type_param().is_none() && typ::is_interface(v, self.tc_objs) {
            let vmethods = typ::all_methods(v, self.tc_objs);
            for m in methods {
                let (mpkg, mname, mtyp) = {
                    let lobj = &self.tc_objs.lobjs[m];
                    (lobj.pkg(), lobj.name().to_string(), lobj.typ())
                };
                let found = vmethods
                    .iter()
                    .copied()
                    .find(|f| self.tc_objs.lobjs[*f].same_id(mpkg, &mname));
                match found {
                    None if is_static => return Some((m, false)),
                    None => {}
                    Some(f) => {
                        if !typ::identical_opt(self.tc_objs.lobjs[f].typ(), mtyp, self.tc_objs) {
                            return Some((m, true));
                        }
                    }
                }
            }
            return None;
        }

        for m in methods {
            let (mpkg, mname, mtyp) = {
                let lobj = &self.tc_objs.lobjs[m];
                (lobj.pkg(), lobj.name().to_string(), lobj.typ())
            };
            let (f, indices) = match lookup_field_or_method(v, false, mpkg, &mname, self.tc_objs) {
                LookupResult::Entry { obj, indices, .. } if self.tc_objs.lobjs[obj].entity_type().is_func() => {
                    (obj, indices)
                }
                _ => return Some((m, false)),
            };
            // The method's signature may not be complete yet.
            self.obj_decl(f);
            let ftyp = self.method_sig_at(v, f, &indices);
            if !typ::identical_opt(ftyp, mtyp, self.tc_objs) {
                return Some((m, true));
            }
        }
        None
    }

    /// For `x.(T)`: a method of `iface` that `t` lacks, if `t` is a concrete
    /// type. An interface `t` may always hold a suitable value.
    pub(crate) fn assertable_to(&mut self, iface: TypeKey, t: TypeKey) -> Option<(ObjKey, bool)> {
        if typ::is_interface(t, self.tc_objs) {
            return None;
        }
        self.missing_method(t, iface, false)
    }

    /// The signature of method `m` as seen on `v`, where `indices` is the
    /// lookup path. Methods of generic types get the receiver's type
    /// arguments.
    fn method_sig_at(&mut self, v: TypeKey, m: ObjKey, indices: &[usize]) -> Option<TypeKey> {
        let sig_t = self.tc_objs.lobjs[m].typ()?;
        let rparams = match self.tc_objs.types[sig_t].try_as_signature() {
            Some(sig) if !sig.rparams.is_empty() => sig.rparams.clone(),
            _ => return Some(sig_t),
        };
        let base = self.embedded_base(v, indices);
        let targs = match self.tc_objs.types[base].try_as_named() {
            Some(n) if n.targs.len() == rparams.len() => n.targs.clone(),
            _ => return Some(sig_t),
        };
        let smap = SubstMap::new(&rparams, &targs, self.tc_objs);
        Some(self.subst(sig_t, &smap))
    }

    /// The type, with any pointer removed, in which the field or method at
    /// the end of `indices` was found.
    pub(crate) fn embedded_base(&self, t: TypeKey, indices: &[usize]) -> TypeKey {
        let objs = &*self.tc_objs;
        let deref = |t: TypeKey| objs.types[t].try_as_pointer().unwrap_or(t);
        let mut cur = deref(t);
        let path = match indices.split_last() {
            Some((_, path)) => path,
            None => return cur,
        };
        for &i in path {
            let u = typ::underlying_type(cur, objs);
            let field_t = objs.types[u]
                .try_as_struct()
                .and_then(|s| s.fields.get(i))
                .and_then(|f| objs.lobjs[*f].typ());
            match field_t {
                Some(ft) => cur = deref(ft),
                None => break,
            }
        }
        cur
    }

    /// A copy of `sig` without its receiver type parameters.
    pub(crate) fn strip_rparams(&mut self, sig: TypeKey) -> TypeKey {
        match self.tc_objs.types[sig].try_as_signature() {
            Some(detail) => {
                let detail = SignatureDetail {
                    rparams: Vec::new(),
                    ..detail.clone()
                };
                self.tc_objs.types.insert(Type::Signature(detail))
            }
            None => sig,
        }
    }
}
