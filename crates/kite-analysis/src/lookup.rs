//! Field and method lookup.
//!
//! Lookup is a breadth-first search over the embedding graph of a type.
//! Each depth level holds the embedded types reachable through the same
//! number of embedded fields; a name found twice on the shallowest level it
//! appears on is ambiguous. Named types are visited at most once, which
//! bounds the search even for recursive embeddings.

use std::collections::HashSet;

use crate::objects::{ObjKey, PackageKey, TCObjects, TypeKey};
use crate::typ::{self, Type};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupResult {
    /// The field or method, the index path leading to it, and whether a
    /// pointer indirection was crossed on the way.
    Entry {
        obj: ObjKey,
        indices: Vec<usize>,
        indirect: bool,
    },
    /// More than one field or method with the name at the shallowest depth.
    Ambiguous(Vec<usize>),
    /// Only a pointer-receiver method matches and the value is not
    /// addressable.
    PointerRecvOnly,
    NotFound,
}

impl LookupResult {
    pub fn obj(&self) -> Option<ObjKey> {
        match self {
            LookupResult::Entry { obj, .. } => Some(*obj),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
struct EmbeddedType {
    typ: TypeKey,
    indices: Vec<usize>,
    /// A pointer was dereferenced to reach `typ`.
    indirect: bool,
    /// `typ` was reached more than once at this depth.
    multiples: bool,
}

/// Looks up the field or method `name` of `t`. `addressable` says whether a
/// value of type `t` is addressable; `pkg` is the package the lookup is
/// made from and only matters for unexported names.
pub fn lookup_field_or_method(
    t: TypeKey,
    addressable: bool,
    pkg: Option<PackageKey>,
    name: &str,
    objs: &TCObjects,
) -> LookupResult {
    // Methods cannot be associated with a named pointer type, but fields
    // are still reachable through it.
    if let Some(u) = objs.types[t].try_as_named().and_then(|n| n.underlying) {
        if objs.types[u].try_as_pointer().is_some() {
            let result = lookup_impl(u, false, pkg, name, objs);
            if let Some(obj) = result.obj() {
                if objs.lobjs[obj].entity_type().is_func() {
                    return LookupResult::NotFound;
                }
            }
            return result;
        }
    }
    lookup_impl(t, addressable, pkg, name, objs)
}

fn lookup_impl(t: TypeKey, addressable: bool, pkg: Option<PackageKey>, name: &str, objs: &TCObjects) -> LookupResult {
    if name == "_" {
        return LookupResult::NotFound;
    }

    let (typ, is_ptr) = deref(t, objs);
    // *I has no methods when I is an interface.
    if is_ptr && typ::is_interface(typ, objs) {
        return LookupResult::NotFound;
    }

    let mut current = vec![EmbeddedType {
        typ,
        indices: Vec::new(),
        indirect: is_ptr,
        multiples: false,
    }];
    let mut seen: HashSet<TypeKey> = HashSet::new();

    while !current.is_empty() {
        let mut next = Vec::new();
        let mut found: Option<(ObjKey, Vec<usize>, bool)> = None;

        for e in &current {
            let mut search = e.typ;

            if let Some(named) = objs.types[e.typ].try_as_named() {
                if !seen.insert(e.typ) {
                    // Reached at a shallower depth already.
                    continue;
                }
                // Instances share the methods of their origin.
                let methods = match named.orig.and_then(|o| objs.types[o].try_as_named()) {
                    Some(orig) => &orig.methods,
                    None => &named.methods,
                };
                if let Some((i, m)) = find_method(methods, pkg, name, objs) {
                    let indices = concat(&e.indices, i);
                    if found.is_some() || e.multiples {
                        return LookupResult::Ambiguous(indices);
                    }
                    found = Some((m, indices, e.indirect));
                    continue;
                }
                search = typ::underlying_type(e.typ, objs);
            }

            match &objs.types[search] {
                Type::Struct(detail) => {
                    for (i, &f) in detail.fields.iter().enumerate() {
                        let field = &objs.lobjs[f];
                        if field.same_id(pkg, name) {
                            let indices = concat(&e.indices, i);
                            if found.is_some() || e.multiples {
                                return LookupResult::Ambiguous(indices);
                            }
                            found = Some((f, indices, e.indirect));
                            continue;
                        }
                        if found.is_none() && field.var_embedded() {
                            if let Some(ft) = field.typ() {
                                let (ft, is_ptr) = deref(ft, objs);
                                next.push(EmbeddedType {
                                    typ: ft,
                                    indices: concat(&e.indices, i),
                                    indirect: e.indirect || is_ptr,
                                    multiples: e.multiples,
                                });
                            }
                        }
                    }
                }
                Type::Interface(_) => {
                    if let Some((i, m)) = find_method(&typ::all_methods(search, objs), pkg, name, objs) {
                        let indices = concat(&e.indices, i);
                        if found.is_some() || e.multiples {
                            return LookupResult::Ambiguous(indices);
                        }
                        found = Some((m, indices, e.indirect));
                    }
                }
                Type::TypeParam(tp) => {
                    let methods = tp.constraint.map(|c| typ::all_methods(c, objs)).unwrap_or_default();
                    if let Some((i, m)) = find_method(&methods, pkg, name, objs) {
                        let indices = concat(&e.indices, i);
                        if found.is_some() || e.multiples {
                            return LookupResult::Ambiguous(indices);
                        }
                        found = Some((m, indices, e.indirect));
                    }
                }
                _ => {}
            }
        }

        if let Some((obj, indices, indirect)) = found {
            let o = &objs.lobjs[obj];
            if o.func_has_ptr_recv() && !indirect && !addressable {
                return LookupResult::PointerRecvOnly;
            }
            return LookupResult::Entry { obj, indices, indirect };
        }

        current = consolidate_multiples(next, objs);
    }

    LookupResult::NotFound
}

/// Dereferences `t` if it is an unnamed pointer type.
fn deref(t: TypeKey, objs: &TCObjects) -> (TypeKey, bool) {
    match objs.types[t].try_as_pointer() {
        Some(base) => (base, true),
        None => (t, false),
    }
}

fn concat(indices: &[usize], i: usize) -> Vec<usize> {
    let mut v = Vec::with_capacity(indices.len() + 1);
    v.extend_from_slice(indices);
    v.push(i);
    v
}

fn find_method(methods: &[ObjKey], pkg: Option<PackageKey>, name: &str, objs: &TCObjects) -> Option<(usize, ObjKey)> {
    methods
        .iter()
        .enumerate()
        .find(|(_, m)| objs.lobjs[**m].same_id(pkg, name))
        .map(|(i, m)| (i, *m))
}

/// Merges entries with identical types, marking them as reached more than
/// once. The first entry's index path is kept.
fn consolidate_multiples(list: Vec<EmbeddedType>, objs: &TCObjects) -> Vec<EmbeddedType> {
    let mut out: Vec<EmbeddedType> = Vec::with_capacity(list.len());
    for e in list {
        match out.iter_mut().find(|o| typ::identical(o.typ, e.typ, objs)) {
            Some(existing) => existing.multiples = true,
            None => out.push(e),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typ::BasicType;
    use kite_common::span::Span;

    struct Fixture {
        objs: TCObjects,
        pkg: PackageKey,
    }

    impl Fixture {
        fn new() -> Fixture {
            let mut objs = TCObjects::new();
            let pkg = objs.new_package("p".to_string());
            Fixture { objs, pkg }
        }

        fn field(&mut self, name: &str, t: TypeKey, embedded: bool) -> ObjKey {
            self.objs
                .new_field(Span::dummy(), Some(self.pkg), name.to_string(), Some(t), embedded)
        }

        fn named_struct(&mut self, name: &str, fields: Vec<ObjKey>) -> TypeKey {
            let obj = self
                .objs
                .new_type_name(Span::dummy(), Some(self.pkg), name.to_string(), None);
            let s = self.objs.new_t_struct(fields);
            self.objs.new_t_named(Some(obj), Some(s), Vec::new())
        }

        fn method(&mut self, on: TypeKey, name: &str, ptr_recv: bool) -> ObjKey {
            let tuple = self.objs.universe().no_value_tuple();
            let sig = self.objs.new_t_signature(None, None, tuple, tuple, false);
            let m = self
                .objs
                .new_func(Span::dummy(), Some(self.pkg), name.to_string(), Some(sig));
            self.objs.lobjs[m].set_func_has_ptr_recv(ptr_recv);
            if let Some(n) = self.objs.types[on].try_as_named_mut() {
                n.methods.push(m);
            }
            m
        }

        fn lookup(&self, t: TypeKey, addressable: bool, name: &str) -> LookupResult {
            lookup_field_or_method(t, addressable, Some(self.pkg), name, &self.objs)
        }
    }

    #[test]
    fn test_promoted_field_through_pointer_embedding() {
        let mut fx = Fixture::new();
        let int = fx.objs.basic_type(BasicType::Int);
        let x = fx.field("X", int, false);
        let base = fx.named_struct("Base", vec![x]);
        let base_ptr = fx.objs.new_t_pointer(base);
        let emb = fx.field("Base", base_ptr, true);
        let outer = fx.named_struct("Outer", vec![emb]);

        assert_eq!(
            fx.lookup(outer, true, "X"),
            LookupResult::Entry {
                obj: x,
                indices: vec![0, 0],
                indirect: true
            }
        );
    }

    #[test]
    fn test_equal_depth_methods_are_ambiguous() {
        let mut fx = Fixture::new();
        let a = fx.named_struct("A", Vec::new());
        let b = fx.named_struct("B", Vec::new());
        fx.method(a, "M", false);
        fx.method(b, "M", false);
        let fa = fx.field("A", a, true);
        let fb = fx.field("B", b, true);
        let outer = fx.named_struct("Outer", vec![fa, fb]);

        assert_eq!(fx.lookup(outer, true, "M"), LookupResult::Ambiguous(vec![1, 0]));
    }

    #[test]
    fn test_shallower_method_wins() {
        let mut fx = Fixture::new();
        let inner = fx.named_struct("Inner", Vec::new());
        fx.method(inner, "M", false);
        let fi = fx.field("Inner", inner, true);
        let mid = fx.named_struct("Mid", vec![fi]);
        let other = fx.named_struct("Other", Vec::new());
        let shallow = fx.method(other, "M", false);
        let fm = fx.field("Mid", mid, true);
        let fo = fx.field("Other", other, true);
        let outer = fx.named_struct("Outer", vec![fm, fo]);

        assert_eq!(fx.lookup(outer, false, "M").obj(), Some(shallow));
    }

    #[test]
    fn test_pointer_method_requires_addressable_value() {
        let mut fx = Fixture::new();
        let t = fx.named_struct("T", Vec::new());
        let m = fx.method(t, "Set", true);
        assert_eq!(fx.lookup(t, false, "Set"), LookupResult::PointerRecvOnly);
        assert_eq!(fx.lookup(t, true, "Set").obj(), Some(m));
        let ptr = fx.objs.new_t_pointer(t);
        assert_eq!(fx.lookup(ptr, false, "Set").obj(), Some(m));
    }

    #[test]
    fn test_unexported_name_from_other_package() {
        let mut fx = Fixture::new();
        let int = fx.objs.basic_type(BasicType::Int);
        let x = fx.field("x", int, false);
        let t = fx.named_struct("T", vec![x]);
        let other = fx.objs.new_package("q".to_string());
        assert_eq!(fx.lookup(t, true, "x").obj(), Some(x));
        assert_eq!(
            lookup_field_or_method(t, true, Some(other), "x", &fx.objs),
            LookupResult::NotFound
        );
    }

    #[test]
    fn test_recursive_embedding_terminates() {
        let mut fx = Fixture::new();
        let obj = fx
            .objs
            .new_type_name(Span::dummy(), Some(fx.pkg), "R".to_string(), None);
        let r = fx.objs.new_t_named(Some(obj), None, Vec::new());
        let r_ptr = fx.objs.new_t_pointer(r);
        let emb = fx.field("R", r_ptr, true);
        let s = fx.objs.new_t_struct(vec![emb]);
        if let Some(n) = fx.objs.types[r].try_as_named_mut() {
            n.underlying = Some(s);
        }
        assert_eq!(fx.lookup(r, true, "Missing"), LookupResult::NotFound);
    }
}
