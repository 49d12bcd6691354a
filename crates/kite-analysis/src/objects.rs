//! Central container for all type checking objects.
//!
//! Objects, types, scopes and packages are allocated in arenas and referred
//! to by typed keys. One `TCObjects` is shared by every package of a project
//! so that keys stay valid across package boundaries.

use kite_common::span::Span;

use crate::arena::Arena;
use crate::obj::{ConstValue, LangObj};
use crate::package::Package;
use crate::scope::Scope;
use crate::typ::{
    ArrayDetail, BasicType, InterfaceDetail, MapDetail, NamedDetail, SignatureDetail, StructDetail,
    TupleDetail, Type, TypeParamDetail,
};
use crate::universe::Universe;

crate::define_key! {
    /// Key for language objects.
    pub struct ObjKey;

    pub struct TypeKey;

    pub struct ScopeKey;

    pub struct PackageKey;
}

pub type LangObjs = Arena<ObjKey, LangObj>;
pub type Types = Arena<TypeKey, Type>;
pub type Scopes = Arena<ScopeKey, Scope>;
pub type Packages = Arena<PackageKey, Package>;

pub struct TCObjects {
    pub lobjs: LangObjs,
    pub types: Types,
    pub scopes: Scopes,
    pub pkgs: Packages,
    pub universe: Option<Universe>,
    /// Names declared in this package are printed unqualified.
    pub fmt_pkg: Option<PackageKey>,
}

impl Default for TCObjects {
    fn default() -> Self {
        Self::new()
    }
}

impl TCObjects {
    pub fn new() -> Self {
        let mut objs = Self {
            lobjs: Arena::new(),
            types: Arena::new(),
            scopes: Arena::new(),
            pkgs: Arena::new(),
            universe: None,
            fmt_pkg: None,
        };
        objs.universe = Some(Universe::new(&mut objs));
        objs
    }

    pub fn universe(&self) -> &Universe {
        self.universe.as_ref().expect("universe not initialized")
    }

    pub fn basic_type(&self, b: BasicType) -> TypeKey {
        self.universe().basic_type(b)
    }

    pub fn invalid_type(&self) -> TypeKey {
        self.basic_type(BasicType::Invalid)
    }

    // ----------------------------------------------------------------------------
    // Objects

    pub fn new_scope(&mut self, parent: Option<ScopeKey>, comment: &str) -> ScopeKey {
        let scope = self.scopes.insert(Scope::new(parent, comment.to_string()));
        if let Some(p) = parent {
            self.scopes[p].add_child(scope);
        }
        scope
    }

    /// Creates a package whose scope is a child of the universe scope.
    pub fn new_package(&mut self, path: String) -> PackageKey {
        let universe_scope = self.universe.as_ref().map(Universe::scope);
        let scope = self.new_scope(universe_scope, &format!("package {}", path));
        self.pkgs.insert(Package::new(path, scope))
    }

    pub fn new_pkg_name(
        &mut self,
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        imported: PackageKey,
    ) -> ObjKey {
        self.lobjs.insert(LangObj::new_pkg_name(span, pkg, name, imported))
    }

    pub fn new_const(
        &mut self,
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
        val: ConstValue,
    ) -> ObjKey {
        self.lobjs.insert(LangObj::new_const(span, pkg, name, typ, val))
    }

    pub fn new_type_name(
        &mut self,
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
    ) -> ObjKey {
        self.lobjs.insert(LangObj::new_type_name(span, pkg, name, typ))
    }

    pub fn new_var(&mut self, span: Span, pkg: Option<PackageKey>, name: String, typ: Option<TypeKey>) -> ObjKey {
        self.lobjs.insert(LangObj::new_var(span, pkg, name, typ))
    }

    pub fn new_param(&mut self, span: Span, pkg: Option<PackageKey>, name: String, typ: Option<TypeKey>) -> ObjKey {
        self.lobjs.insert(LangObj::new_param(span, pkg, name, typ))
    }

    pub fn new_field(
        &mut self,
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
        embedded: bool,
    ) -> ObjKey {
        self.lobjs.insert(LangObj::new_field(span, pkg, name, typ, embedded))
    }

    pub fn new_func(&mut self, span: Span, pkg: Option<PackageKey>, name: String, typ: Option<TypeKey>) -> ObjKey {
        self.lobjs.insert(LangObj::new_func(span, pkg, name, typ))
    }

    // ----------------------------------------------------------------------------
    // Types

    pub fn new_t_array(&mut self, elem: TypeKey, len: Option<u64>) -> TypeKey {
        self.types.insert(Type::Array(ArrayDetail { elem, len }))
    }

    pub fn new_t_slice(&mut self, elem: TypeKey) -> TypeKey {
        self.types.insert(Type::Slice(elem))
    }

    pub fn new_t_struct(&mut self, fields: Vec<ObjKey>) -> TypeKey {
        self.types.insert(Type::Struct(StructDetail { fields }))
    }

    pub fn new_t_pointer(&mut self, base: TypeKey) -> TypeKey {
        self.types.insert(Type::Pointer(base))
    }

    pub fn new_t_tuple(&mut self, vars: Vec<ObjKey>) -> TypeKey {
        self.types.insert(Type::Tuple(TupleDetail { vars }))
    }

    pub fn new_t_signature(
        &mut self,
        scope: Option<ScopeKey>,
        recv: Option<ObjKey>,
        params: TypeKey,
        results: TypeKey,
        variadic: bool,
    ) -> TypeKey {
        self.types.insert(Type::Signature(SignatureDetail {
            scope,
            recv,
            params,
            results,
            variadic,
            tparams: Vec::new(),
            rparams: Vec::new(),
        }))
    }

    pub fn new_t_interface(&mut self, methods: Vec<ObjKey>, embeddeds: Vec<TypeKey>) -> TypeKey {
        self.types.insert(Type::Interface(InterfaceDetail {
            methods,
            embeddeds,
            is_comparable: false,
        }))
    }

    pub fn new_t_map(&mut self, key: TypeKey, elem: TypeKey) -> TypeKey {
        self.types.insert(Type::Map(MapDetail { key, elem }))
    }

    /// Creates a named type and, if given, points the type name at it.
    pub fn new_t_named(&mut self, obj: Option<ObjKey>, underlying: Option<TypeKey>, methods: Vec<ObjKey>) -> TypeKey {
        let t = self.types.insert(Type::Named(NamedDetail {
            obj,
            orig: None,
            underlying,
            methods,
            tparams: Vec::new(),
            targs: Vec::new(),
        }));
        if let Some(o) = obj {
            if self.lobjs[o].typ().is_none() {
                self.lobjs[o].set_type(Some(t));
            }
        }
        t
    }

    pub fn new_t_type_param(&mut self, obj: ObjKey, index: usize, constraint: Option<TypeKey>) -> TypeKey {
        let t = self.types.insert(Type::TypeParam(TypeParamDetail { obj, index, constraint }));
        self.lobjs[obj].set_type(Some(t));
        t
    }

    // ----------------------------------------------------------------------------
    // Accessors used throughout the checker

    /// The variables of a tuple type.
    pub fn tuple_vars(&self, t: TypeKey) -> &[ObjKey] {
        match self.types[t].try_as_tuple() {
            Some(tuple) => &tuple.vars,
            None => &[],
        }
    }

    /// The types of a tuple's variables; unset types read as invalid.
    pub fn tuple_types(&self, t: TypeKey) -> Vec<TypeKey> {
        self.tuple_vars(t)
            .iter()
            .map(|v| self.lobjs[*v].typ().unwrap_or_else(|| self.invalid_type()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_package_scope_chain() {
        let mut objs = TCObjects::new();
        let pkg = objs.new_package("a/b".to_string());
        let scope = objs.pkgs[pkg].scope();
        assert_eq!(objs.scopes[scope].parent(), Some(objs.universe().scope()));
        assert_eq!(objs.pkgs[pkg].path(), "a/b");
    }

    #[test]
    fn test_named_type_sets_object_type() {
        let mut objs = TCObjects::new();
        let obj = objs.new_type_name(Span::dummy(), None, "T".to_string(), None);
        let t = objs.new_t_named(Some(obj), None, Vec::new());
        assert_eq!(objs.lobjs[obj].typ(), Some(t));
    }

    #[test]
    fn test_tuple_types() {
        let mut objs = TCObjects::new();
        let int = objs.basic_type(BasicType::Int);
        let a = objs.new_param(Span::dummy(), None, "a".to_string(), Some(int));
        let b = objs.new_param(Span::dummy(), None, "b".to_string(), None);
        let tuple = objs.new_t_tuple(vec![a, b]);
        assert_eq!(objs.tuple_types(tuple), vec![int, objs.invalid_type()]);
    }
}
