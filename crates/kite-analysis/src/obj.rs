//! Language objects.
//!
//! A `LangObj` describes a named entity: an imported package name, a
//! constant, a type name, a variable (including parameters and struct
//! fields), a function or method, a builtin, or `nil`.

use kite_common::span::Span;

pub use crate::constant::Value as ConstValue;
use crate::objects::{ObjKey, PackageKey, ScopeKey, TypeKey};

/// Returns true if `name` starts with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().map_or(false, char::is_uppercase)
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct VarProperty {
    pub embedded: bool,
    pub is_field: bool,
    pub used: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Append,
    Cap,
    Copy,
    Delete,
    Len,
    Make,
    New,
    Panic,
    Print,
    Println,
    Recover,
}

impl Builtin {
    pub const ALL: [Builtin; 11] = [
        Builtin::Append,
        Builtin::Cap,
        Builtin::Copy,
        Builtin::Delete,
        Builtin::Len,
        Builtin::Make,
        Builtin::New,
        Builtin::Panic,
        Builtin::Print,
        Builtin::Println,
        Builtin::Recover,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Append => "append",
            Builtin::Cap => "cap",
            Builtin::Copy => "copy",
            Builtin::Delete => "delete",
            Builtin::Len => "len",
            Builtin::Make => "make",
            Builtin::New => "new",
            Builtin::Panic => "panic",
            Builtin::Print => "print",
            Builtin::Println => "println",
            Builtin::Recover => "recover",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityType {
    /// An imported package.
    PkgName { imported: PackageKey, used: bool },
    Const { val: ConstValue },
    /// A name for a defined or alias type.
    TypeName,
    /// A variable, parameter, result or struct field.
    Var(VarProperty),
    /// A function or method. Specialized copies of generic methods point
    /// back at the declared method through `origin`.
    Func {
        has_ptr_recv: bool,
        origin: Option<ObjKey>,
    },
    Builtin(Builtin),
    Nil,
}

impl EntityType {
    pub fn is_pkg_name(&self) -> bool {
        matches!(self, EntityType::PkgName { .. })
    }

    pub fn is_const(&self) -> bool {
        matches!(self, EntityType::Const { .. })
    }

    pub fn is_type_name(&self) -> bool {
        matches!(self, EntityType::TypeName)
    }

    pub fn is_var(&self) -> bool {
        matches!(self, EntityType::Var(_))
    }

    pub fn is_func(&self) -> bool {
        matches!(self, EntityType::Func { .. })
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, EntityType::Builtin(_))
    }

    pub fn var_property(&self) -> Option<&VarProperty> {
        match self {
            EntityType::Var(prop) => Some(prop),
            _ => None,
        }
    }

    pub fn var_property_mut(&mut self) -> Option<&mut VarProperty> {
        match self {
            EntityType::Var(prop) => Some(prop),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LangObj {
    entity_type: EntityType,
    parent: Option<ScopeKey>,
    span: Span,
    pkg: Option<PackageKey>,
    name: String,
    typ: Option<TypeKey>,
}

impl LangObj {
    fn new(
        entity_type: EntityType,
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
    ) -> LangObj {
        LangObj {
            entity_type,
            parent: None,
            span,
            pkg,
            name,
            typ,
        }
    }

    pub fn new_pkg_name(span: Span, pkg: Option<PackageKey>, name: String, imported: PackageKey) -> LangObj {
        LangObj::new(EntityType::PkgName { imported, used: false }, span, pkg, name, None)
    }

    pub fn new_const(
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
        val: ConstValue,
    ) -> LangObj {
        LangObj::new(EntityType::Const { val }, span, pkg, name, typ)
    }

    pub fn new_type_name(span: Span, pkg: Option<PackageKey>, name: String, typ: Option<TypeKey>) -> LangObj {
        LangObj::new(EntityType::TypeName, span, pkg, name, typ)
    }

    pub fn new_var(span: Span, pkg: Option<PackageKey>, name: String, typ: Option<TypeKey>) -> LangObj {
        LangObj::new(EntityType::Var(VarProperty::default()), span, pkg, name, typ)
    }

    pub fn new_param(span: Span, pkg: Option<PackageKey>, name: String, typ: Option<TypeKey>) -> LangObj {
        let prop = VarProperty {
            used: true,
            ..VarProperty::default()
        };
        LangObj::new(EntityType::Var(prop), span, pkg, name, typ)
    }

    pub fn new_field(
        span: Span,
        pkg: Option<PackageKey>,
        name: String,
        typ: Option<TypeKey>,
        embedded: bool,
    ) -> LangObj {
        let prop = VarProperty {
            embedded,
            is_field: true,
            used: false,
        };
        LangObj::new(EntityType::Var(prop), span, pkg, name, typ)
    }

    pub fn new_func(span: Span, pkg: Option<PackageKey>, name: String, typ: Option<TypeKey>) -> LangObj {
        LangObj::new(
            EntityType::Func {
                has_ptr_recv: false,
                origin: None,
            },
            span,
            pkg,
            name,
            typ,
        )
    }

    pub fn new_builtin(f: Builtin, typ: TypeKey) -> LangObj {
        LangObj::new(EntityType::Builtin(f), Span::dummy(), None, f.name().to_string(), Some(typ))
    }

    pub fn new_nil(typ: TypeKey) -> LangObj {
        LangObj::new(EntityType::Nil, Span::dummy(), None, "nil".to_string(), Some(typ))
    }

    /// Copies a method for specialization. The copy shares nothing mutable
    /// with the original and records it as its origin.
    pub fn specialized_copy(&self, origin: ObjKey, typ: TypeKey) -> LangObj {
        let has_ptr_recv = self.func_has_ptr_recv();
        LangObj {
            entity_type: EntityType::Func {
                has_ptr_recv,
                origin: Some(origin),
            },
            parent: self.parent,
            span: self.span,
            pkg: self.pkg,
            name: self.name.clone(),
            typ: Some(typ),
        }
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn entity_type_mut(&mut self) -> &mut EntityType {
        &mut self.entity_type
    }

    pub fn parent(&self) -> Option<ScopeKey> {
        self.parent
    }

    pub fn set_parent(&mut self, parent: Option<ScopeKey>) {
        self.parent = parent;
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn pkg(&self) -> Option<PackageKey> {
        self.pkg
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn typ(&self) -> Option<TypeKey> {
        self.typ
    }

    pub fn set_type(&mut self, typ: Option<TypeKey>) {
        self.typ = typ;
    }

    pub fn exported(&self) -> bool {
        is_exported(&self.name)
    }

    /// Reports whether the object has the given package-qualified name.
    /// Exported names match regardless of package.
    pub fn same_id(&self, pkg: Option<PackageKey>, name: &str) -> bool {
        if name != self.name {
            return false;
        }
        if self.exported() {
            return true;
        }
        pkg == self.pkg
    }

    pub fn const_val(&self) -> Option<&ConstValue> {
        match &self.entity_type {
            EntityType::Const { val } => Some(val),
            _ => None,
        }
    }

    pub fn set_const_val(&mut self, v: ConstValue) {
        if let EntityType::Const { val } = &mut self.entity_type {
            *val = v;
        }
    }

    pub fn var_embedded(&self) -> bool {
        self.entity_type.var_property().map_or(false, |p| p.embedded)
    }

    pub fn set_var_used(&mut self) {
        if let Some(prop) = self.entity_type.var_property_mut() {
            prop.used = true;
        }
    }

    pub fn func_has_ptr_recv(&self) -> bool {
        matches!(self.entity_type, EntityType::Func { has_ptr_recv: true, .. })
    }

    pub fn set_func_has_ptr_recv(&mut self, v: bool) {
        if let EntityType::Func { has_ptr_recv, .. } = &mut self.entity_type {
            *has_ptr_recv = v;
        }
    }

    pub fn func_origin(&self) -> Option<ObjKey> {
        match self.entity_type {
            EntityType::Func { origin, .. } => origin,
            _ => None,
        }
    }

    pub fn pkg_name_imported(&self) -> Option<PackageKey> {
        match self.entity_type {
            EntityType::PkgName { imported, .. } => Some(imported),
            _ => None,
        }
    }

    pub fn set_pkg_name_used(&mut self) {
        if let EntityType::PkgName { used, .. } = &mut self.entity_type {
            *used = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaKey;

    #[test]
    fn test_exported() {
        assert!(is_exported("Foo"));
        assert!(!is_exported("foo"));
        assert!(!is_exported("_Foo"));
        assert!(!is_exported(""));
    }

    #[test]
    fn test_same_id_respects_package_for_unexported() {
        let p = PackageKey::from_usize(0);
        let q = PackageKey::from_usize(1);
        let field = LangObj::new_field(Span::dummy(), Some(p), "x".into(), None, false);
        assert!(field.same_id(Some(p), "x"));
        assert!(!field.same_id(Some(q), "x"));
        let exported = LangObj::new_field(Span::dummy(), Some(p), "X".into(), None, false);
        assert!(exported.same_id(Some(q), "X"));
    }

    #[test]
    fn test_specialized_copy_keeps_origin() {
        let mut m = LangObj::new_func(Span::dummy(), None, "Push".into(), None);
        m.set_func_has_ptr_recv(true);
        let origin = ObjKey::from_usize(7);
        let copy = m.specialized_copy(origin, TypeKey::from_usize(3));
        assert_eq!(copy.func_origin(), Some(origin));
        assert!(copy.func_has_ptr_recv());
        assert_eq!(m.func_origin(), None);
        assert_eq!(m.typ(), None);
    }
}
