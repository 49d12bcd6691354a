//! The universe scope: predeclared types, constants and builtins.

use std::collections::HashMap;

use kite_common::span::Span;

use crate::constant;
use crate::obj::{Builtin, LangObj};
use crate::objects::{ObjKey, ScopeKey, TCObjects, TypeKey};
use crate::scope::Scope;
use crate::typ::{BasicType, Type};

/// Argument requirements of a builtin.
#[derive(Copy, Clone, Debug)]
pub struct BuiltinInfo {
    pub name: &'static str,
    /// Minimum number of arguments.
    pub arg_count: usize,
    pub variadic: bool,
}

#[derive(Debug)]
pub struct Universe {
    scope: ScopeKey,
    iota: ObjKey,
    byte: TypeKey,
    rune: TypeKey,
    any: TypeKey,
    comparable: TypeKey,
    error_type: TypeKey,
    no_value_tuple: TypeKey,
    types: HashMap<BasicType, TypeKey>,
    builtins: HashMap<Builtin, BuiltinInfo>,
}

impl Universe {
    /// Populates a fresh universe scope. Runs before `objs.universe` is set,
    /// so nothing here may go through the universe accessors.
    pub fn new(objs: &mut TCObjects) -> Universe {
        let scope = objs.new_scope(None, "universe");

        let mut types = HashMap::new();
        for b in BasicType::ALL {
            types.insert(b, objs.types.insert(Type::Basic(b)));
        }
        for b in BasicType::ALL {
            if b == BasicType::Invalid || b.is_untyped() {
                continue;
            }
            Self::define_type_name(objs, scope, b.name(), types[&b]);
        }
        let byte = types[&BasicType::Uint8];
        let rune = types[&BasicType::Int32];
        Self::define_type_name(objs, scope, "byte", byte);
        Self::define_type_name(objs, scope, "rune", rune);

        let no_value_tuple = objs.new_t_tuple(Vec::new());

        // any = interface{}
        let any = objs.new_t_interface(Vec::new(), Vec::new());
        Self::define_type_name(objs, scope, "any", any);

        // comparable is a named interface only comparable types implement.
        let comparable_obj = objs.new_type_name(Span::dummy(), None, "comparable".to_string(), None);
        let comparable_iface = objs.new_t_interface(Vec::new(), Vec::new());
        if let Some(iface) = objs.types[comparable_iface].try_as_interface_mut() {
            iface.is_comparable = true;
        }
        let comparable = objs.new_t_named(Some(comparable_obj), Some(comparable_iface), Vec::new());
        Scope::insert(scope, comparable_obj, objs);

        // type error interface { Error() string }
        let error_obj = objs.new_type_name(Span::dummy(), None, "error".to_string(), None);
        let error_type = objs.new_t_named(Some(error_obj), None, Vec::new());
        let string_result = objs.new_var(Span::dummy(), None, String::new(), Some(types[&BasicType::Str]));
        let results = objs.new_t_tuple(vec![string_result]);
        let recv = objs.new_var(Span::dummy(), None, String::new(), Some(error_type));
        let sig = objs.new_t_signature(None, Some(recv), no_value_tuple, results, false);
        let error_method = objs.new_func(Span::dummy(), None, "Error".to_string(), Some(sig));
        let error_iface = objs.new_t_interface(vec![error_method], Vec::new());
        if let Some(named) = objs.types[error_type].try_as_named_mut() {
            named.underlying = Some(error_iface);
        }
        Scope::insert(scope, error_obj, objs);

        let untyped_bool = types[&BasicType::UntypedBool];
        for (name, val) in [("true", true), ("false", false)] {
            let obj = objs.new_const(
                Span::dummy(),
                None,
                name.to_string(),
                Some(untyped_bool),
                constant::make_bool(val),
            );
            Scope::insert(scope, obj, objs);
        }
        let iota = objs.new_const(
            Span::dummy(),
            None,
            "iota".to_string(),
            Some(types[&BasicType::UntypedInt]),
            constant::make_int64(0),
        );
        Scope::insert(scope, iota, objs);

        let nil = objs.lobjs.insert(LangObj::new_nil(types[&BasicType::UntypedNil]));
        Scope::insert(scope, nil, objs);

        let invalid = types[&BasicType::Invalid];
        let builtins = Self::builtin_infos();
        for f in Builtin::ALL {
            let obj = objs.lobjs.insert(LangObj::new_builtin(f, invalid));
            Scope::insert(scope, obj, objs);
        }

        Universe {
            scope,
            iota,
            byte,
            rune,
            any,
            comparable,
            error_type,
            no_value_tuple,
            types,
            builtins,
        }
    }

    fn define_type_name(objs: &mut TCObjects, scope: ScopeKey, name: &str, typ: TypeKey) {
        let obj = objs.new_type_name(Span::dummy(), None, name.to_string(), Some(typ));
        Scope::insert(scope, obj, objs);
    }

    fn builtin_infos() -> HashMap<Builtin, BuiltinInfo> {
        let info = |f: Builtin, arg_count, variadic| {
            (
                f,
                BuiltinInfo {
                    name: f.name(),
                    arg_count,
                    variadic,
                },
            )
        };
        HashMap::from([
            info(Builtin::Append, 1, true),
            info(Builtin::Cap, 1, false),
            info(Builtin::Copy, 2, false),
            info(Builtin::Delete, 2, false),
            info(Builtin::Len, 1, false),
            info(Builtin::Make, 1, true),
            info(Builtin::New, 1, false),
            info(Builtin::Panic, 1, false),
            info(Builtin::Print, 0, true),
            info(Builtin::Println, 0, true),
            info(Builtin::Recover, 0, false),
        ])
    }

    pub fn scope(&self) -> ScopeKey {
        self.scope
    }

    pub fn iota(&self) -> ObjKey {
        self.iota
    }

    pub fn byte(&self) -> TypeKey {
        self.byte
    }

    pub fn rune(&self) -> TypeKey {
        self.rune
    }

    /// The empty interface.
    pub fn any_type(&self) -> TypeKey {
        self.any
    }

    pub fn comparable_type(&self) -> TypeKey {
        self.comparable
    }

    pub fn error_type(&self) -> TypeKey {
        self.error_type
    }

    pub fn no_value_tuple(&self) -> TypeKey {
        self.no_value_tuple
    }

    pub fn basic_type(&self, b: BasicType) -> TypeKey {
        self.types[&b]
    }

    pub fn builtin_info(&self, f: Builtin) -> &BuiltinInfo {
        &self.builtins[&f]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::EntityType;
    use crate::typ;

    #[test]
    fn test_predeclared_names() {
        let objs = TCObjects::new();
        let u = objs.universe();
        let lookup = |name: &str| objs.scopes[u.scope()].lookup(name);
        for name in ["int", "string", "byte", "rune", "any", "comparable", "error", "true", "nil", "len", "append"] {
            assert!(lookup(name).is_some(), "{} missing", name);
        }
        assert!(lookup("complex128").is_none());
        let byte = lookup("byte").and_then(|o| objs.lobjs[o].typ());
        assert_eq!(byte, Some(objs.basic_type(BasicType::Uint8)));
        let len = lookup("len").map(|o| objs.lobjs[o].entity_type().clone());
        assert_eq!(len, Some(EntityType::Builtin(Builtin::Len)));
    }

    #[test]
    fn test_error_and_comparable() {
        let objs = TCObjects::new();
        let u = objs.universe();
        let methods = typ::all_methods(u.error_type(), &objs);
        assert_eq!(methods.len(), 1);
        assert_eq!(objs.lobjs[methods[0]].name(), "Error");
        assert!(typ::interface_is_comparable(u.comparable_type(), &objs));
        assert!(typ::is_empty_interface(u.any_type(), &objs));
        assert_eq!(typ::type_string(u.any_type(), &objs), "any");
        assert_eq!(typ::type_string(u.error_type(), &objs), "error");
    }

    #[test]
    fn test_builtin_arities() {
        let objs = TCObjects::new();
        let u = objs.universe();
        assert_eq!(u.builtin_info(Builtin::Copy).arg_count, 2);
        assert!(u.builtin_info(Builtin::Append).variadic);
        assert!(!u.builtin_info(Builtin::Recover).variadic);
    }
}
