//! Type representations.
//!
//! Types live in the `TCObjects` type arena. Most predicates take the arena
//! because they need to look through named types to the underlying type.

use std::collections::HashSet;
use std::fmt::{self, Write};

use crate::objects::{ObjKey, ScopeKey, TCObjects, TypeKey};

// =============================================================================
// Basic types
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BasicType {
    Invalid,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Str,
    // Untyped kinds, ordered so that a numeric kind later in the list can
    // represent every value of an earlier one.
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedString,
    UntypedNil,
}

impl BasicType {
    pub const ALL: [BasicType; 22] = [
        BasicType::Invalid,
        BasicType::Bool,
        BasicType::Int,
        BasicType::Int8,
        BasicType::Int16,
        BasicType::Int32,
        BasicType::Int64,
        BasicType::Uint,
        BasicType::Uint8,
        BasicType::Uint16,
        BasicType::Uint32,
        BasicType::Uint64,
        BasicType::Uintptr,
        BasicType::Float32,
        BasicType::Float64,
        BasicType::Str,
        BasicType::UntypedBool,
        BasicType::UntypedInt,
        BasicType::UntypedRune,
        BasicType::UntypedFloat,
        BasicType::UntypedString,
        BasicType::UntypedNil,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BasicType::Invalid => "invalid type",
            BasicType::Bool => "bool",
            BasicType::Int => "int",
            BasicType::Int8 => "int8",
            BasicType::Int16 => "int16",
            BasicType::Int32 => "int32",
            BasicType::Int64 => "int64",
            BasicType::Uint => "uint",
            BasicType::Uint8 => "uint8",
            BasicType::Uint16 => "uint16",
            BasicType::Uint32 => "uint32",
            BasicType::Uint64 => "uint64",
            BasicType::Uintptr => "uintptr",
            BasicType::Float32 => "float32",
            BasicType::Float64 => "float64",
            BasicType::Str => "string",
            BasicType::UntypedBool => "untyped bool",
            BasicType::UntypedInt => "untyped int",
            BasicType::UntypedRune => "untyped rune",
            BasicType::UntypedFloat => "untyped float",
            BasicType::UntypedString => "untyped string",
            BasicType::UntypedNil => "untyped nil",
        }
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, BasicType::Bool | BasicType::UntypedBool)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BasicType::Int
                | BasicType::Int8
                | BasicType::Int16
                | BasicType::Int32
                | BasicType::Int64
                | BasicType::Uint
                | BasicType::Uint8
                | BasicType::Uint16
                | BasicType::Uint32
                | BasicType::Uint64
                | BasicType::Uintptr
                | BasicType::UntypedInt
                | BasicType::UntypedRune
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            BasicType::Uint
                | BasicType::Uint8
                | BasicType::Uint16
                | BasicType::Uint32
                | BasicType::Uint64
                | BasicType::Uintptr
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, BasicType::Float32 | BasicType::Float64 | BasicType::UntypedFloat)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_string(self) -> bool {
        matches!(self, BasicType::Str | BasicType::UntypedString)
    }

    pub fn is_untyped(self) -> bool {
        self >= BasicType::UntypedBool
    }

    /// Types whose values may be constants.
    pub fn is_const_type(self) -> bool {
        self.is_boolean() || self.is_numeric() || self.is_string()
    }

    /// Size in bits for sized integer and float types.
    pub fn bits(self) -> Option<u32> {
        match self {
            BasicType::Int8 | BasicType::Uint8 => Some(8),
            BasicType::Int16 | BasicType::Uint16 => Some(16),
            BasicType::Int32 | BasicType::Uint32 | BasicType::Float32 => Some(32),
            BasicType::Int
            | BasicType::Int64
            | BasicType::Uint
            | BasicType::Uint64
            | BasicType::Uintptr
            | BasicType::Float64 => Some(64),
            _ => None,
        }
    }
}

// =============================================================================
// Type details
// =============================================================================

#[derive(Debug, Clone)]
pub struct ArrayDetail {
    pub elem: TypeKey,
    /// `None` if the length could not be determined.
    pub len: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct StructDetail {
    pub fields: Vec<ObjKey>,
}

#[derive(Debug, Clone)]
pub struct TupleDetail {
    pub vars: Vec<ObjKey>,
}

#[derive(Debug, Clone)]
pub struct SignatureDetail {
    pub scope: Option<ScopeKey>,
    pub recv: Option<ObjKey>,
    /// Tuple type.
    pub params: TypeKey,
    /// Tuple type.
    pub results: TypeKey,
    /// The last parameter has a slice type and was declared `...T`.
    pub variadic: bool,
    pub tparams: Vec<ObjKey>,
    /// Type parameters of the receiver base type, as named in the receiver.
    pub rparams: Vec<ObjKey>,
}

#[derive(Debug, Clone, Default)]
pub struct InterfaceDetail {
    pub methods: Vec<ObjKey>,
    pub embeddeds: Vec<TypeKey>,
    /// Only types that support `==` implement this interface.
    pub is_comparable: bool,
}

#[derive(Debug, Clone)]
pub struct MapDetail {
    pub key: TypeKey,
    pub elem: TypeKey,
}

#[derive(Debug, Clone)]
pub struct NamedDetail {
    pub obj: Option<ObjKey>,
    /// The generic type this is an instance of.
    pub orig: Option<TypeKey>,
    /// Unset while the declaration is being checked, and for instances whose
    /// origin is not complete yet.
    pub underlying: Option<TypeKey>,
    pub methods: Vec<ObjKey>,
    pub tparams: Vec<ObjKey>,
    pub targs: Vec<TypeKey>,
}

#[derive(Debug, Clone)]
pub struct TypeParamDetail {
    pub obj: ObjKey,
    pub index: usize,
    pub constraint: Option<TypeKey>,
}

#[derive(Debug, Clone)]
pub enum Type {
    Basic(BasicType),
    Array(ArrayDetail),
    Slice(TypeKey),
    Struct(StructDetail),
    Pointer(TypeKey),
    Tuple(TupleDetail),
    Signature(SignatureDetail),
    Interface(InterfaceDetail),
    Map(MapDetail),
    Named(NamedDetail),
    TypeParam(TypeParamDetail),
}

impl Type {
    pub fn try_as_basic(&self) -> Option<BasicType> {
        match self {
            Type::Basic(b) => Some(*b),
            _ => None,
        }
    }

    pub fn try_as_array(&self) -> Option<&ArrayDetail> {
        match self {
            Type::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn try_as_slice(&self) -> Option<TypeKey> {
        match self {
            Type::Slice(elem) => Some(*elem),
            _ => None,
        }
    }

    pub fn try_as_struct(&self) -> Option<&StructDetail> {
        match self {
            Type::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn try_as_pointer(&self) -> Option<TypeKey> {
        match self {
            Type::Pointer(base) => Some(*base),
            _ => None,
        }
    }

    pub fn try_as_tuple(&self) -> Option<&TupleDetail> {
        match self {
            Type::Tuple(t) => Some(t),
            _ => None,
        }
    }

    pub fn try_as_signature(&self) -> Option<&SignatureDetail> {
        match self {
            Type::Signature(s) => Some(s),
            _ => None,
        }
    }

    pub fn try_as_signature_mut(&mut self) -> Option<&mut SignatureDetail> {
        match self {
            Type::Signature(s) => Some(s),
            _ => None,
        }
    }

    pub fn try_as_interface(&self) -> Option<&InterfaceDetail> {
        match self {
            Type::Interface(i) => Some(i),
            _ => None,
        }
    }

    pub fn try_as_interface_mut(&mut self) -> Option<&mut InterfaceDetail> {
        match self {
            Type::Interface(i) => Some(i),
            _ => None,
        }
    }

    pub fn try_as_map(&self) -> Option<&MapDetail> {
        match self {
            Type::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn try_as_named(&self) -> Option<&NamedDetail> {
        match self {
            Type::Named(n) => Some(n),
            _ => None,
        }
    }

    pub fn try_as_named_mut(&mut self) -> Option<&mut NamedDetail> {
        match self {
            Type::Named(n) => Some(n),
            _ => None,
        }
    }

    pub fn try_as_type_param(&self) -> Option<&TypeParamDetail> {
        match self {
            Type::TypeParam(t) => Some(t),
            _ => None,
        }
    }

    pub fn try_as_type_param_mut(&mut self) -> Option<&mut TypeParamDetail> {
        match self {
            Type::TypeParam(t) => Some(t),
            _ => None,
        }
    }
}

// =============================================================================
// Structural helpers
// =============================================================================

/// Returns the underlying type. A named type whose underlying type is not
/// known yet reports the invalid type.
pub fn underlying_type(t: TypeKey, objs: &TCObjects) -> TypeKey {
    match &objs.types[t] {
        Type::Named(n) => n.underlying.unwrap_or_else(|| objs.invalid_type()),
        _ => t,
    }
}

pub fn underlying_basic(t: TypeKey, objs: &TCObjects) -> Option<BasicType> {
    objs.types[underlying_type(t, objs)].try_as_basic()
}

pub fn is_invalid(t: TypeKey, objs: &TCObjects) -> bool {
    underlying_basic(t, objs) == Some(BasicType::Invalid)
}

pub fn is_untyped(t: TypeKey, objs: &TCObjects) -> bool {
    objs.types[t].try_as_basic().map_or(false, BasicType::is_untyped)
}

pub fn is_typed(t: TypeKey, objs: &TCObjects) -> bool {
    !is_untyped(t, objs)
}

pub fn is_boolean(t: TypeKey, objs: &TCObjects) -> bool {
    underlying_basic(t, objs).map_or(false, BasicType::is_boolean)
}

pub fn is_integer(t: TypeKey, objs: &TCObjects) -> bool {
    underlying_basic(t, objs).map_or(false, BasicType::is_integer)
}

pub fn is_float(t: TypeKey, objs: &TCObjects) -> bool {
    underlying_basic(t, objs).map_or(false, BasicType::is_float)
}

pub fn is_numeric(t: TypeKey, objs: &TCObjects) -> bool {
    underlying_basic(t, objs).map_or(false, BasicType::is_numeric)
}

pub fn is_string(t: TypeKey, objs: &TCObjects) -> bool {
    underlying_basic(t, objs).map_or(false, BasicType::is_string)
}

pub fn is_const_type(t: TypeKey, objs: &TCObjects) -> bool {
    underlying_basic(t, objs).map_or(false, BasicType::is_const_type)
}

pub fn is_pointer(t: TypeKey, objs: &TCObjects) -> bool {
    objs.types[underlying_type(t, objs)].try_as_pointer().is_some()
}

pub fn is_interface(t: TypeKey, objs: &TCObjects) -> bool {
    objs.types[underlying_type(t, objs)].try_as_interface().is_some()
}

/// Basic, named and type-parameter types have names; everything else is a
/// type literal.
pub fn is_named(t: TypeKey, objs: &TCObjects) -> bool {
    matches!(objs.types[t], Type::Basic(_) | Type::Named(_) | Type::TypeParam(_))
}

/// A named type declared with type parameters and not instantiated.
pub fn is_generic(t: TypeKey, objs: &TCObjects) -> bool {
    objs.types[t]
        .try_as_named()
        .map_or(false, |n| !n.tparams.is_empty() && n.targs.is_empty())
}

/// `[]byte` or `[]rune`.
pub fn is_bytes_or_runes(t: TypeKey, objs: &TCObjects) -> bool {
    match objs.types[t].try_as_slice() {
        Some(elem) => matches!(
            underlying_basic(elem, objs),
            Some(BasicType::Uint8) | Some(BasicType::Int32)
        ),
        None => false,
    }
}

/// The element type of a slice, seen through named types.
pub fn slice_elem(t: TypeKey, objs: &TCObjects) -> Option<TypeKey> {
    objs.types[underlying_type(t, objs)].try_as_slice()
}

/// Dereferences an unnamed or named pointer type.
pub fn try_deref(t: TypeKey, objs: &TCObjects) -> (TypeKey, bool) {
    match objs.types[underlying_type(t, objs)].try_as_pointer() {
        Some(base) => (base, true),
        None => (t, false),
    }
}

/// The default type of an untyped type, or `t` itself.
pub fn untyped_default_type(t: TypeKey, objs: &TCObjects) -> TypeKey {
    let basic = match objs.types[t].try_as_basic() {
        Some(b) => b,
        None => return t,
    };
    let default = match basic {
        BasicType::UntypedBool => BasicType::Bool,
        BasicType::UntypedInt => BasicType::Int,
        BasicType::UntypedRune => BasicType::Int32,
        BasicType::UntypedFloat => BasicType::Float64,
        BasicType::UntypedString => BasicType::Str,
        _ => return t,
    };
    objs.basic_type(default)
}

/// Types whose values may be compared with `==` and used as map keys.
pub fn comparable(t: TypeKey, objs: &TCObjects) -> bool {
    comparable_impl(t, objs, &mut HashSet::new())
}

fn comparable_impl(t: TypeKey, objs: &TCObjects, seen: &mut HashSet<TypeKey>) -> bool {
    if !seen.insert(t) {
        return true;
    }
    let u = underlying_type(t, objs);
    match &objs.types[u] {
        Type::Basic(b) => *b != BasicType::UntypedNil,
        Type::Pointer(_) | Type::Interface(_) => true,
        Type::Struct(s) => s
            .fields
            .iter()
            .all(|f| objs.lobjs[*f].typ().map_or(true, |ft| comparable_impl(ft, objs, seen))),
        Type::Array(a) => comparable_impl(a.elem, objs, seen),
        Type::TypeParam(tp) => tp
            .constraint
            .map_or(false, |c| interface_is_comparable(c, objs)),
        _ => false,
    }
}

/// Reports whether the constraint interface (or one it embeds) is
/// `comparable`.
pub fn interface_is_comparable(t: TypeKey, objs: &TCObjects) -> bool {
    fn walk(t: TypeKey, objs: &TCObjects, seen: &mut HashSet<TypeKey>) -> bool {
        if !seen.insert(t) {
            return false;
        }
        match objs.types[underlying_type(t, objs)].try_as_interface() {
            Some(iface) => iface.is_comparable || iface.embeddeds.iter().any(|e| walk(*e, objs, seen)),
            None => false,
        }
    }
    walk(t, objs, &mut HashSet::new())
}

pub fn has_nil(t: TypeKey, objs: &TCObjects) -> bool {
    matches!(
        objs.types[underlying_type(t, objs)],
        Type::Pointer(_) | Type::Slice(_) | Type::Map(_) | Type::Signature(_) | Type::Interface(_)
    )
}

/// The method set of an interface including embedded interfaces. Methods
/// declared directly come first; an embedded method with a name already in
/// the set is skipped.
pub fn all_methods(t: TypeKey, objs: &TCObjects) -> Vec<ObjKey> {
    fn walk(t: TypeKey, objs: &TCObjects, seen: &mut HashSet<TypeKey>, out: &mut Vec<ObjKey>) {
        if !seen.insert(t) {
            return;
        }
        let iface = match objs.types[underlying_type(t, objs)].try_as_interface() {
            Some(iface) => iface,
            None => return,
        };
        for &m in &iface.methods {
            let name = objs.lobjs[m].name();
            if !out.iter().any(|o| objs.lobjs[*o].name() == name) {
                out.push(m);
            }
        }
        for &e in &iface.embeddeds {
            walk(e, objs, seen, out);
        }
    }
    let mut out = Vec::new();
    walk(t, objs, &mut HashSet::new(), &mut out);
    out
}

pub fn is_empty_interface(t: TypeKey, objs: &TCObjects) -> bool {
    is_interface(t, objs) && all_methods(t, objs).is_empty() && !interface_is_comparable(t, objs)
}

/// Reports whether `t` mentions any type parameter.
pub fn is_parameterized(t: TypeKey, objs: &TCObjects) -> bool {
    mentions(t, objs, &|k| objs.types[k].try_as_type_param().is_some())
}

/// Reports whether `t` mentions one of the type parameters declared by the
/// objects in `tparams`.
pub fn mentions_type_params(t: TypeKey, tparams: &[ObjKey], objs: &TCObjects) -> bool {
    mentions(t, objs, &|k| {
        objs.types[k]
            .try_as_type_param()
            .map_or(false, |tp| tparams.contains(&tp.obj))
    })
}

fn mentions(t: TypeKey, objs: &TCObjects, pred: &dyn Fn(TypeKey) -> bool) -> bool {
    if pred(t) {
        return true;
    }
    let var_mentions = |v: &ObjKey| objs.lobjs[*v].typ().map_or(false, |vt| mentions(vt, objs, pred));
    match &objs.types[t] {
        Type::Basic(_) | Type::TypeParam(_) => false,
        Type::Array(a) => mentions(a.elem, objs, pred),
        Type::Slice(elem) | Type::Pointer(elem) => mentions(*elem, objs, pred),
        Type::Map(m) => mentions(m.key, objs, pred) || mentions(m.elem, objs, pred),
        Type::Struct(s) => s.fields.iter().any(var_mentions),
        Type::Tuple(tuple) => tuple.vars.iter().any(var_mentions),
        Type::Signature(sig) => mentions(sig.params, objs, pred) || mentions(sig.results, objs, pred),
        Type::Interface(iface) => {
            iface.methods.iter().any(var_mentions) || iface.embeddeds.iter().any(|e| mentions(*e, objs, pred))
        }
        Type::Named(n) => n.targs.iter().any(|a| mentions(*a, objs, pred)),
    }
}

// =============================================================================
// Identity
// =============================================================================

pub fn identical(x: TypeKey, y: TypeKey, objs: &TCObjects) -> bool {
    if x == y {
        return true;
    }
    match (&objs.types[x], &objs.types[y]) {
        (Type::Basic(a), Type::Basic(b)) => a == b,
        (Type::Array(a), Type::Array(b)) => a.len == b.len && identical(a.elem, b.elem, objs),
        (Type::Slice(a), Type::Slice(b)) | (Type::Pointer(a), Type::Pointer(b)) => identical(*a, *b, objs),
        (Type::Map(a), Type::Map(b)) => identical(a.key, b.key, objs) && identical(a.elem, b.elem, objs),
        (Type::Struct(a), Type::Struct(b)) => {
            a.fields.len() == b.fields.len()
                && a.fields.iter().zip(&b.fields).all(|(f, g)| {
                    let (f, g) = (&objs.lobjs[*f], &objs.lobjs[*g]);
                    f.var_embedded() == g.var_embedded()
                        && g.same_id(f.pkg(), f.name())
                        && identical_opt(f.typ(), g.typ(), objs)
                })
        }
        (Type::Tuple(a), Type::Tuple(b)) => {
            a.vars.len() == b.vars.len()
                && a
                    .vars
                    .iter()
                    .zip(&b.vars)
                    .all(|(v, w)| identical_opt(objs.lobjs[*v].typ(), objs.lobjs[*w].typ(), objs))
        }
        (Type::Signature(a), Type::Signature(b)) => {
            // Generic signatures are only identical to themselves.
            a.tparams.is_empty()
                && b.tparams.is_empty()
                && a.variadic == b.variadic
                && identical(a.params, b.params, objs)
                && identical(a.results, b.results, objs)
        }
        (Type::Interface(_), Type::Interface(_)) => {
            if interface_is_comparable(x, objs) != interface_is_comparable(y, objs) {
                return false;
            }
            let mut a = all_methods(x, objs);
            let mut b = all_methods(y, objs);
            if a.len() != b.len() {
                return false;
            }
            let by_name = |k: &ObjKey| objs.lobjs[*k].name().to_string();
            a.sort_by_key(by_name);
            b.sort_by_key(by_name);
            a.iter().zip(&b).all(|(m, n)| {
                let (m, n) = (&objs.lobjs[*m], &objs.lobjs[*n]);
                n.same_id(m.pkg(), m.name()) && identical_opt(m.typ(), n.typ(), objs)
            })
        }
        (Type::Named(a), Type::Named(b)) => match (a.orig, b.orig) {
            (Some(oa), Some(ob)) => {
                oa == ob
                    && a.targs.len() == b.targs.len()
                    && a.targs.iter().zip(&b.targs).all(|(s, t)| identical(*s, *t, objs))
            }
            _ => false,
        },
        _ => false,
    }
}

pub fn identical_opt(x: Option<TypeKey>, y: Option<TypeKey>, objs: &TCObjects) -> bool {
    match (x, y) {
        (Some(x), Some(y)) => identical(x, y, objs),
        (None, None) => true,
        _ => false,
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Displays a type the way diagnostics print it. Names declared outside the
/// package being checked are qualified by their package name.
pub struct TypeDisplay<'a> {
    typ: TypeKey,
    objs: &'a TCObjects,
}

impl<'a> TypeDisplay<'a> {
    pub fn new(typ: TypeKey, objs: &'a TCObjects) -> TypeDisplay<'a> {
        TypeDisplay { typ, objs }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_type(self.typ, f, self.objs)
    }
}

pub fn type_string(t: TypeKey, objs: &TCObjects) -> String {
    TypeDisplay::new(t, objs).to_string()
}

pub fn fmt_type(t: TypeKey, f: &mut fmt::Formatter<'_>, objs: &TCObjects) -> fmt::Result {
    match &objs.types[t] {
        Type::Basic(b) => f.write_str(b.name()),
        Type::Array(a) => {
            match a.len {
                Some(n) => write!(f, "[{}]", n)?,
                None => f.write_str("[unknown]")?,
            }
            fmt_type(a.elem, f, objs)
        }
        Type::Slice(elem) => {
            f.write_str("[]")?;
            fmt_type(*elem, f, objs)
        }
        Type::Pointer(base) => {
            f.write_char('*')?;
            fmt_type(*base, f, objs)
        }
        Type::Map(m) => {
            f.write_str("map[")?;
            fmt_type(m.key, f, objs)?;
            f.write_char(']')?;
            fmt_type(m.elem, f, objs)
        }
        Type::Struct(s) => {
            f.write_str("struct{")?;
            for (i, field) in s.fields.iter().enumerate() {
                if i > 0 {
                    f.write_str("; ")?;
                }
                let field = &objs.lobjs[*field];
                if !field.var_embedded() {
                    write!(f, "{} ", field.name())?;
                }
                fmt_opt(field.typ(), f, objs)?;
            }
            f.write_char('}')
        }
        Type::Tuple(_) => fmt_tuple(t, false, f, objs),
        Type::Signature(sig) => {
            f.write_str("func")?;
            fmt_signature(sig, f, objs)
        }
        Type::Interface(iface) => {
            if objs.universe.as_ref().map_or(false, |u| u.any_type() == t) {
                return f.write_str("any");
            }
            f.write_str("interface{")?;
            let mut first = true;
            for m in &iface.methods {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                let m = &objs.lobjs[*m];
                f.write_str(m.name())?;
                if let Some(sig) = m.typ().and_then(|st| objs.types[st].try_as_signature()) {
                    fmt_signature(sig, f, objs)?;
                }
            }
            for e in &iface.embeddeds {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                fmt_type(*e, f, objs)?;
            }
            f.write_char('}')
        }
        Type::Named(n) => {
            match n.obj {
                Some(obj) => {
                    let obj = &objs.lobjs[obj];
                    if let Some(pkg) = obj.pkg() {
                        if Some(pkg) != objs.fmt_pkg {
                            write!(f, "{}.", objs.pkgs[pkg].name())?;
                        }
                    }
                    f.write_str(obj.name())?;
                }
                None => f.write_str("<Named w/o object>")?,
            }
            if !n.targs.is_empty() {
                f.write_char('[')?;
                for (i, a) in n.targs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt_type(*a, f, objs)?;
                }
                f.write_char(']')?;
            }
            Ok(())
        }
        Type::TypeParam(tp) => f.write_str(objs.lobjs[tp.obj].name()),
    }
}

fn fmt_opt(t: Option<TypeKey>, f: &mut fmt::Formatter<'_>, objs: &TCObjects) -> fmt::Result {
    match t {
        Some(t) => fmt_type(t, f, objs),
        None => f.write_str("<nil>"),
    }
}

fn fmt_tuple(t: TypeKey, variadic: bool, f: &mut fmt::Formatter<'_>, objs: &TCObjects) -> fmt::Result {
    f.write_char('(')?;
    if let Some(tuple) = objs.types[t].try_as_tuple() {
        for (i, v) in tuple.vars.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let v = &objs.lobjs[*v];
            if !v.name().is_empty() {
                write!(f, "{} ", v.name())?;
            }
            let last = i + 1 == tuple.vars.len();
            match v.typ() {
                Some(vt) if variadic && last => {
                    f.write_str("...")?;
                    match slice_elem(vt, objs) {
                        Some(elem) => fmt_type(elem, f, objs)?,
                        None => fmt_type(vt, f, objs)?,
                    }
                }
                other => fmt_opt(other, f, objs)?,
            }
        }
    }
    f.write_char(')')
}

/// Writes `(params) results` without the `func` keyword.
pub fn fmt_signature(sig: &SignatureDetail, f: &mut fmt::Formatter<'_>, objs: &TCObjects) -> fmt::Result {
    if !sig.tparams.is_empty() {
        f.write_char('[')?;
        for (i, tp) in sig.tparams.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let tp = &objs.lobjs[*tp];
            f.write_str(tp.name())?;
            let constraint = tp
                .typ()
                .and_then(|t| objs.types[t].try_as_type_param())
                .and_then(|d| d.constraint);
            if let Some(c) = constraint {
                f.write_char(' ')?;
                fmt_type(c, f, objs)?;
            }
        }
        f.write_char(']')?;
    }
    fmt_tuple(sig.params, sig.variadic, f, objs)?;
    let results = match objs.types[sig.results].try_as_tuple() {
        Some(t) => &t.vars,
        None => return Ok(()),
    };
    match results.len() {
        0 => Ok(()),
        1 if objs.lobjs[results[0]].name().is_empty() => {
            f.write_char(' ')?;
            fmt_opt(objs.lobjs[results[0]].typ(), f, objs)
        }
        _ => {
            f.write_char(' ')?;
            fmt_tuple(sig.results, false, f, objs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kite_common::span::Span;

    #[test]
    fn test_basic_predicates() {
        assert!(BasicType::UntypedRune.is_integer());
        assert!(BasicType::UntypedNil.is_untyped());
        assert!(!BasicType::Str.is_untyped());
        assert!(BasicType::UntypedInt < BasicType::UntypedFloat);
        assert!(!BasicType::UntypedNil.is_const_type());
        assert_eq!(BasicType::Uint8.bits(), Some(8));
    }

    #[test]
    fn test_identical_structural_types() {
        let mut objs = TCObjects::new();
        let int = objs.basic_type(BasicType::Int);
        let s1 = objs.new_t_slice(int);
        let s2 = objs.new_t_slice(int);
        assert!(identical(s1, s2, &objs));
        let m = objs.new_t_map(int, s1);
        let n = objs.new_t_map(int, s2);
        assert!(identical(m, n, &objs));
        let a = objs.new_t_array(int, Some(3));
        let b = objs.new_t_array(int, Some(4));
        assert!(!identical(a, b, &objs));
    }

    #[test]
    fn test_default_types_and_formatting() {
        let mut objs = TCObjects::new();
        let untyped_rune = objs.basic_type(BasicType::UntypedRune);
        let int32 = objs.basic_type(BasicType::Int32);
        assert_eq!(untyped_default_type(untyped_rune, &objs), int32);

        let string = objs.basic_type(BasicType::Str);
        let p = objs.new_param(Span::dummy(), None, "s".into(), Some(string));
        let params = objs.new_t_tuple(vec![p]);
        let r = objs.new_param(Span::dummy(), None, String::new(), Some(int32));
        let results = objs.new_t_tuple(vec![r]);
        let sig = objs.new_t_signature(None, None, params, results, false);
        assert_eq!(type_string(sig, &objs), "func(s string) int32");
        let map = objs.new_t_map(string, sig);
        assert_eq!(type_string(map, &objs), "map[string]func(s string) int32");
    }

    #[test]
    fn test_comparable() {
        let mut objs = TCObjects::new();
        let int = objs.basic_type(BasicType::Int);
        let slice = objs.new_t_slice(int);
        assert!(comparable(int, &objs));
        assert!(!comparable(slice, &objs));
        let arr = objs.new_t_array(slice, Some(1));
        assert!(!comparable(arr, &objs));
        assert!(has_nil(slice, &objs));
        assert!(!has_nil(int, &objs));
    }
}
