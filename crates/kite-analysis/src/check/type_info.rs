//! Facts recorded while checking a package.

use std::collections::HashMap;

use kite_syntax::ast::{ExprId, Ident, IdentId};

use crate::objects::{ObjKey, TypeKey};
use crate::operand::OperandMode;
use crate::selection::Selection;

/// The mode and type of a checked expression. Constant values are carried
/// by the mode.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAndValue {
    pub mode: OperandMode,
    pub typ: TypeKey,
}

impl TypeAndValue {
    pub fn is_type(&self) -> bool {
        self.mode == OperandMode::TypeExpr
    }

    pub fn is_value(&self) -> bool {
        matches!(
            self.mode,
            OperandMode::Constant(_)
                | OperandMode::Variable
                | OperandMode::MapIndex
                | OperandMode::Value
                | OperandMode::CommaOk
                | OperandMode::CommaErr
        )
    }
}

/// Type arguments of a generic function call or instantiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inferred {
    pub targs: Vec<TypeKey>,
    /// The instantiated signature, or the instantiated named type for
    /// `List(int)`.
    pub typ: TypeKey,
}

#[derive(Debug, Default)]
pub struct TypeInfo {
    /// Expressions and their types. Untyped constants are recorded with
    /// their final type once it is known.
    pub types: HashMap<ExprId, TypeAndValue>,
    /// Identifiers that declare an object. Blank identifiers and package
    /// clauses map to `None`.
    pub defs: HashMap<IdentId, Option<ObjKey>>,
    /// Identifiers that refer to an object.
    pub uses: HashMap<IdentId, ObjKey>,
    /// Selector expressions resolved by field or method lookup.
    pub selections: HashMap<ExprId, Selection>,
    /// Calls and index expressions that instantiated a generic function.
    pub inferred: HashMap<ExprId, Inferred>,
}

impl TypeInfo {
    pub fn new() -> TypeInfo {
        TypeInfo::default()
    }

    pub(crate) fn record_type_and_value(&mut self, id: ExprId, mode: OperandMode, typ: TypeKey) {
        if mode == OperandMode::Invalid {
            return;
        }
        self.types.insert(id, TypeAndValue { mode, typ });
    }

    pub(crate) fn record_def(&mut self, ident: &Ident, obj: Option<ObjKey>) {
        self.defs.insert(ident.id, obj);
    }

    pub(crate) fn record_use(&mut self, ident: &Ident, obj: ObjKey) {
        self.uses.insert(ident.id, obj);
    }

    pub(crate) fn record_selection(&mut self, id: ExprId, sel: Selection) {
        self.selections.insert(id, sel);
    }

    pub(crate) fn record_inferred(&mut self, id: ExprId, targs: Vec<TypeKey>, typ: TypeKey) {
        self.inferred.insert(id, Inferred { targs, typ });
    }

    pub fn type_of(&self, id: ExprId) -> Option<TypeKey> {
        self.types.get(&id).map(|tv| tv.typ)
    }

    pub fn mode_of(&self, id: ExprId) -> Option<&OperandMode> {
        self.types.get(&id).map(|tv| &tv.mode)
    }

    /// The object an identifier declares or refers to.
    pub fn object_of(&self, ident: &Ident) -> Option<ObjKey> {
        match self.defs.get(&ident.id) {
            Some(def) => *def,
            None => self.uses.get(&ident.id).copied(),
        }
    }

    pub fn selection(&self, id: ExprId) -> Option<&Selection> {
        self.selections.get(&id)
    }

    pub fn inferred(&self, id: ExprId) -> Option<&Inferred> {
        self.inferred.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaKey;
    use kite_common::span::Span;
    use kite_common::symbol::Symbol;

    #[test]
    fn test_invalid_operands_are_not_recorded() {
        let mut info = TypeInfo::new();
        let t = TypeKey::from_usize(0);
        info.record_type_and_value(ExprId(1), OperandMode::Invalid, t);
        info.record_type_and_value(ExprId(2), OperandMode::Value, t);
        assert_eq!(info.type_of(ExprId(1)), None);
        assert_eq!(info.type_of(ExprId(2)), Some(t));
        assert!(info.types[&ExprId(2)].is_value());
    }

    #[test]
    fn test_object_of_prefers_defs() {
        let mut info = TypeInfo::new();
        let ident = Ident {
            id: IdentId(4),
            symbol: Symbol::DUMMY,
            span: Span::dummy(),
        };
        let obj = ObjKey::from_usize(9);
        info.record_use(&ident, obj);
        assert_eq!(info.object_of(&ident), Some(obj));
        info.record_def(&ident, None);
        assert_eq!(info.object_of(&ident), None);
    }
}
