//! Operands: the result of evaluating one expression.

use std::fmt::{self, Write};

use kite_common::symbol::SymbolInterner;
use kite_syntax::ast::Expr;

use crate::check::format::expr_string;
use crate::obj::{Builtin, ConstValue};
use crate::objects::{TCObjects, TypeKey};
use crate::typ::{self, BasicType};

/// The addressing mode of an operand.
#[derive(Clone, Debug, PartialEq)]
pub enum OperandMode {
    Invalid,
    /// A call of a function without results.
    NoValue,
    Builtin(Builtin),
    /// The operand denotes a type.
    TypeExpr,
    Constant(ConstValue),
    /// An addressable value.
    Variable,
    /// A map index expression; may be used as `v, ok := m[k]`.
    MapIndex,
    Value,
    /// A type assertion; may be used as `v, ok := x.(T)`.
    CommaOk,
    /// A foreign call result; may be used as `v, err := C.f()`.
    CommaErr,
    /// A function of the `"C"` package.
    ForeignFunc,
}

impl OperandMode {
    pub fn constant_val(&self) -> Option<&ConstValue> {
        match self {
            OperandMode::Constant(v) => Some(v),
            _ => None,
        }
    }

    pub fn builtin_id(&self) -> Option<Builtin> {
        match self {
            OperandMode::Builtin(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_comma_ok(&self) -> bool {
        matches!(self, OperandMode::MapIndex | OperandMode::CommaOk | OperandMode::CommaErr)
    }
}

impl fmt::Display for OperandMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperandMode::Invalid => "invalid operand",
            OperandMode::NoValue => "no value",
            OperandMode::Builtin(_) => "built-in",
            OperandMode::TypeExpr => "type",
            OperandMode::Constant(_) => "constant",
            OperandMode::Variable => "variable",
            OperandMode::MapIndex => "map index expression",
            OperandMode::Value => "value",
            OperandMode::CommaOk => "comma, ok expression",
            OperandMode::CommaErr => "comma, error expression",
            OperandMode::ForeignFunc => "foreign function",
        })
    }
}

/// An operand has a mode, the expression that produced it, and a type.
/// Constant values are carried by the mode.
#[derive(Clone, Debug)]
pub struct Operand<'a> {
    pub mode: OperandMode,
    pub expr: Option<&'a Expr>,
    pub typ: Option<TypeKey>,
}

impl Default for Operand<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Operand<'a> {
    pub fn new() -> Operand<'a> {
        Operand {
            mode: OperandMode::Invalid,
            expr: None,
            typ: None,
        }
    }

    pub fn with(mode: OperandMode, expr: Option<&'a Expr>, typ: Option<TypeKey>) -> Operand<'a> {
        Operand { mode, expr, typ }
    }

    pub fn invalid(&self) -> bool {
        self.mode == OperandMode::Invalid
    }

    pub fn is_nil(&self, objs: &TCObjects) -> bool {
        self.mode == OperandMode::Value
            && self
                .typ
                .map_or(false, |t| objs.types[t].try_as_basic() == Some(BasicType::UntypedNil))
    }

    /// The span of the operand's expression, if any.
    pub fn span(&self) -> Option<kite_common::span::Span> {
        self.expr.map(|e| e.span)
    }

    /// Formats the operand the way diagnostics describe it, for example
    /// `x (variable of type int)` or `1 (untyped int constant)`.
    pub fn fmt(&self, f: &mut fmt::Formatter<'_>, objs: &TCObjects, interner: &SymbolInterner) -> fmt::Result {
        // <expr> (
        let expr = match self.expr {
            Some(e) => expr_string(e, interner),
            None => match &self.mode {
                OperandMode::Builtin(id) => id.name().to_string(),
                OperandMode::TypeExpr => self.typ.map(|t| typ::type_string(t, objs)).unwrap_or_default(),
                OperandMode::Constant(val) => val.to_string(),
                _ => String::new(),
            },
        };
        if !expr.is_empty() {
            f.write_str(&expr)?;
            f.write_str(" (")?;
        }

        // <untyped kind>
        let mut has_type = false;
        match self.mode {
            OperandMode::Invalid | OperandMode::NoValue | OperandMode::Builtin(_) | OperandMode::TypeExpr => {}
            _ => {
                if let Some(t) = self.typ {
                    match objs.types[t].try_as_basic() {
                        Some(b) if b.is_untyped() => {
                            f.write_str(b.name())?;
                            f.write_char(' ')?;
                        }
                        _ => has_type = true,
                    }
                }
            }
        }

        // <mode>
        write!(f, "{}", self.mode)?;

        // <val>
        if let OperandMode::Constant(val) = &self.mode {
            let s = val.to_string();
            if s != expr {
                f.write_char(' ')?;
                f.write_str(&s)?;
            }
        }

        // <typ>
        if let (true, Some(t)) = (has_type, self.typ) {
            if typ::is_invalid(t, objs) && objs.types[t].try_as_basic().is_some() {
                f.write_str(" with invalid type")?;
            } else {
                f.write_str(" of type ")?;
                typ::fmt_type(t, f, objs)?;
            }
        }

        // )
        if !expr.is_empty() {
            f.write_char(')')?;
        }
        Ok(())
    }
}

/// Pairs an operand with what it needs to be displayed.
pub struct OperandDisplay<'o, 'a> {
    pub operand: &'o Operand<'a>,
    pub objs: &'o TCObjects,
    pub interner: &'o SymbolInterner,
}

impl fmt::Display for OperandDisplay<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.operand.fmt(f, self.objs, self.interner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant;

    fn show(x: &Operand, objs: &TCObjects) -> String {
        let interner = SymbolInterner::new();
        OperandDisplay {
            operand: x,
            objs,
            interner: &interner,
        }
        .to_string()
    }

    #[test]
    fn test_operand_strings_without_expr() {
        let objs = TCObjects::new();
        let int = objs.basic_type(BasicType::Int);
        let untyped = objs.basic_type(BasicType::UntypedInt);

        let c = Operand::with(OperandMode::Constant(constant::make_int64(1)), None, Some(untyped));
        assert_eq!(show(&c, &objs), "1 (untyped int constant)");

        let t = Operand::with(OperandMode::TypeExpr, None, Some(int));
        assert_eq!(show(&t, &objs), "int (type)");

        let v = Operand::with(OperandMode::Value, None, Some(int));
        assert_eq!(show(&v, &objs), "value of type int");

        let b = Operand::with(OperandMode::Builtin(Builtin::Len), None, None);
        assert_eq!(show(&b, &objs), "len (built-in)");
    }

    #[test]
    fn test_is_nil() {
        let objs = TCObjects::new();
        let nil = objs.basic_type(BasicType::UntypedNil);
        assert!(Operand::with(OperandMode::Value, None, Some(nil)).is_nil(&objs));
        assert!(!Operand::with(OperandMode::Variable, None, Some(nil)).is_nil(&objs));
        assert!(OperandMode::CommaErr.is_comma_ok());
        assert!(!OperandMode::Value.is_comma_ok());
    }
}
