//! Type checker diagnostic codes.
//!
//! Error code ranges:
//! - 2000-2099: assignment and initialization
//! - 2100-2199: operands and operators
//! - 2200-2299: declarations and names
//! - 2300-2399: calls and conversions
//! - 2400-2499: selectors and type expressions
//! - 2500-2599: generics
//! - 2600-2699: builtins
//! - 2700-2799: imports
//! - 2900-2999: warnings

use kite_common::diagnostics::{Diagnostic, Label};
use kite_common::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TypeError {
    // === Assignment (2000-2099) ===
    CannotAssign = 2000,
    AssignMismatch = 2001,
    UntypedNil = 2002,
    Overflow = 2003,

    // === Operands (2100-2199) ===
    InvalidOp = 2100,
    CannotIndirect = 2101,
    CannotTakeAddress = 2102,
    NonInterfaceAssert = 2103,
    ImpossibleAssert = 2104,
    CannotIndex = 2105,
    InvalidIndex = 2106,
    NotConstant = 2107,

    // === Declarations (2200-2299) ===
    Undefined = 2200,
    Redeclared = 2201,
    IllegalCycle = 2202,
    NotExported = 2203,
    NotDeclaredByPackage = 2204,
    InvalidConstType = 2205,
    UseOfPackageName = 2206,
    BlankAsValue = 2207,
    IotaOutsideConst = 2208,
    MethodTypeParams = 2209,
    InvalidRecv = 2210,
    MissingInitExpr = 2211,
    ExtraInitExpr = 2212,
    PackageNameMismatch = 2213,
    InvalidRecursiveType = 2214,

    // === Calls (2300-2399) ===
    CannotCall = 2300,
    TooFewArgs = 2301,
    TooManyArgs = 2302,
    MissingConversionArg = 2303,
    TooManyConversionArgs = 2304,
    SpreadNonVariadic = 2305,
    SpreadMultiValue = 2306,
    InvalidConversion = 2307,
    UsedAsValue = 2308,
    MustBeCalled = 2309,
    MixedValueAndType = 2310,
    NotAnExpression = 2311,
    MultiValueInSingleContext = 2312,
    MisplacedVariadic = 2313,
    GenericFuncWithoutInst = 2314,

    // === Selectors and type expressions (2400-2499) ===
    AmbiguousSelector = 2400,
    PointerMethodOnValue = 2401,
    FieldOrMethodUndefined = 2402,
    NotAType = 2403,
    InvalidMapKey = 2404,
    InvalidArrayLen = 2405,
    EmbeddedPointerInterface = 2406,

    // === Generics (2500-2599) ===
    WrongTypeArgCount = 2500,
    CannotInfer = 2501,
    InferenceMismatch = 2502,
    NotGeneric = 2503,
    GenericWithoutInst = 2504,
    UnsatisfiedConstraint = 2505,
    NotAnInterface = 2506,
    GenericAlias = 2507,

    // === Builtins (2600-2699) ===
    BuiltinArgCount = 2600,
    InvalidBuiltinArg = 2601,
    InvalidSpreadBuiltin = 2602,

    // === Imports (2700-2799) ===
    ImportFailed = 2700,
    ImportCycle = 2701,

    // === Warnings (2900-2999) ===
    UnusedImport = 2900,
}

impl TypeError {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn is_warning(self) -> bool {
        self.code() >= 2900
    }

    /// The default message, used when no more specific one is given.
    pub fn message(self) -> &'static str {
        match self {
            TypeError::CannotAssign => "cannot use value in assignment",
            TypeError::AssignMismatch => "assignment mismatch",
            TypeError::UntypedNil => "use of untyped nil",
            TypeError::Overflow => "constant overflow",

            TypeError::InvalidOp => "invalid operation",
            TypeError::CannotIndirect => "cannot indirect",
            TypeError::CannotTakeAddress => "cannot take address",
            TypeError::NonInterfaceAssert => "type assertion on non-interface value",
            TypeError::ImpossibleAssert => "impossible type assertion",
            TypeError::CannotIndex => "cannot index",
            TypeError::InvalidIndex => "invalid index",
            TypeError::NotConstant => "value is not constant",

            TypeError::Undefined => "undeclared name",
            TypeError::Redeclared => "redeclared in this block",
            TypeError::IllegalCycle => "illegal cycle in declaration",
            TypeError::NotExported => "name not exported by package",
            TypeError::NotDeclaredByPackage => "name not declared by package",
            TypeError::InvalidConstType => "invalid constant type",
            TypeError::UseOfPackageName => "use of package name not in selector",
            TypeError::BlankAsValue => "cannot use _ as value",
            TypeError::IotaOutsideConst => "cannot use iota outside constant declaration",
            TypeError::MethodTypeParams => "methods cannot have type parameters",
            TypeError::InvalidRecv => "invalid receiver",
            TypeError::MissingInitExpr => "missing init expr",
            TypeError::ExtraInitExpr => "extra init expr",
            TypeError::PackageNameMismatch => "package name mismatch",
            TypeError::InvalidRecursiveType => "invalid recursive type",

            TypeError::CannotCall => "cannot call non-function",
            TypeError::TooFewArgs => "not enough arguments in call",
            TypeError::TooManyArgs => "too many arguments in call",
            TypeError::MissingConversionArg => "missing argument in conversion",
            TypeError::TooManyConversionArgs => "too many arguments in conversion",
            TypeError::SpreadNonVariadic => "cannot use ... in call to non-variadic function",
            TypeError::SpreadMultiValue => "cannot use ... with multi-valued expression",
            TypeError::InvalidConversion => "cannot convert",
            TypeError::UsedAsValue => "used as value",
            TypeError::MustBeCalled => "must be called",
            TypeError::MixedValueAndType => "mix of value and type expressions",
            TypeError::NotAnExpression => "is not an expression",
            TypeError::MultiValueInSingleContext => "multi-valued expression in single-value context",
            TypeError::MisplacedVariadic => "can only use ... with final parameter in list",
            TypeError::GenericFuncWithoutInst => "cannot use generic function without instantiation",

            TypeError::AmbiguousSelector => "ambiguous selector",
            TypeError::PointerMethodOnValue => "cannot call pointer method",
            TypeError::FieldOrMethodUndefined => "field or method undefined",
            TypeError::NotAType => "is not a type",
            TypeError::InvalidMapKey => "invalid map key type",
            TypeError::InvalidArrayLen => "invalid array length",
            TypeError::EmbeddedPointerInterface => "embedded field type cannot be a pointer to an interface",

            TypeError::WrongTypeArgCount => "wrong number of type arguments",
            TypeError::CannotInfer => "cannot infer type arguments",
            TypeError::InferenceMismatch => "type argument inference mismatch",
            TypeError::NotGeneric => "is not a generic type",
            TypeError::GenericWithoutInst => "cannot use generic type without instantiation",
            TypeError::UnsatisfiedConstraint => "type does not satisfy constraint",
            TypeError::NotAnInterface => "constraint is not an interface",
            TypeError::GenericAlias => "generic type cannot be alias",

            TypeError::BuiltinArgCount => "wrong number of arguments for built-in",
            TypeError::InvalidBuiltinArg => "invalid argument for built-in",
            TypeError::InvalidSpreadBuiltin => "invalid use of ... with built-in",

            TypeError::ImportFailed => "could not import package",
            TypeError::ImportCycle => "import cycle not allowed",

            TypeError::UnusedImport => "imported and not used",
        }
    }

    pub fn at(self, span: impl Into<Span>) -> Diagnostic {
        self.at_with_message(span, self.message())
    }

    pub fn at_with_message(self, span: impl Into<Span>, message: impl Into<String>) -> Diagnostic {
        let diag = if self.is_warning() {
            Diagnostic::warning(message)
        } else {
            Diagnostic::error(message)
        };
        diag.with_code(self.code()).with_label(Label::primary(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kite_common::diagnostics::Severity;

    #[test]
    fn test_error_codes() {
        assert_eq!(TypeError::CannotAssign.code(), 2000);
        assert_eq!(TypeError::InvalidOp.code(), 2100);
        assert_eq!(TypeError::CannotCall.code(), 2300);
        assert_eq!(TypeError::AmbiguousSelector.code(), 2400);
        assert_eq!(TypeError::WrongTypeArgCount.code(), 2500);
        assert_eq!(TypeError::UnusedImport.code(), 2900);
    }

    #[test]
    fn test_warnings() {
        assert!(TypeError::UnusedImport.is_warning());
        assert!(!TypeError::ImportCycle.is_warning());
        let diag = TypeError::UnusedImport.at_with_message(0u32..4u32, "\"fmt\" imported and not used");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.code, Some(2900));
    }

    #[test]
    fn test_at_uses_default_message() {
        let diag = TypeError::TooFewArgs.at(3u32..9u32);
        assert_eq!(diag.message, "not enough arguments in call");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.labels[0].span.start.0, 3);
    }
}
