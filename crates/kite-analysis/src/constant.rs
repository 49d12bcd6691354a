//! Constant values.
//!
//! Integer constants are arbitrary precision; float constants are kept as
//! `f64`. There are no complex constants.

use std::fmt;

use kite_syntax::ast::{LitKind, UnaryOp};
use kite_syntax::unquote;
use num_bigint::BigInt;
use num_traits::{Num, ToPrimitive, Zero};

use crate::typ::BasicType;

#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// The value could not be determined, usually because of an earlier
    /// error. Unknown values are representable by every type.
    #[default]
    Unknown,
    Bool(bool),
    Str(String),
    Int(BigInt),
    Float(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unknown => f.write_str("unknown"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{:?}", short_quote(s, 72)),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

fn short_quote(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

pub fn make_bool(b: bool) -> Value {
    Value::Bool(b)
}

pub fn make_string(s: String) -> Value {
    Value::Str(s)
}

pub fn make_int64(x: i64) -> Value {
    Value::Int(BigInt::from(x))
}

pub fn make_float64(x: f64) -> Value {
    if x.is_finite() {
        Value::Float(x)
    } else {
        Value::Unknown
    }
}

impl Value {
    /// Decodes a literal as written in source. Returns `None` for malformed
    /// literals.
    pub fn from_literal(kind: LitKind, raw: &str) -> Option<Value> {
        match kind {
            LitKind::Int => int_from_literal(raw),
            LitKind::Float => {
                let lit = raw.replace('_', "");
                lit.parse::<f64>().ok().map(make_float64)
            }
            LitKind::Rune => {
                let decoded = unquote(raw);
                let mut chars = decoded.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(make_int64(c as i64)),
                    _ => None,
                }
            }
            LitKind::String => Some(Value::Str(unquote(raw))),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn int64_val(&self) -> Option<i64> {
        match self {
            Value::Int(i) => i.to_i64(),
            _ => None,
        }
    }

    pub fn str_val(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn bool_val(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Converts an integral float to an integer.
    pub fn to_int(&self) -> Value {
        match self {
            Value::Float(f) if f.fract() == 0.0 => match BigInt::parse_bytes(format!("{:.0}", f).as_bytes(), 10) {
                Some(i) => Value::Int(i),
                None => Value::Unknown,
            },
            other => other.clone(),
        }
    }

    pub fn to_float(&self) -> Value {
        match self {
            Value::Int(i) => i.to_f64().map(make_float64).unwrap_or(Value::Unknown),
            other => other.clone(),
        }
    }

    /// Checks whether the value is representable by `b`, returning the value
    /// rounded to `b` on success.
    pub fn representable(&self, b: BasicType) -> Option<Value> {
        if self.is_unknown() {
            return Some(Value::Unknown);
        }
        if b.is_integer() {
            let i = match self.to_int() {
                Value::Int(i) => i,
                _ => return None,
            };
            let ok = match b {
                BasicType::UntypedInt | BasicType::UntypedRune => true,
                BasicType::Int | BasicType::Int64 => i.to_i64().is_some(),
                BasicType::Int8 => i.to_i8().is_some(),
                BasicType::Int16 => i.to_i16().is_some(),
                BasicType::Int32 => i.to_i32().is_some(),
                BasicType::Uint | BasicType::Uint64 | BasicType::Uintptr => i.to_u64().is_some(),
                BasicType::Uint8 => i.to_u8().is_some(),
                BasicType::Uint16 => i.to_u16().is_some(),
                BasicType::Uint32 => i.to_u32().is_some(),
                _ => false,
            };
            return ok.then_some(Value::Int(i));
        }
        if b.is_float() {
            let f = match self.to_float() {
                Value::Float(f) => f,
                _ => return None,
            };
            return match b {
                BasicType::Float32 => {
                    let r = f as f32;
                    r.is_finite().then(|| Value::Float(r as f64))
                }
                _ => Some(Value::Float(f)),
            };
        }
        match (self, b.is_boolean(), b.is_string()) {
            (Value::Bool(_), true, _) | (Value::Str(_), _, true) => Some(self.clone()),
            _ => None,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Value::Int(i) => i < &BigInt::zero(),
            Value::Float(f) => *f < 0.0,
            _ => false,
        }
    }
}

fn int_from_literal(raw: &str) -> Option<Value> {
    let lit = raw.replace('_', "");
    let (digits, radix) = match lit.get(..2) {
        Some("0x") | Some("0X") => (&lit[2..], 16),
        Some("0o") | Some("0O") => (&lit[2..], 8),
        Some("0b") | Some("0B") => (&lit[2..], 2),
        _ if lit.len() > 1 && lit.starts_with('0') => (&lit[1..], 8),
        _ => (lit.as_str(), 10),
    };
    BigInt::from_str_radix(digits, radix).ok().map(Value::Int)
}

/// Folds a unary operator over a constant. `&` has no constant result.
pub fn unary_op(op: UnaryOp, y: &Value) -> Value {
    match (op, y) {
        (_, Value::Unknown) => Value::Unknown,
        (UnaryOp::Pos, Value::Int(_) | Value::Float(_)) => y.clone(),
        (UnaryOp::Neg, Value::Int(i)) => Value::Int(-i),
        (UnaryOp::Neg, Value::Float(f)) => Value::Float(-f),
        (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
        _ => Value::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(raw: &str) -> Option<i64> {
        Value::from_literal(LitKind::Int, raw).and_then(|v| v.int64_val())
    }

    #[test]
    fn test_int_literals() {
        assert_eq!(int("42"), Some(42));
        assert_eq!(int("0x_ff"), Some(255));
        assert_eq!(int("0o17"), Some(15));
        assert_eq!(int("017"), Some(15));
        assert_eq!(int("0b1010"), Some(10));
        assert_eq!(int("1_000_000"), Some(1_000_000));
        assert_eq!(int("0"), Some(0));
        assert_eq!(int("09"), None);
    }

    #[test]
    fn test_other_literals() {
        assert_eq!(Value::from_literal(LitKind::Float, "1.5e2"), Some(Value::Float(150.0)));
        assert_eq!(Value::from_literal(LitKind::Rune, "'a'"), Some(make_int64(97)));
        assert_eq!(Value::from_literal(LitKind::Rune, "'\\n'"), Some(make_int64(10)));
        assert_eq!(
            Value::from_literal(LitKind::String, "\"a\\tb\""),
            Some(Value::Str("a\tb".to_string()))
        );
    }

    #[test]
    fn test_representable() {
        assert_eq!(make_int64(255).representable(BasicType::Uint8), Some(make_int64(255)));
        assert_eq!(make_int64(256).representable(BasicType::Uint8), None);
        assert_eq!(make_int64(-1).representable(BasicType::Uint), None);
        assert_eq!(Value::Float(3.0).representable(BasicType::Int), Some(make_int64(3)));
        assert_eq!(Value::Float(3.5).representable(BasicType::Int), None);
        assert_eq!(make_int64(2).representable(BasicType::Float64), Some(Value::Float(2.0)));
        assert_eq!(Value::Float(1e300).representable(BasicType::Float32), None);
        assert_eq!(Value::Str("x".into()).representable(BasicType::Int), None);
        assert_eq!(Value::Unknown.representable(BasicType::Bool), Some(Value::Unknown));
    }

    #[test]
    fn test_unary_folding() {
        assert_eq!(unary_op(UnaryOp::Neg, &make_int64(3)), make_int64(-3));
        assert_eq!(unary_op(UnaryOp::Not, &Value::Bool(true)), Value::Bool(false));
        assert_eq!(unary_op(UnaryOp::Addr, &make_int64(1)), Value::Unknown);
        assert!(make_int64(-3).is_negative());
    }
}
