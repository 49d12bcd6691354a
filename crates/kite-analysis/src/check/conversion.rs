//! Type conversions `T(x)`.

use super::errors::TypeError;
use super::Checker;
use crate::constant;
use crate::objects::TypeKey;
use crate::operand::{Operand, OperandMode};
use crate::typ;

impl<'a> Checker<'a> {
    /// Converts `x` to type `t`, invalidating `x` if that is not possible.
    pub(crate) fn conversion(&mut self, x: &mut Operand<'a>, t: TypeKey) {
        let const_arg = x.mode.constant_val().is_some();
        let const_target = typ::is_const_type(t, self.tc_objs);

        let ok = if const_arg && const_target {
            self.constant_conversion(x, t)
        } else if self.convertible_to(x, t) {
            x.mode = OperandMode::Value;
            true
        } else {
            false
        };
        if !ok {
            let msg = format!("cannot convert {} to {}", self.op_str(x), self.type_str(t));
            self.error(TypeError::InvalidConversion, self.op_span(x), msg);
            x.mode = OperandMode::Invalid;
            return;
        }

        // The conversion gives untyped arguments their type, except for
        // interfaces and non-constant targets, which use the default type,
        // and integer to string conversions, which keep the argument's.
        let xt = self.typ_of(x);
        if typ::is_untyped(xt, self.tc_objs) {
            let final_type = if typ::is_interface(t, self.tc_objs) || (const_arg && !const_target) {
                typ::untyped_default_type(xt, self.tc_objs)
            } else if typ::is_integer(xt, self.tc_objs) && typ::is_string(t, self.tc_objs) {
                xt
            } else {
                t
            };
            if let Some(e) = x.expr {
                self.update_expr_type(e, final_type, true);
            }
        }
        x.typ = Some(t);
    }

    /// Constant to constant type. Integers convert to strings by code point;
    /// invalid code points become U+FFFD.
    fn constant_conversion(&mut self, x: &mut Operand<'a>, t: TypeKey) -> bool {
        let val = match x.mode.constant_val() {
            Some(val) => val.clone(),
            None => return false,
        };
        let b = match typ::underlying_basic(t, self.tc_objs) {
            Some(b) => b,
            None => return false,
        };
        if let Some(rounded) = val.representable(b) {
            x.mode = OperandMode::Constant(rounded);
            return true;
        }
        if typ::is_integer(self.typ_of(x), self.tc_objs) && b.is_string() {
            let c = val
                .int64_val()
                .and_then(|i| u32::try_from(i).ok())
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            x.mode = OperandMode::Constant(constant::make_string(c.to_string()));
            return true;
        }
        false
    }

    fn convertible_to(&mut self, x: &Operand<'a>, t: TypeKey) -> bool {
        if self.assignable_to(x, t).0 {
            return true;
        }
        let objs = &*self.tc_objs;
        let v = self.typ_of(x);
        let vu = typ::underlying_type(v, objs);
        let tu = typ::underlying_type(t, objs);
        if typ::identical(vu, tu, objs) {
            return true;
        }

        // unnamed pointers to types with identical underlying types
        if let (Some(vb), Some(tb)) = (objs.types[v].try_as_pointer(), objs.types[t].try_as_pointer()) {
            if typ::identical(typ::underlying_type(vb, objs), typ::underlying_type(tb, objs), objs) {
                return true;
            }
        }

        let numeric = |k: TypeKey| typ::is_integer(k, objs) || typ::is_float(k, objs);
        if numeric(v) && numeric(t) {
            return true;
        }
        if (typ::is_integer(v, objs) || typ::is_bytes_or_runes(vu, objs)) && typ::is_string(t, objs) {
            return true;
        }
        typ::is_string(v, objs) && typ::is_bytes_or_runes(tu, objs)
    }
}
