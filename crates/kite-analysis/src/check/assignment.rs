//! Assignability.

use super::errors::TypeError;
use super::Checker;
use crate::objects::TypeKey;
use crate::operand::{Operand, OperandMode};
use crate::typ::{self, BasicType, Type};

impl<'a> Checker<'a> {
    /// Checks that `x` can be assigned to a variable of type `t`, and gives
    /// untyped operands their final type. A missing `t` stands for an
    /// untyped target such as the blank identifier. `context` names the
    /// kind of assignment in messages.
    pub(crate) fn assignment(&mut self, x: &mut Operand<'a>, t: Option<TypeKey>, context: &str) {
        self.single_value(x);
        match x.mode {
            OperandMode::Invalid => return,
            OperandMode::Constant(_)
            | OperandMode::Variable
            | OperandMode::MapIndex
            | OperandMode::Value
            | OperandMode::CommaOk
            | OperandMode::CommaErr => {}
            OperandMode::NoValue | OperandMode::Builtin(_) | OperandMode::TypeExpr | OperandMode::ForeignFunc => {
                let target = t.map(|t| self.type_str(t)).unwrap_or_else(|| "_".to_string());
                let msg = format!("cannot assign {} to {} in {}", self.op_str(x), target, context);
                self.error(TypeError::CannotAssign, self.op_span(x), msg);
                x.mode = OperandMode::Invalid;
                return;
            }
        }

        let xt = self.typ_of(x);
        if typ::is_untyped(xt, self.tc_objs) {
            let target = match t {
                Some(t) if !typ::is_interface(t, self.tc_objs) => t,
                _ => {
                    if t.is_none() && x.is_nil(self.tc_objs) {
                        let msg = format!("use of untyped nil in {}", context);
                        self.error(TypeError::UntypedNil, self.op_span(x), msg);
                        x.mode = OperandMode::Invalid;
                        return;
                    }
                    typ::untyped_default_type(xt, self.tc_objs)
                }
            };
            if !self.assignable_to(x, target).0 {
                let mut msg = format!(
                    "cannot use {} as {} value in {}",
                    self.op_str(x),
                    self.type_str(target),
                    context
                );
                if x.mode.constant_val().is_some()
                    && typ::is_numeric(xt, self.tc_objs)
                    && typ::is_numeric(target, self.tc_objs)
                {
                    if !typ::is_integer(xt, self.tc_objs) && typ::is_integer(target, self.tc_objs) {
                        msg.push_str(" (truncated)");
                    } else {
                        msg.push_str(" (overflows)");
                    }
                }
                self.error(TypeError::CannotAssign, self.op_span(x), msg);
                x.mode = OperandMode::Invalid;
                return;
            }
            self.convert_untyped(x, target);
            if x.invalid() {
                return;
            }
        }

        // A generic function must be instantiated before it is a value.
        let xt = self.typ_of(x);
        let generic = self.tc_objs.types[typ::underlying_type(xt, self.tc_objs)]
            .try_as_signature()
            .map_or(false, |sig| !sig.tparams.is_empty());
        if generic {
            let what = x.expr.map(|e| self.expr_str(e)).unwrap_or_default();
            let msg = format!("cannot use generic function {} without instantiation in {}", what, context);
            self.error(TypeError::GenericFuncWithoutInst, self.op_span(x), msg);
            x.mode = OperandMode::Invalid;
            return;
        }

        let t = match t {
            Some(t) => t,
            None => return,
        };
        let (ok, reason) = self.assignable_to(x, t);
        if !ok {
            let msg = match reason {
                Some(reason) => format!(
                    "cannot use {} as {} value in {}: {}",
                    self.op_str(x),
                    self.type_str(t),
                    context,
                    reason
                ),
                None => format!("cannot use {} as {} value in {}", self.op_str(x), self.type_str(t), context),
            };
            self.error(TypeError::CannotAssign, self.op_span(x), msg);
            x.mode = OperandMode::Invalid;
        }
    }

    /// Reports whether `x` is assignable to a variable of type `t`, with the
    /// reason when an interface is not implemented.
    pub(crate) fn assignable_to(&mut self, x: &Operand<'a>, t: TypeKey) -> (bool, Option<String>) {
        let invalid = self.invalid_type();
        if x.invalid() || t == invalid {
            // already reported
            return (true, None);
        }
        let v = self.typ_of(x);
        if typ::identical(v, t, self.tc_objs) {
            return (true, None);
        }

        let vu = typ::underlying_type(v, self.tc_objs);
        let tu = typ::underlying_type(t, self.tc_objs);
        if typ::is_untyped(vu, self.tc_objs) {
            let ok = match &self.tc_objs.types[tu] {
                Type::Basic(b) => match &x.mode {
                    OperandMode::Constant(val) => val.representable(*b).is_some(),
                    _ => {
                        self.tc_objs.types[vu].try_as_basic() == Some(BasicType::UntypedBool) && b.is_boolean()
                    }
                },
                Type::Interface(_) => x.is_nil(self.tc_objs) || typ::is_empty_interface(tu, self.tc_objs),
                Type::Pointer(_) | Type::Signature(_) | Type::Slice(_) | Type::Map(_) => x.is_nil(self.tc_objs),
                _ => false,
            };
            return (ok, None);
        }

        // identical underlying types and at least one side is a type literal
        if typ::identical(vu, tu, self.tc_objs) && (!typ::is_named(v, self.tc_objs) || !typ::is_named(t, self.tc_objs)) {
            return (true, None);
        }

        if self.tc_objs.types[t].try_as_type_param().is_none() && typ::is_interface(t, self.tc_objs) {
            return match self.missing_method(v, t, true) {
                Some((m, wrong)) => {
                    let name = self.tc_objs.lobjs[m].name();
                    let reason = if wrong {
                        format!("wrong type for method {}", name)
                    } else {
                        format!("missing method {}", name)
                    };
                    (false, Some(reason))
                }
                None => (true, None),
            };
        }
        (false, None)
    }
}
