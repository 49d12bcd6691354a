//! Calls of builtin functions.

use kite_syntax::ast::{CallExpr, Expr};

use super::errors::TypeError;
use super::Checker;
use crate::constant;
use crate::obj::Builtin;
use crate::objects::TypeKey;
use crate::operand::{Operand, OperandMode};
use crate::typ::{self, Type};

impl<'a> Checker<'a> {
    /// Checks a call of builtin `id` and sets `x` to its result. Returns
    /// false if the call is invalid.
    pub(crate) fn builtin(&mut self, x: &mut Operand<'a>, e: &'a Expr, call: &'a CallExpr, id: Builtin) -> bool {
        let info = *self.tc_objs.universe().builtin_info(id);
        let call_str = self.expr_str(e);

        // append is the only builtin that accepts ...
        if call.spread && id != Builtin::Append {
            let msg = format!("invalid operation: invalid use of ... with built-in {}", info.name);
            self.error(TypeError::InvalidSpreadBuiltin, e.span, msg);
            self.use_exprs(&call.args);
            return false;
        }

        // len and cap are constant only if their argument contains no call.
        let saved_has_call = self.octx.has_call_or_recv;
        if matches!(id, Builtin::Len | Builtin::Cap) {
            self.octx.has_call_or_recv = false;
        }
        let ok = self.builtin_call(x, e, call, id, &call_str);
        if matches!(id, Builtin::Len | Builtin::Cap) {
            self.octx.has_call_or_recv = saved_has_call;
        }
        ok
    }

    fn builtin_call(&mut self, x: &mut Operand<'a>, e: &'a Expr, call: &'a CallExpr, id: Builtin, call_str: &str) -> bool {
        let info = *self.tc_objs.universe().builtin_info(id);

        // make and new take a type first and evaluate their own arguments
        let mut args = Vec::new();
        let nargs = match id {
            Builtin::Make | Builtin::New => call.args.len(),
            _ => {
                args = self.expr_list(&call.args, false).0;
                if let Some(first) = args.first() {
                    *x = first.clone();
                    if x.invalid() {
                        return false;
                    }
                }
                args.len()
            }
        };

        let problem = if nargs < info.arg_count {
            Some("not enough")
        } else if !info.variadic && nargs > info.arg_count {
            Some("too many")
        } else {
            None
        };
        if let Some(problem) = problem {
            let msg = format!(
                "invalid operation: {} arguments for {} (expected {}, found {})",
                problem, call_str, info.arg_count, nargs
            );
            self.error(TypeError::BuiltinArgCount, e.span, msg);
            return false;
        }

        let int = self.basic_type(crate::typ::BasicType::Int);
        match id {
            Builtin::Append => {
                // append(s S, x ...T) S, where T is the element type of S
                let s = self.typ_of(x);
                let elem = match typ::slice_elem(s, self.tc_objs) {
                    Some(elem) => elem,
                    None => {
                        let msg = format!("invalid argument: {} is not a slice", self.op_str(x));
                        self.error(TypeError::InvalidBuiltinArg, self.op_span(x), msg);
                        return false;
                    }
                };

                // append([]byte, string...) appends the bytes of the string
                if nargs == 2 && call.spread {
                    let byte = self.tc_objs.universe().byte();
                    let bytes = self.tc_objs.new_t_slice(byte);
                    if self.assignable_to(x, bytes).0 && !args[1].invalid() {
                        let arg_t = self.typ_of(&args[1]);
                        if typ::is_string(arg_t, self.tc_objs) {
                            let sig = self.make_sig(Some(s), &[s, arg_t], true);
                            self.record_builtin_type(&call.func, id, sig);
                            x.mode = OperandMode::Value;
                            x.typ = Some(s);
                            return true;
                        }
                    }
                }

                let elems = self.tc_objs.new_t_slice(elem);
                let sig = self.make_sig(Some(s), &[s, elems], true);
                args[0] = x.clone();
                // errors in the appended values do not change the result
                let _ = self.arguments(e, call, sig, &mut args);
                x.mode = OperandMode::Value;
                x.typ = Some(s);
                self.record_builtin_type(&call.func, id, sig);
            }

            Builtin::Cap | Builtin::Len => {
                let xt = self.typ_of(x);
                let mut t = typ::underlying_type(xt, self.tc_objs);
                // implicit dereference of pointers to arrays
                if let Some(base) = self.tc_objs.types[t].try_as_pointer() {
                    let base_u = typ::underlying_type(base, self.tc_objs);
                    if self.tc_objs.types[base_u].try_as_array().is_some() {
                        t = base_u;
                    }
                }
                let mode = match &self.tc_objs.types[t] {
                    Type::Basic(b) if b.is_string() && id == Builtin::Len => match x.mode.constant_val() {
                        Some(val) => {
                            let n = val.str_val().map_or(0, str::len);
                            Some(OperandMode::Constant(constant::make_int64(n as i64)))
                        }
                        None => Some(OperandMode::Value),
                    },
                    Type::Array(a) if !self.octx.has_call_or_recv => Some(OperandMode::Constant(match a.len {
                        Some(n) => constant::make_int64(n as i64),
                        None => constant::Value::Unknown,
                    })),
                    Type::Array(_) | Type::Slice(_) => Some(OperandMode::Value),
                    Type::Map(_) if id == Builtin::Len => Some(OperandMode::Value),
                    _ => None,
                };
                let mode = match mode {
                    Some(mode) => mode,
                    None => {
                        if t != self.invalid_type() {
                            let msg = format!("invalid argument: {} for {}", self.op_str(x), info.name);
                            self.error(TypeError::InvalidBuiltinArg, self.op_span(x), msg);
                        }
                        return false;
                    }
                };
                let constant_result = mode.constant_val().is_some();
                x.mode = mode;
                x.typ = Some(int);
                if !constant_result {
                    let sig = self.make_sig(Some(int), &[t], false);
                    self.record_builtin_type(&call.func, id, sig);
                }
            }

            Builtin::Copy => {
                // copy(dst, src []T) int
                let dst = typ::slice_elem(self.typ_of(x), self.tc_objs);
                let y = &args[1];
                if y.invalid() {
                    return false;
                }
                let yt = self.typ_of(y);
                let src = if typ::is_string(yt, self.tc_objs) {
                    Some(self.tc_objs.universe().byte())
                } else {
                    typ::slice_elem(yt, self.tc_objs)
                };
                let (dst, src) = match (dst, src) {
                    (Some(dst), Some(src)) => (dst, src),
                    _ => {
                        let msg = format!(
                            "invalid argument: copy expects slice arguments; found {} and {}",
                            self.op_str(x),
                            self.op_str(y)
                        );
                        self.error(TypeError::InvalidBuiltinArg, self.op_span(x), msg);
                        return false;
                    }
                };
                if !typ::identical(dst, src, self.tc_objs) {
                    let msg = format!(
                        "invalid argument: arguments to copy {} and {} have different element types {} and {}",
                        self.op_str(x),
                        self.op_str(y),
                        self.type_str(dst),
                        self.type_str(src)
                    );
                    self.error(TypeError::InvalidBuiltinArg, self.op_span(x), msg);
                    return false;
                }
                let sig = self.make_sig(Some(int), &[self.typ_of(x), yt], false);
                self.record_builtin_type(&call.func, id, sig);
                x.mode = OperandMode::Value;
                x.typ = Some(int);
            }

            Builtin::Delete => {
                // delete(m, k)
                let m = self.typ_of(x);
                let key = match self.tc_objs.types[typ::underlying_type(m, self.tc_objs)].try_as_map() {
                    Some(map) => map.key,
                    None => {
                        let msg = format!("invalid argument: {} is not a map", self.op_str(x));
                        self.error(TypeError::InvalidBuiltinArg, self.op_span(x), msg);
                        return false;
                    }
                };
                let mut k = args[1].clone();
                if k.invalid() {
                    return false;
                }
                self.assignment(&mut k, Some(key), "argument to delete");
                if k.invalid() {
                    return false;
                }
                let sig = self.make_sig(None, &[m, key], false);
                self.record_builtin_type(&call.func, id, sig);
                x.mode = OperandMode::NoValue;
                x.typ = Some(self.tc_objs.universe().no_value_tuple());
            }

            Builtin::Make => {
                // make(T, n) or make(T, n, m)
                let arg0 = &call.args[0];
                let t = self.typ(arg0);
                if t == self.invalid_type() {
                    return false;
                }
                let min = match &self.tc_objs.types[typ::underlying_type(t, self.tc_objs)] {
                    Type::Slice(_) => 2,
                    Type::Map(_) => 1,
                    _ => {
                        let msg = format!(
                            "invalid argument: cannot make {}; type must be slice or map",
                            self.expr_str(arg0)
                        );
                        self.error(TypeError::InvalidBuiltinArg, arg0.span, msg);
                        return false;
                    }
                };
                if nargs < min || min + 1 < nargs {
                    let msg = format!(
                        "invalid operation: {} expects {} or {} arguments; found {}",
                        call_str,
                        min,
                        min + 1,
                        nargs
                    );
                    self.error(TypeError::BuiltinArgCount, e.span, msg);
                    return false;
                }
                let sizes: Vec<i64> = call.args[1..]
                    .iter()
                    .filter_map(|arg| match self.index(arg, None) {
                        (true, Some(n)) => Some(n),
                        _ => None,
                    })
                    .collect();
                if let [len, cap] = sizes.as_slice() {
                    if len > cap {
                        self.error(
                            TypeError::InvalidBuiltinArg,
                            call.args[1].span,
                            "invalid argument: length and capacity swapped",
                        );
                    }
                }
                let params: Vec<TypeKey> = std::iter::once(t)
                    .chain(std::iter::repeat(int).take(nargs - 1))
                    .collect();
                let sig = self.make_sig(Some(t), &params, false);
                self.record_builtin_type(&call.func, id, sig);
                x.mode = OperandMode::Value;
                x.typ = Some(t);
            }

            Builtin::New => {
                // new(T)
                let t = self.typ(&call.args[0]);
                if t == self.invalid_type() {
                    return false;
                }
                let ptr = self.tc_objs.new_t_pointer(t);
                let sig = self.make_sig(Some(ptr), &[t], false);
                self.record_builtin_type(&call.func, id, sig);
                x.mode = OperandMode::Value;
                x.typ = Some(ptr);
            }

            Builtin::Panic => {
                // panic(x any)
                let any = self.tc_objs.universe().any_type();
                self.assignment(x, Some(any), "argument to panic");
                if x.invalid() {
                    return false;
                }
                let sig = self.make_sig(None, &[any], false);
                self.record_builtin_type(&call.func, id, sig);
                x.mode = OperandMode::NoValue;
                x.typ = Some(self.tc_objs.universe().no_value_tuple());
            }

            Builtin::Print | Builtin::Println => {
                let context = format!("argument to {}", info.name);
                let mut params = Vec::with_capacity(nargs);
                for arg in args.iter_mut() {
                    self.assignment(arg, None, &context);
                    if arg.invalid() {
                        return false;
                    }
                    params.push(self.typ_of(arg));
                }
                let sig = self.make_sig(None, &params, false);
                self.record_builtin_type(&call.func, id, sig);
                x.mode = OperandMode::NoValue;
                x.typ = Some(self.tc_objs.universe().no_value_tuple());
            }

            Builtin::Recover => {
                // recover() any
                let any = self.tc_objs.universe().any_type();
                let sig = self.make_sig(Some(any), &[], false);
                self.record_builtin_type(&call.func, id, sig);
                x.mode = OperandMode::Value;
                x.typ = Some(any);
            }
        }
        true
    }
}
