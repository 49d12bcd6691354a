//! Call expressions: conversions, builtin calls, generic instantiation and
//! ordinary function calls.

use kite_common::span::Span;
use kite_syntax::ast::{CallExpr, Expr};

use super::errors::TypeError;
use super::subst::SubstMap;
use super::Checker;
use crate::objects::{ObjKey, TypeKey};
use crate::operand::{Operand, OperandMode};
use crate::typ::{self, BasicType};

impl<'a> Checker<'a> {
    pub(crate) fn call(&mut self, x: &mut Operand<'a>, e: &'a Expr, call: &'a CallExpr) {
        self.expr_or_type(x, &call.func);

        match x.mode.clone() {
            OperandMode::Invalid => {
                self.use_exprs(&call.args);
            }

            OperandMode::TypeExpr => {
                let t = self.typ_of(x);
                x.mode = OperandMode::Invalid;
                if typ::is_generic(t, self.tc_objs) {
                    self.call_instantiates_type(x, e, call, t);
                    return;
                }
                match call.args.as_slice() {
                    [] => {
                        let msg = format!("missing argument in conversion to {}", self.type_str(t));
                        self.error(TypeError::MissingConversionArg, e.span, msg);
                    }
                    [arg] => {
                        self.expr(x, arg);
                        if !x.invalid() {
                            self.conversion(x, t);
                        }
                    }
                    [.., last] => {
                        self.use_exprs(&call.args);
                        let msg = format!("too many arguments in conversion to {}", self.type_str(t));
                        self.error(TypeError::TooManyConversionArgs, last.span, msg);
                    }
                }
            }

            OperandMode::Builtin(id) => {
                if !self.builtin(x, e, call, id) {
                    x.mode = OperandMode::Invalid;
                }
                // a non-constant result implies a function call
                if !x.invalid() && x.mode.constant_val().is_none() {
                    self.octx.has_call_or_recv = true;
                }
            }

            mode => {
                let foreign = mode == OperandMode::ForeignFunc;
                let sig_t = typ::underlying_type(self.typ_of(x), self.tc_objs);
                let tparams = match self.tc_objs.types[sig_t].try_as_signature() {
                    Some(sig) => sig.tparams.clone(),
                    None => {
                        let msg = format!("invalid operation: cannot call non-function {}", self.op_str(x));
                        self.error(TypeError::CannotCall, self.op_span(x), msg);
                        x.mode = OperandMode::Invalid;
                        return;
                    }
                };

                let mut args = self.expr_or_type_list(&call.args);

                // f(int, string): explicit type arguments
                if !tparams.is_empty() && args.first().map_or(false, |a| a.mode == OperandMode::TypeExpr) {
                    self.call_instantiates_func(x, e, sig_t, &tparams, &args);
                    return;
                }

                let rsig = match self.arguments(e, call, sig_t, &mut args) {
                    Some(rsig) => rsig,
                    None => {
                        x.mode = OperandMode::Invalid;
                        return;
                    }
                };

                let (results, rsig_generic) = match self.tc_objs.types[rsig].try_as_signature() {
                    Some(sig) => (sig.results, !sig.tparams.is_empty()),
                    None => unreachable!("call result of a non-signature"),
                };
                let result_vars = self.tc_objs.tuple_vars(results).to_vec();
                match result_vars.as_slice() {
                    [] => {
                        x.mode = OperandMode::NoValue;
                        x.typ = Some(results);
                    }
                    [v] => {
                        x.mode = if foreign {
                            OperandMode::CommaErr
                        } else {
                            OperandMode::Value
                        };
                        x.typ = Some(self.obj_type(*v));
                    }
                    _ => {
                        x.mode = OperandMode::Value;
                        x.typ = Some(results);
                    }
                }
                self.octx.has_call_or_recv = true;

                // operands never have a parameterized type
                if x.mode == OperandMode::Value && rsig_generic && typ::is_parameterized(self.typ_of(x), self.tc_objs) {
                    x.mode = OperandMode::Invalid;
                }
            }
        }
    }

    /// `List(int)`: a call of a generic type instantiates it.
    fn call_instantiates_type(&mut self, x: &mut Operand<'a>, e: &'a Expr, call: &'a CallExpr, generic: TypeKey) {
        let targs = match self.type_list(&call.args) {
            Some(targs) => targs,
            None => return,
        };
        let want = self.tc_objs.types[generic].try_as_named().map_or(0, |n| n.tparams.len());
        if targs.len() != want {
            let msg = format!(
                "got {} type arguments but {} has {} type parameters",
                targs.len(),
                self.type_str(generic),
                want
            );
            self.error(TypeError::WrongTypeArgCount, e.span, msg);
            return;
        }
        let spans: Vec<Span> = call.args.iter().map(|a| a.span).collect();
        let inst = self.instantiate(e.span, generic, &targs, &spans);
        self.record_inferred(e, targs, inst);
        x.mode = OperandMode::TypeExpr;
        x.typ = Some(inst);
    }

    /// `f(int, string)`: every argument must be a type and there must be
    /// one per type parameter. The result is the instantiated function.
    fn call_instantiates_func(
        &mut self,
        x: &mut Operand<'a>,
        e: &'a Expr,
        sig_t: TypeKey,
        tparams: &[ObjKey],
        args: &[Operand<'a>],
    ) {
        let n = args.len();
        if n != tparams.len() {
            let msg = format!("got {} type arguments but want {}", n, tparams.len());
            self.error(TypeError::WrongTypeArgCount, self.op_span(&args[n - 1]), msg);
            x.mode = OperandMode::Invalid;
            return;
        }
        let mut targs = Vec::with_capacity(n);
        let mut spans = Vec::with_capacity(n);
        for a in args {
            if a.mode != OperandMode::TypeExpr {
                // reported as a mix of values and types
                x.mode = OperandMode::Invalid;
                return;
            }
            targs.push(self.typ_of(a));
            spans.push(self.op_span(a));
        }
        let span = self.op_span(x);
        let inst = self.instantiate(span, sig_t, &targs, &spans);
        self.record_inferred(e, targs, inst);
        x.mode = OperandMode::Value;
        x.typ = Some(inst);
    }

    /// Evaluates call arguments that may be values or types. A single call
    /// returning several values is spread into one operand per value.
    pub(crate) fn expr_or_type_list(&mut self, elist: &'a [Expr]) -> Vec<Operand<'a>> {
        match elist {
            [] => Vec::new(),
            [e] => {
                let mut x = Operand::new();
                self.multi_expr_or_type(&mut x, e);
                if x.mode != OperandMode::TypeExpr {
                    if let Some(list) = self.spread_tuple(&x, e) {
                        return list;
                    }
                }
                vec![x]
            }
            _ => {
                let mut list = Vec::with_capacity(elist.len());
                let (mut ntypes, mut nvalues) = (0, 0);
                for e in elist {
                    let mut x = Operand::new();
                    self.expr_or_type(&mut x, e);
                    match x.mode {
                        OperandMode::Invalid => {}
                        OperandMode::TypeExpr => ntypes += 1,
                        _ => nvalues += 1,
                    }
                    list.push(x);
                }
                // invalid operands were reported already
                if ntypes > 0 && nvalues > 0 {
                    self.error(
                        TypeError::MixedValueAndType,
                        self.op_span(&list[0]),
                        "mix of value and type expressions",
                    );
                }
                list
            }
        }
    }

    /// Evaluates a list of value expressions. With `allow_comma_ok`, a
    /// single comma-ok expression yields its value and a second operand for
    /// the flag, and the returned bool is set.
    pub(crate) fn expr_list(&mut self, elist: &'a [Expr], allow_comma_ok: bool) -> (Vec<Operand<'a>>, bool) {
        match elist {
            [] => (Vec::new(), false),
            [e] => {
                let mut x = Operand::new();
                self.multi_expr(&mut x, e);
                if let Some(list) = self.spread_tuple(&x, e) {
                    return (list, false);
                }
                if allow_comma_ok && x.mode.is_comma_ok() {
                    let second = if x.mode == OperandMode::CommaErr {
                        self.tc_objs.universe().error_type()
                    } else {
                        self.basic_type(BasicType::UntypedBool)
                    };
                    x.mode = OperandMode::Value;
                    let flag = Operand::with(OperandMode::Value, Some(e), Some(second));
                    return (vec![x, flag], true);
                }
                (vec![x], false)
            }
            _ => {
                let list = elist
                    .iter()
                    .map(|e| {
                        let mut x = Operand::new();
                        self.expr(&mut x, e);
                        x
                    })
                    .collect();
                (list, false)
            }
        }
    }

    /// One value operand per element if `x` is a multi-valued call.
    fn spread_tuple(&self, x: &Operand<'a>, e: &'a Expr) -> Option<Vec<Operand<'a>>> {
        if x.invalid() {
            return None;
        }
        let tuple = self.tc_objs.types[self.typ_of(x)].try_as_tuple()?;
        Some(
            tuple
                .vars
                .iter()
                .map(|v| Operand::with(OperandMode::Value, Some(e), Some(self.obj_type(*v))))
                .collect(),
        )
    }

    /// Matches arguments against the parameters of `sig_t`, infers type
    /// arguments for generic functions and checks each argument.
    ///
    /// Count and inference problems stop checking before any argument is
    /// looked at; assignment problems are reported for every argument.
    /// Returns the signature the call uses: instantiated for generic
    /// functions, `sig_t` itself otherwise or when the count is off. Returns
    /// `None` if type inference failed.
    pub(crate) fn arguments(
        &mut self,
        e: &'a Expr,
        call: &'a CallExpr,
        sig_t: TypeKey,
        args: &mut [Operand<'a>],
    ) -> Option<TypeKey> {
        for a in args.iter() {
            match a.mode {
                OperandMode::TypeExpr => {
                    let msg = format!("{} used as value", self.op_str(a));
                    self.error(TypeError::UsedAsValue, self.op_span(a), msg);
                    return Some(sig_t);
                }
                OperandMode::Invalid => return Some(sig_t),
                _ => {}
            }
        }

        let sig = match self.tc_objs.types[sig_t].try_as_signature() {
            Some(sig) => sig.clone(),
            None => unreachable!("arguments for a non-signature"),
        };
        let fun = self.expr_str(&call.func);
        let nargs = args.len();
        let mut npars = self.tc_objs.tuple_vars(sig.params).len();

        // Parameters lined up with the arguments.
        let mut params = sig.params;
        let mut adjusted = false;
        if sig.variadic {
            if call.spread {
                // f(g()...) where g returns several values
                if call.args.len() == 1 && nargs > 1 {
                    let msg = format!("cannot use ... with {}-valued {}", nargs, self.expr_str(&call.args[0]));
                    self.error(TypeError::SpreadMultiValue, e.span, msg);
                    return Some(sig_t);
                }
            } else if nargs + 1 >= npars {
                params = self.expand_variadic(sig.params, nargs);
                adjusted = true;
                npars = nargs;
            } else {
                npars -= 1;
            }
        } else if call.spread {
            let msg = format!("cannot use ... in call to non-variadic {}", fun);
            self.error(TypeError::SpreadNonVariadic, e.span, msg);
            return Some(sig_t);
        }

        if nargs < npars {
            let msg = format!("not enough arguments in call to {}", fun);
            self.error(TypeError::TooFewArgs, call.func.span, msg);
            return Some(sig_t);
        }
        if nargs > npars {
            let msg = format!("too many arguments in call to {}", fun);
            self.error(TypeError::TooManyArgs, self.op_span(&args[npars]), msg);
            return Some(sig_t);
        }

        let mut rsig = sig_t;
        if !sig.tparams.is_empty() {
            let targs = self.infer(e.span, &sig.tparams, params, args)?;
            rsig = self.instantiate(e.span, sig_t, &targs, &[]);
            let smap = SubstMap::new(&sig.tparams, &targs, self.tc_objs);
            self.record_inferred(e, targs, rsig);
            params = if adjusted {
                self.subst(params, &smap)
            } else {
                match self.tc_objs.types[rsig].try_as_signature() {
                    Some(inst) => inst.params,
                    None => params,
                }
            };
        }

        let param_types = self.tc_objs.tuple_types(params);
        for (a, pt) in args.iter_mut().zip(param_types) {
            self.assignment(a, Some(pt), "argument");
        }
        Some(rsig)
    }

    /// Keeps all but the last (variadic) parameter and adds one parameter of
    /// the element type for each remaining argument.
    fn expand_variadic(&mut self, params: TypeKey, nargs: usize) -> TypeKey {
        let vars = self.tc_objs.tuple_vars(params).to_vec();
        let (last, fixed) = match vars.split_last() {
            Some(split) => split,
            None => unreachable!("variadic signature without parameters"),
        };
        let (span, pkg, name, last_t) = {
            let lobj = &self.tc_objs.lobjs[*last];
            (lobj.span(), lobj.pkg(), lobj.name().to_string(), lobj.typ())
        };
        let elem = last_t
            .and_then(|t| typ::slice_elem(t, self.tc_objs))
            .unwrap_or_else(|| self.invalid_type());

        let mut expanded = fixed.to_vec();
        while expanded.len() < nargs {
            expanded.push(self.tc_objs.new_param(span, pkg, name.clone(), Some(elem)));
        }
        self.tc_objs.new_t_tuple(expanded)
    }
}
