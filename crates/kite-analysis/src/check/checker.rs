//! The checker state and the package-level driver.

use std::collections::HashMap;

use kite_common::diagnostics::{Diagnostic, DiagnosticSink, Label};
use kite_common::span::Span;
use kite_common::symbol::{Symbol, SymbolInterner};
use kite_syntax::ast::{Expr, ExprId, ExprKind, File, FuncDecl, Ident, TypeSpec};

use super::errors::TypeError;
use super::format::expr_string;
use super::type_info::TypeInfo;
use crate::importer::Importer;
use crate::obj::{Builtin, ConstValue, EntityType};
use crate::objects::{ObjKey, PackageKey, ScopeKey, TCObjects, TypeKey};
use crate::operand::{Operand, OperandDisplay, OperandMode};
use crate::selection::Selection;
use crate::typ::{self, BasicType};

/// What is needed to complete the declaration of a package-level object.
#[derive(Debug, Clone)]
pub(crate) enum DeclInfo<'a> {
    Const {
        file_scope: ScopeKey,
        typ: Option<&'a Expr>,
        init: Option<&'a Expr>,
        /// The init expression was carried over from an earlier spec of the
        /// same group.
        inherited: bool,
        iota: u32,
    },
    Var {
        file_scope: ScopeKey,
        /// All variables of `var a, b = f()`, when one expression
        /// initializes several.
        lhs: Option<Vec<ObjKey>>,
        typ: Option<&'a Expr>,
        init: Option<&'a Expr>,
    },
    Type {
        file_scope: ScopeKey,
        spec: &'a TypeSpec,
    },
    Func {
        file_scope: ScopeKey,
        decl: &'a FuncDecl,
    },
}

impl DeclInfo<'_> {
    pub(crate) fn file_scope(&self) -> ScopeKey {
        match self {
            DeclInfo::Const { file_scope, .. }
            | DeclInfo::Var { file_scope, .. }
            | DeclInfo::Type { file_scope, .. }
            | DeclInfo::Func { file_scope, .. } => *file_scope,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclState {
    Unresolved,
    InProgress,
    Done,
}

/// Context of the declaration being checked.
#[derive(Debug, Clone, Default)]
pub(crate) struct ObjContext {
    pub decl: Option<ObjKey>,
    pub scope: Option<ScopeKey>,
    /// Value of `iota` inside a constant declaration.
    pub iota: Option<ConstValue>,
    /// Errors are reported here instead of at the offending expression.
    /// Set for inherited constant initializers.
    pub errpos: Option<Span>,
    /// The expression being evaluated contains a call.
    pub has_call_or_recv: bool,
}

/// An untyped expression whose final type is not known yet.
#[derive(Debug, Clone)]
pub(crate) struct UntypedInfo<'a> {
    pub expr: &'a Expr,
    pub mode: OperandMode,
    pub typ: TypeKey,
}

/// A generic type instantiation. Instances are shared, so `List[int]`
/// written twice is one type.
#[derive(Debug, Clone)]
pub(crate) struct Instance {
    pub orig: TypeKey,
    pub targs: Vec<TypeKey>,
    pub inst: TypeKey,
}

pub struct Checker<'a> {
    pub(crate) tc_objs: &'a mut TCObjects,
    pub(crate) interner: &'a SymbolInterner,
    pub(crate) importer: &'a mut dyn Importer,
    pub(crate) diagnostics: DiagnosticSink,
    pub(crate) pkg: PackageKey,
    pub(crate) files: &'a [File],
    pub(crate) decls: HashMap<ObjKey, DeclInfo<'a>>,
    pub(crate) decl_states: HashMap<ObjKey, DeclState>,
    /// Package-level objects in source order.
    pub(crate) obj_list: Vec<ObjKey>,
    /// Methods collected for each receiver base type name; moved onto the
    /// named type when it is declared.
    pub(crate) methods: HashMap<ObjKey, Vec<ObjKey>>,
    /// Import declarations: the package name object and where it was
    /// imported.
    pub(crate) imports: Vec<(ObjKey, Span)>,
    pub(crate) foreign_pkg: Option<PackageKey>,
    pub(crate) fake_pkgs: HashMap<String, PackageKey>,
    pub(crate) instances: Vec<Instance>,
    /// Instances of generic types whose underlying type was not known when
    /// they were created.
    pub(crate) pending_expansions: Vec<TypeKey>,
    /// Defined types whose right-hand side is a named type that is still
    /// being declared: the defined type, the right-hand side and the type
    /// name.
    pub(crate) pending_underlying: Vec<(TypeKey, TypeKey, ObjKey)>,
    pub(crate) untyped: HashMap<ExprId, UntypedInfo<'a>>,
    pub(crate) octx: ObjContext,
    pub(crate) result: TypeInfo,
    trace: bool,
    indent: usize,
}

impl<'a> Checker<'a> {
    pub fn new(
        tc_objs: &'a mut TCObjects,
        interner: &'a SymbolInterner,
        importer: &'a mut dyn Importer,
        pkg: PackageKey,
        files: &'a [File],
        trace: bool,
    ) -> Checker<'a> {
        Checker {
            tc_objs,
            interner,
            importer,
            diagnostics: DiagnosticSink::new(),
            pkg,
            files,
            decls: HashMap::new(),
            decl_states: HashMap::new(),
            obj_list: Vec::new(),
            methods: HashMap::new(),
            imports: Vec::new(),
            foreign_pkg: None,
            fake_pkgs: HashMap::new(),
            instances: Vec::new(),
            pending_expansions: Vec::new(),
            pending_underlying: Vec::new(),
            untyped: HashMap::new(),
            octx: ObjContext::default(),
            result: TypeInfo::new(),
            trace,
            indent: 0,
        }
    }

    /// Checks the package's files.
    pub fn check(&mut self) {
        tracing::debug!(package = %self.tc_objs.pkgs[self.pkg].path(), files = self.files.len(), "checking package");
        let saved_fmt_pkg = self.tc_objs.fmt_pkg.replace(self.pkg);

        self.check_files_pkg_name();
        self.collect_objects();
        self.package_objects();
        self.resolve_pending_underlying(true);
        self.expand_pending();
        self.unused_imports();
        self.record_untyped();

        self.tc_objs.fmt_pkg = saved_fmt_pkg;
        tracing::debug!(
            errors = self.diagnostics.error_count(),
            warnings = self.diagnostics.warning_count(),
            "package checked"
        );
    }

    /// Hands out the recorded facts and the diagnostics.
    pub fn finish(self) -> (TypeInfo, DiagnosticSink) {
        (self.result, self.diagnostics)
    }

    pub fn result(&self) -> &TypeInfo {
        &self.result
    }

    /// All files must agree on the package name. The first file that names
    /// a package decides.
    fn check_files_pkg_name(&mut self) {
        let files = self.files;
        let mut pkg_name: Option<&str> = None;
        for file in files {
            let ident = match &file.package {
                Some(ident) => ident,
                None => continue,
            };
            self.result.record_def(ident, None);
            let name = self.name(ident.symbol);
            match pkg_name {
                None => {
                    pkg_name = Some(name);
                    self.tc_objs.pkgs[self.pkg].set_name(name.to_string());
                }
                Some(expected) if expected != name => {
                    self.error(
                        TypeError::PackageNameMismatch,
                        ident.span,
                        format!("package {}; expected {}", name, expected),
                    );
                }
                Some(_) => {}
            }
        }
    }

    /// Completes every package-level declaration. Aliases go last so that
    /// the types they stand for are available.
    fn package_objects(&mut self) {
        let list = self.obj_list.clone();
        let mut aliases = Vec::new();
        for obj in list {
            if let Some(DeclInfo::Type { spec, .. }) = self.decls.get(&obj) {
                if spec.assign {
                    aliases.push(obj);
                    continue;
                }
            }
            self.obj_decl(obj);
        }
        for obj in aliases {
            self.obj_decl(obj);
        }
    }

    fn unused_imports(&mut self) {
        let imports = std::mem::take(&mut self.imports);
        for &(obj, span) in &imports {
            let lobj = &self.tc_objs.lobjs[obj];
            let (imported, used) = match lobj.entity_type() {
                EntityType::PkgName { imported, used } => (*imported, *used),
                _ => continue,
            };
            if used || lobj.name() == "_" {
                continue;
            }
            let pkg = &self.tc_objs.pkgs[imported];
            let msg = if lobj.name() != pkg.name() {
                format!("{:?} imported as {} and not used", pkg.path(), lobj.name())
            } else {
                format!("{:?} imported and not used", pkg.path())
            };
            self.error(TypeError::UnusedImport, span, msg);
        }
        self.imports = imports;
    }

    /// Untyped expressions that never met a typed context keep their
    /// untyped type.
    fn record_untyped(&mut self) {
        let mut list: Vec<_> = self.untyped.drain().collect();
        list.sort_by_key(|(id, _)| *id);
        for (id, info) in list {
            self.result.record_type_and_value(id, info.mode, info.typ);
        }
    }

    // ------------------------------------------------------------------------
    // Diagnostics

    pub(crate) fn error(&mut self, code: TypeError, span: Span, msg: impl Into<String>) {
        let span = self.octx.errpos.unwrap_or(span);
        let msg = msg.into();
        tracing::trace!(code = code.code(), %msg, "type error");
        self.diagnostics.emit(code.at_with_message(span, msg));
    }

    /// Reports an error with a secondary label pointing at an earlier
    /// declaration.
    pub(crate) fn error_with_alt(&mut self, code: TypeError, span: Span, msg: String, alt: ObjKey) {
        let alt_obj = &self.tc_objs.lobjs[alt];
        let mut diag: Diagnostic = code.at_with_message(span, msg);
        if !alt_obj.span().is_dummy() {
            diag = diag.with_label(
                Label::secondary(alt_obj.span()).with_message(format!("other declaration of {}", alt_obj.name())),
            );
        }
        self.diagnostics.emit(diag);
    }

    /// Where to report errors about an operand.
    pub(crate) fn op_span(&self, x: &Operand<'_>) -> Span {
        x.span().unwrap_or_else(Span::dummy)
    }

    // ------------------------------------------------------------------------
    // Formatting helpers

    pub(crate) fn name(&self, sym: Symbol) -> &'a str {
        let interner: &'a SymbolInterner = self.interner;
        interner.resolve(sym).unwrap_or("_")
    }

    pub(crate) fn type_str(&self, t: TypeKey) -> String {
        typ::type_string(t, self.tc_objs)
    }

    pub(crate) fn op_str(&self, x: &Operand<'_>) -> String {
        OperandDisplay {
            operand: x,
            objs: self.tc_objs,
            interner: self.interner,
        }
        .to_string()
    }

    pub(crate) fn expr_str(&self, e: &Expr) -> String {
        expr_string(e, self.interner)
    }

    // ------------------------------------------------------------------------
    // Common type lookups

    pub(crate) fn invalid_type(&self) -> TypeKey {
        self.tc_objs.invalid_type()
    }

    pub(crate) fn basic_type(&self, b: BasicType) -> TypeKey {
        self.tc_objs.basic_type(b)
    }

    /// The operand's type; invalid if it has none.
    pub(crate) fn typ_of(&self, x: &Operand<'_>) -> TypeKey {
        x.typ.unwrap_or_else(|| self.invalid_type())
    }

    pub(crate) fn obj_type(&self, obj: ObjKey) -> TypeKey {
        self.tc_objs.lobjs[obj].typ().unwrap_or_else(|| self.invalid_type())
    }

    pub(crate) fn pkg_scope(&self) -> ScopeKey {
        self.tc_objs.pkgs[self.pkg].scope()
    }

    pub(crate) fn current_scope(&self) -> ScopeKey {
        self.octx.scope.unwrap_or_else(|| self.pkg_scope())
    }

    pub(crate) fn decl_state(&self, obj: ObjKey) -> DeclState {
        self.decl_states.get(&obj).copied().unwrap_or(DeclState::Unresolved)
    }

    // ------------------------------------------------------------------------
    // Recording

    pub(crate) fn record_def(&mut self, ident: &Ident, obj: Option<ObjKey>) {
        self.result.record_def(ident, obj);
    }

    pub(crate) fn record_use(&mut self, ident: &Ident, obj: ObjKey) {
        self.result.record_use(ident, obj);
    }

    pub(crate) fn record_type_and_value(&mut self, e: &Expr, mode: OperandMode, typ: TypeKey) {
        self.result.record_type_and_value(e.id, mode, typ);
    }

    pub(crate) fn remember_untyped(&mut self, e: &'a Expr, mode: OperandMode, typ: TypeKey) {
        self.untyped.insert(e.id, UntypedInfo { expr: e, mode, typ });
    }

    pub(crate) fn record_selection(&mut self, e: &Expr, sel_ident: &Ident, sel: Selection) {
        self.record_use(sel_ident, sel.obj());
        self.result.record_selection(e.id, sel);
    }

    pub(crate) fn record_inferred(&mut self, e: &Expr, targs: Vec<TypeKey>, typ: TypeKey) {
        self.result.record_inferred(e.id, targs, typ);
    }

    /// Records the signature a builtin was called with on the builtin's
    /// identifier and any parentheses around it.
    pub(crate) fn record_builtin_type(&mut self, mut e: &Expr, id: Builtin, sig: TypeKey) {
        loop {
            self.record_type_and_value(e, OperandMode::Builtin(id), sig);
            match &e.kind {
                ExprKind::Paren(inner) => e = inner,
                _ => break,
            }
        }
    }

    /// Records the two-valued type of a comma-ok expression on the
    /// expression and any parentheses around it.
    pub(crate) fn record_comma_ok_types(&mut self, mut e: &Expr, t0: TypeKey, t1: TypeKey) {
        let pkg = Some(self.pkg);
        let v0 = self.tc_objs.new_var(e.span, pkg, String::new(), Some(t0));
        let v1 = self.tc_objs.new_var(e.span, pkg, String::new(), Some(t1));
        let tuple = self.tc_objs.new_t_tuple(vec![v0, v1]);
        loop {
            match self.result.types.get_mut(&e.id) {
                Some(tv) => tv.typ = tuple,
                None => break,
            }
            match &e.kind {
                ExprKind::Paren(inner) => e = inner,
                _ => break,
            }
        }
    }

    /// A signature `func(params) result` for builtins.
    pub(crate) fn make_sig(&mut self, result: Option<TypeKey>, params: &[TypeKey], variadic: bool) -> TypeKey {
        let vars: Vec<ObjKey> = params
            .iter()
            .map(|t| self.tc_objs.new_param(Span::dummy(), None, String::new(), Some(*t)))
            .collect();
        let params = self.tc_objs.new_t_tuple(vars);
        let results = match result {
            Some(t) => {
                let v = self.tc_objs.new_param(Span::dummy(), None, String::new(), Some(t));
                self.tc_objs.new_t_tuple(vec![v])
            }
            None => self.tc_objs.universe().no_value_tuple(),
        };
        self.tc_objs.new_t_signature(None, None, params, results, variadic)
    }

    // ------------------------------------------------------------------------
    // Tracing

    pub(crate) fn trace_begin(&mut self, e: &Expr) {
        if self.trace {
            tracing::trace!("{:indent$}expr[ {} ]", "", self.expr_str(e), indent = self.indent * 2);
            self.indent += 1;
        }
    }

    pub(crate) fn trace_end(&mut self, x: &Operand<'_>) {
        if self.trace {
            self.indent = self.indent.saturating_sub(1);
            tracing::trace!("{:indent$}=> {}", "", self.op_str(x), indent = self.indent * 2);
        }
    }
}
