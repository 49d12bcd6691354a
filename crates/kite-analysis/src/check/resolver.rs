//! Declaration resolver: collects package-level objects.
//!
//! The first pass over a package's files. It declares every package-level
//! const, var, type and function, imports packages into file scopes, and
//! associates methods with the type name of their receiver. Nothing is
//! type-checked here; declarations are completed later by `obj_decl`.

use std::collections::HashSet;

use kite_syntax::ast::{Decl, Expr, ExprKind, FuncDecl, Ident, ImportSpec, TypeSpec, ValueSpec};

use super::checker::{Checker, DeclInfo};
use super::errors::TypeError;
use crate::constant;
use crate::importer::{ImportKey, ImportResult};
use crate::objects::{ObjKey, PackageKey, ScopeKey};
use crate::scope::Scope;

/// Import path of the foreign-function pseudo package.
pub(crate) const FOREIGN_PATH: &str = "C";

impl<'a> Checker<'a> {
    pub(crate) fn collect_objects(&mut self) {
        let files = self.files;
        let pkg_scope = self.pkg_scope();
        let mut file_scopes = Vec::with_capacity(files.len());
        let mut methods: Vec<(ObjKey, &'a Expr)> = Vec::new();

        for file in files {
            let file_scope = self.tc_objs.new_scope(Some(pkg_scope), "file");
            file_scopes.push(file_scope);

            for imp in &file.imports {
                self.collect_import(file_scope, imp);
            }
            for decl in &file.decls {
                match decl {
                    Decl::Const(spec) => self.collect_consts(file_scope, spec),
                    Decl::Var(spec) => self.collect_vars(file_scope, spec),
                    Decl::Type(spec) => self.collect_type(file_scope, spec),
                    Decl::Func(fdecl) => {
                        if let Some(recv_ty) = self.collect_func(file_scope, fdecl) {
                            methods.push(recv_ty);
                        }
                    }
                }
            }
        }

        // Package-level names must not collide with imports of any file.
        for &fs in &file_scopes {
            let names: Vec<String> = self.tc_objs.scopes[fs].names().iter().map(|s| s.to_string()).collect();
            for name in names {
                let alt = match self.tc_objs.scopes[pkg_scope].lookup(&name) {
                    Some(alt) => alt,
                    None => continue,
                };
                let obj = match self.tc_objs.scopes[fs].lookup(&name) {
                    Some(obj) => obj,
                    None => continue,
                };
                if let Some(imported) = self.tc_objs.lobjs[obj].pkg_name_imported() {
                    let pkg = self.tc_objs.pkgs[imported].to_string();
                    let span = self.tc_objs.lobjs[alt].span();
                    self.error_with_alt(
                        TypeError::Redeclared,
                        span,
                        format!("{} already declared through import of {}", name, pkg),
                        obj,
                    );
                }
            }
        }

        for (m, recv_ty) in methods {
            if let Some((ptr, base)) = self.resolve_base_type_name(recv_ty) {
                self.tc_objs.lobjs[m].set_func_has_ptr_recv(ptr);
                self.methods.entry(base).or_default().push(m);
            }
        }

        tracing::debug!(objects = self.obj_list.len(), "collected package objects");
    }

    fn collect_import(&mut self, file_scope: ScopeKey, imp: &'a ImportSpec) {
        let imported = self.import_package(imp);
        let name = match &imp.name {
            Some(ident) => self.name(ident.symbol).to_string(),
            None => self.tc_objs.pkgs[imported].name().to_string(),
        };
        let obj = self.tc_objs.new_pkg_name(imp.span, Some(self.pkg), name, imported);
        if imp.path == FOREIGN_PATH {
            // Foreign objects are declared by generated code, not through
            // the import.
            self.tc_objs.lobjs[obj].set_pkg_name_used();
        }
        self.imports.push((obj, imp.span));
        self.tc_objs.pkgs[self.pkg].add_import(imported);
        self.declare(file_scope, imp.name.as_ref(), obj);
    }

    /// Imports a package, substituting a fake package when that fails so that
    /// checking can go on.
    fn import_package(&mut self, imp: &ImportSpec) -> PackageKey {
        let path = imp.path.as_str();
        if path == FOREIGN_PATH {
            if let Some(pkg) = self.foreign_pkg {
                return pkg;
            }
            let pkg = self.tc_objs.new_package(FOREIGN_PATH.to_string());
            self.tc_objs.pkgs[pkg].set_name(FOREIGN_PATH.to_string());
            self.tc_objs.pkgs[pkg].mark_foreign();
            self.foreign_pkg = Some(pkg);
            return pkg;
        }

        let key = ImportKey::new(path, self.tc_objs.pkgs[self.pkg].path());
        match self.importer.import(&key) {
            ImportResult::Ok(pkg) => return pkg,
            ImportResult::Err(msg) => self.error(
                TypeError::ImportFailed,
                imp.path_span,
                format!("could not import {} ({})", path, msg),
            ),
            ImportResult::Cycle => self.error(TypeError::ImportCycle, imp.path_span, "import cycle not allowed"),
        }
        self.fake_package(path)
    }

    fn fake_package(&mut self, path: &str) -> PackageKey {
        if let Some(&pkg) = self.fake_pkgs.get(path) {
            return pkg;
        }
        let pkg = self.tc_objs.new_package(path.to_string());
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        self.tc_objs.pkgs[pkg].set_name(name);
        self.tc_objs.pkgs[pkg].mark_fake();
        self.fake_pkgs.insert(path.to_string(), pkg);
        pkg
    }

    fn collect_consts(&mut self, file_scope: ScopeKey, spec: &'a ValueSpec) {
        for (i, ident) in spec.names.iter().enumerate() {
            let name = self.name(ident.symbol).to_string();
            let obj = self.tc_objs.new_const(
                ident.span,
                Some(self.pkg),
                name,
                None,
                constant::make_int64(spec.iota as i64),
            );
            let info = DeclInfo::Const {
                file_scope,
                typ: spec.ty.as_ref(),
                init: spec.values.get(i),
                inherited: spec.implicit,
                iota: spec.iota,
            };
            self.declare_pkg_obj(ident, obj, info);
        }
        self.arity_match(spec, true);
    }

    fn collect_vars(&mut self, file_scope: ScopeKey, spec: &'a ValueSpec) {
        let pkg = Some(self.pkg);
        let lhs: Vec<ObjKey> = spec
            .names
            .iter()
            .map(|ident| {
                let name = self.name(ident.symbol).to_string();
                self.tc_objs.new_var(ident.span, pkg, name, None)
            })
            .collect();

        // `var a, b = f()`: one initializer shared by all variables.
        let shared = spec.names.len() > 1 && spec.values.len() == 1;
        for (i, ident) in spec.names.iter().enumerate() {
            let info = if shared {
                DeclInfo::Var {
                    file_scope,
                    lhs: Some(lhs.clone()),
                    typ: spec.ty.as_ref(),
                    init: spec.values.first(),
                }
            } else {
                DeclInfo::Var {
                    file_scope,
                    lhs: None,
                    typ: spec.ty.as_ref(),
                    init: spec.values.get(i),
                }
            };
            self.declare_pkg_obj(ident, lhs[i], info);
        }

        if spec.ty.is_none() || !spec.values.is_empty() {
            self.arity_match(spec, false);
        }
    }

    /// Reports a mismatch between the number of names and initializers of
    /// a value spec.
    fn arity_match(&mut self, spec: &ValueSpec, is_const: bool) {
        let (l, r) = (spec.names.len(), spec.values.len());
        if l < r {
            let span = if spec.implicit { spec.span } else { spec.values[l].span };
            self.error(TypeError::ExtraInitExpr, span, "extra init expr");
        } else if l > r && (is_const || r != 1) {
            let ident = &spec.names[r];
            let msg = format!("missing init expr for {}", self.name(ident.symbol));
            self.error(TypeError::MissingInitExpr, ident.span, msg);
        }
    }

    fn collect_type(&mut self, file_scope: ScopeKey, spec: &'a TypeSpec) {
        let name = self.name(spec.name.symbol).to_string();
        let obj = self.tc_objs.new_type_name(spec.name.span, Some(self.pkg), name, None);
        self.declare_pkg_obj(&spec.name, obj, DeclInfo::Type { file_scope, spec });
    }

    /// Declares a function. Methods are not declared in any scope; their
    /// receiver type expression is returned for association with the base
    /// type once all type names are known.
    fn collect_func(&mut self, file_scope: ScopeKey, fdecl: &'a FuncDecl) -> Option<(ObjKey, &'a Expr)> {
        let name = self.name(fdecl.name.symbol);
        let obj = self.tc_objs.new_func(fdecl.name.span, Some(self.pkg), name.to_string(), None);
        let method = match &fdecl.recv {
            None => {
                let pkg_scope = self.pkg_scope();
                self.declare(pkg_scope, Some(&fdecl.name), obj);
                None
            }
            Some(recv) => {
                self.record_def(&fdecl.name, Some(obj));
                if name != "_" {
                    Some((obj, &recv.ty))
                } else {
                    None
                }
            }
        };
        self.decls.insert(obj, DeclInfo::Func { file_scope, decl: fdecl });
        self.obj_list.push(obj);
        method
    }

    fn declare_pkg_obj(&mut self, ident: &Ident, obj: ObjKey, info: DeclInfo<'a>) {
        let pkg_scope = self.pkg_scope();
        self.declare(pkg_scope, Some(ident), obj);
        self.decls.insert(obj, info);
        self.obj_list.push(obj);
    }

    /// Inserts `obj` into `scope` and records the defining identifier.
    /// Blank names are never inserted.
    pub(crate) fn declare(&mut self, scope: ScopeKey, ident: Option<&Ident>, obj: ObjKey) {
        let name = self.tc_objs.lobjs[obj].name().to_string();
        if name != "_" {
            if let Some(alt) = Scope::insert(scope, obj, self.tc_objs) {
                let span = self.tc_objs.lobjs[obj].span();
                self.error_with_alt(
                    TypeError::Redeclared,
                    span,
                    format!("{} redeclared in this block", name),
                    alt,
                );
                return;
            }
        }
        if let Some(ident) = ident {
            self.record_def(ident, Some(obj));
        }
    }

    /// Finds the package-level type name a receiver type expression denotes,
    /// following aliases. Reports whether the receiver is a pointer.
    pub(crate) fn resolve_base_type_name(&self, recv_ty: &'a Expr) -> Option<(bool, ObjKey)> {
        let mut ptr = false;
        let mut e = recv_ty.unparen();
        if let ExprKind::Star(inner) = &e.kind {
            ptr = true;
            e = inner.unparen();
        }
        if let ExprKind::Index(index) = &e.kind {
            e = index.expr.unparen();
        }

        let pkg_scope = self.pkg_scope();
        let mut seen = HashSet::new();
        loop {
            let ident = e.as_ident()?;
            let obj = self.tc_objs.scopes[pkg_scope].lookup(self.name(ident.symbol))?;
            if !seen.insert(obj) {
                return None;
            }
            let spec = match self.decls.get(&obj) {
                Some(DeclInfo::Type { spec, .. }) => *spec,
                _ => return None,
            };
            if !spec.assign {
                return Some((ptr, obj));
            }
            e = spec.ty.unparen();
            if let ExprKind::Star(inner) = &e.kind {
                // A pointer receiver cannot go through an alias of a pointer.
                if ptr {
                    return None;
                }
                ptr = true;
                e = inner.unparen();
            }
        }
    }
}
