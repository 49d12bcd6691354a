//! Project analysis - entry point for type checking a set of Kite packages.
//!
//! Packages are given as in-memory sources. All files are parsed into one
//! source map, packages are ordered so that every package is checked after
//! the packages it imports, and each package is then checked against the
//! same object arena. Checked packages are handed to their importers
//! through a [`MapImporter`].

use std::collections::HashMap;

use kite_common::diagnostics::{Diagnostic, DiagnosticSink};
use kite_common::source::SourceMap;
use kite_common::symbol::SymbolInterner;
use kite_syntax::ast::{File, IdGen};
use kite_syntax::parser;

use crate::check::resolver::FOREIGN_PATH;
use crate::check::{Checker, TypeInfo};
use crate::importer::MapImporter;
use crate::objects::{PackageKey, TCObjects};

/// Operational failures of project analysis. Problems in the analyzed
/// source are diagnostics, not errors.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("import cycle: {}", cycle.join(" -> "))]
    ImportCycle { cycle: Vec<String> },
    #[error("package {path:?} is given more than once")]
    DuplicatePackage { path: String },
    #[error("analysis failed with {errors} error(s)")]
    Failed { errors: usize },
}

/// Options for project analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Enable type checker trace output.
    pub trace: bool,
}

impl AnalysisOptions {
    /// Reads options from the environment: `KITE_TRACE` set to `1`, `true`
    /// or `on` enables tracing.
    pub fn from_env() -> Self {
        let trace = std::env::var("KITE_TRACE")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);
        AnalysisOptions { trace }
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on")
}

/// The source files of one package.
#[derive(Debug, Clone)]
pub struct PackageSource {
    /// Import path of the package.
    pub path: String,
    /// File names and contents.
    pub files: Vec<(String, String)>,
}

impl PackageSource {
    pub fn new(path: impl Into<String>) -> Self {
        PackageSource {
            path: path.into(),
            files: Vec::new(),
        }
    }

    pub fn with_file(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.push((name.into(), text.into()));
        self
    }
}

/// A checked package.
pub struct CheckedPackage {
    pub path: String,
    pub key: PackageKey,
    pub files: Vec<File>,
    pub info: TypeInfo,
}

/// Result of project analysis.
pub struct Project {
    /// Shared type checking objects storage (arena).
    pub objs: TCObjects,
    pub interner: SymbolInterner,
    pub source_map: SourceMap,
    /// Checked packages in dependency order. Empty if parsing failed.
    pub packages: Vec<CheckedPackage>,
    /// Syntax and type diagnostics of all packages.
    pub diagnostics: DiagnosticSink,
}

impl Project {
    pub fn package(&self, path: &str) -> Option<&CheckedPackage> {
        self.packages.iter().find(|p| p.path == path)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Fails if any error was reported.
    pub fn ensure_ok(&self) -> Result<(), AnalysisError> {
        match self.diagnostics.error_count() {
            0 => Ok(()),
            errors => Err(AnalysisError::Failed { errors }),
        }
    }
}

/// Parses and checks `sources`.
pub fn analyze_project(sources: Vec<PackageSource>, options: &AnalysisOptions) -> Result<Project, AnalysisError> {
    let mut source_map = SourceMap::new();
    let mut interner = SymbolInterner::new();
    let mut ids = IdGen::new();
    let mut diagnostics = DiagnosticSink::new();

    let mut parsed: HashMap<String, Vec<File>> = HashMap::new();
    let mut paths = Vec::with_capacity(sources.len());
    for src in sources {
        if parsed.contains_key(&src.path) {
            return Err(AnalysisError::DuplicatePackage { path: src.path });
        }
        let mut files = Vec::with_capacity(src.files.len());
        for (name, text) in &src.files {
            let id = source_map.add_file(name.as_str(), text.as_str());
            let base = source_map.get_file(id).map_or(0, |f| f.base());
            let (file, diags) = parser::parse_file(text, base, &mut interner, &mut ids);
            diagnostics.extend(diags);
            files.push(file);
        }
        tracing::debug!(package = %src.path, files = files.len(), "parsed package");
        paths.push(src.path.clone());
        parsed.insert(src.path, files);
    }

    let order = import_order(&paths, &parsed)?;

    let mut project = Project {
        objs: TCObjects::new(),
        interner,
        source_map,
        packages: Vec::with_capacity(order.len()),
        diagnostics,
    };
    if project.diagnostics.has_errors() {
        tracing::debug!(errors = project.diagnostics.error_count(), "syntax errors, skipping type check");
        return Ok(project);
    }

    let mut importer = MapImporter::new();
    for path in order {
        let files = parsed.remove(&path).unwrap_or_default();
        let key = project.objs.new_package(path.clone());
        importer.begin(&path);
        let (info, diags) = {
            let mut checker = Checker::new(
                &mut project.objs,
                &project.interner,
                &mut importer,
                key,
                &files,
                options.trace,
            );
            checker.check();
            checker.finish()
        };
        importer.finish(&path, key);
        project.diagnostics.extend(diags);
        project.packages.push(CheckedPackage { path, key, files, info });
    }

    tracing::debug!(
        packages = project.packages.len(),
        errors = project.diagnostics.error_count(),
        warnings = project.diagnostics.warning_count(),
        "project analyzed"
    );
    Ok(project)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Orders packages depth first so that imports come before importers.
/// Imports of packages that are not part of the project are left to the
/// checker to report.
fn import_order(paths: &[String], parsed: &HashMap<String, Vec<File>>) -> Result<Vec<String>, AnalysisError> {
    fn visit(
        path: &str,
        parsed: &HashMap<String, Vec<File>>,
        state: &mut HashMap<String, Visit>,
        stack: &mut Vec<String>,
        order: &mut Vec<String>,
    ) -> Result<(), AnalysisError> {
        match state.get(path) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                let start = stack.iter().position(|p| p == path).unwrap_or(0);
                let mut cycle = stack[start..].to_vec();
                cycle.push(path.to_string());
                return Err(AnalysisError::ImportCycle { cycle });
            }
            None => {}
        }
        let files = match parsed.get(path) {
            Some(files) => files,
            None => return Ok(()),
        };
        state.insert(path.to_string(), Visit::InProgress);
        stack.push(path.to_string());
        for imp in files.iter().flat_map(|f| &f.imports) {
            if imp.path != FOREIGN_PATH {
                visit(&imp.path, parsed, state, stack, order)?;
            }
        }
        stack.pop();
        state.insert(path.to_string(), Visit::Done);
        order.push(path.to_string());
        Ok(())
    }

    let mut state = HashMap::new();
    let mut stack = Vec::new();
    let mut order = Vec::with_capacity(paths.len());
    for path in paths {
        visit(path, parsed, &mut state, &mut stack, &mut order)?;
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(path: &str, text: &str) -> PackageSource {
        PackageSource::new(path).with_file(format!("{}.kite", path), text)
    }

    #[test]
    fn test_dependency_order() {
        let sources = vec![
            pkg("main", "package main\nimport \"util\"\nvar X = util.Max(1, 2)\n"),
            pkg("util", "package util\nfunc Max(a, b int) int\n"),
        ];
        let project = analyze_project(sources, &AnalysisOptions::default()).unwrap();
        let order: Vec<_> = project.packages.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(order, vec!["util", "main"]);
        assert!(!project.has_errors());
        assert!(project.ensure_ok().is_ok());
    }

    #[test]
    fn test_import_cycle() {
        let sources = vec![
            pkg("a", "package a\nimport \"b\"\n"),
            pkg("b", "package b\nimport \"a\"\n"),
        ];
        match analyze_project(sources, &AnalysisOptions::default()) {
            Err(AnalysisError::ImportCycle { cycle }) => assert_eq!(cycle, vec!["a", "b", "a"]),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("cycle not detected"),
        }
    }

    #[test]
    fn test_duplicate_package() {
        let sources = vec![pkg("a", "package a\n"), pkg("a", "package a\n")];
        assert!(matches!(
            analyze_project(sources, &AnalysisOptions::default()),
            Err(AnalysisError::DuplicatePackage { .. })
        ));
    }

    #[test]
    fn test_syntax_errors_skip_checking() {
        let sources = vec![pkg("a", "package a\nvar = \n")];
        let project = analyze_project(sources, &AnalysisOptions::default()).unwrap();
        assert!(project.has_errors());
        assert!(project.packages.is_empty());
        assert!(matches!(project.ensure_ok(), Err(AnalysisError::Failed { .. })));
    }

    #[test]
    fn test_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" on "));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }
}
