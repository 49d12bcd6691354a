//! `kite check` command - Type-check a project.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use kite_analysis::{analyze_project, AnalysisOptions, PackageSource};
use kite_common::diagnostics::DiagnosticEmitter;

const SOURCE_EXT: &str = "kite";
const ROOT_PACKAGE: &str = "main";

/// Type-check the project at `path`, printing diagnostics to stderr.
///
/// # Examples
/// ```text
/// kite check
/// kite check ./myproject --trace
/// ```
pub fn run(path: &str, trace: bool) -> Result<()> {
    let root = Path::new(path)
        .canonicalize()
        .with_context(|| format!("cannot open project directory {}", path))?;
    let sources = collect_packages(&root)?;
    if sources.is_empty() {
        bail!("no .{} files found in {}", SOURCE_EXT, root.display());
    }
    let nfiles: usize = sources.iter().map(|p| p.files.len()).sum();
    tracing::info!(packages = sources.len(), files = nfiles, root = %root.display(), "checking project");

    let mut options = AnalysisOptions::from_env();
    options.trace |= trace;
    let project = analyze_project(sources, &options)?;

    DiagnosticEmitter::new(&project.source_map).emit_all(&project.diagnostics);
    project.ensure_ok()?;
    println!("checked {} package(s)", project.packages.len());
    Ok(())
}

/// Groups the source files below `root` into packages by directory.
fn collect_packages(root: &Path) -> Result<Vec<PackageSource>> {
    let mut files = Vec::new();
    walk(root, &mut files)?;
    files.sort();

    let mut packages: BTreeMap<String, PackageSource> = BTreeMap::new();
    for file in files {
        let dir = file.parent().unwrap_or(root);
        let pkg_path = package_path(root, dir);
        let text = fs::read_to_string(&file).with_context(|| format!("cannot read {}", file.display()))?;
        let name = file.strip_prefix(root).unwrap_or(&file).display().to_string();
        let pkg = packages
            .entry(pkg_path.clone())
            .or_insert_with(|| PackageSource::new(pkg_path));
        pkg.files.push((name, text));
    }
    Ok(packages.into_values().collect())
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("cannot read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with('.'));
            if !hidden {
                walk(&path, out)?;
            }
        } else if path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXT) {
            out.push(path);
        }
    }
    Ok(())
}

/// Import path of the package in `dir`: the directory relative to the
/// root with `/` separators.
fn package_path(root: &Path, dir: &Path) -> String {
    let rel = dir.strip_prefix(root).unwrap_or(dir);
    let parts: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect();
    if parts.is_empty() {
        ROOT_PACKAGE.to_string()
    } else {
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_path() {
        let root = Path::new("/proj");
        assert_eq!(package_path(root, Path::new("/proj")), "main");
        assert_eq!(package_path(root, Path::new("/proj/util")), "util");
        assert_eq!(package_path(root, Path::new("/proj/lib/strings")), "lib/strings");
    }

    #[test]
    fn test_collect_packages() {
        let root = std::env::temp_dir().join(format!("kite-check-{}", std::process::id()));
        fs::create_dir_all(root.join("util")).unwrap();
        fs::write(root.join("main.kite"), "package main\nimport \"util\"\nvar X = util.One()\n").unwrap();
        fs::write(root.join("util/util.kite"), "package util\nfunc One() int\n").unwrap();
        fs::write(root.join("README.md"), "not source").unwrap();

        let packages = collect_packages(&root).unwrap();
        let paths: Vec<_> = packages.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["main", "util"]);
        assert_eq!(packages[1].files.len(), 1);

        let project = analyze_project(packages, &AnalysisOptions::default()).unwrap();
        assert!(project.ensure_ok().is_ok());
        fs::remove_dir_all(&root).unwrap();
    }
}
