//! Type checking for Kite.
//!
//! The checker works over an arena-backed object model ([`objects`]): every
//! language object, type, scope and package lives in a [`TCObjects`] arena
//! and is referred to by a typed key. Packages are checked one at a time in
//! import order by [`project::analyze_project`], sharing one `TCObjects`.
//!
//! The heart of the checker is in [`check`]: call expressions (ordinary
//! calls, conversions, builtins and generic instantiation) and selector
//! expressions (qualified package access and field/method resolution
//! through embedding).

pub mod arena;
pub mod check;
pub mod constant;
pub mod importer;
pub mod lookup;
pub mod obj;
pub mod objects;
pub mod operand;
pub mod package;
pub mod project;
pub mod scope;
pub mod selection;
pub mod typ;
pub mod universe;

pub use check::{Inferred, TypeAndValue, TypeError, TypeInfo};
pub use importer::{ImportResult, Importer};
pub use objects::{ObjKey, PackageKey, ScopeKey, TCObjects, TypeKey};
pub use operand::{Operand, OperandMode};
pub use project::{analyze_project, AnalysisError, AnalysisOptions, CheckedPackage, PackageSource, Project};
pub use selection::{Selection, SelectionKind};
