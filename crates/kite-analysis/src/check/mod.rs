//! Type checking of one package.
//!
//! The checker collects package-level objects, completes their
//! declarations lazily and in source order, and evaluates expressions to
//! operands. Calls and selectors are the center of it: see `call.rs` and
//! `selector.rs`.

mod assignment;
mod builtin;
mod call;
pub(crate) mod checker;
mod conversion;
mod decl;
mod errors;
mod expr;
pub(crate) mod format;
mod infer;
mod interface;
pub(crate) mod resolver;
mod selector;
mod subst;
mod type_info;
mod typexpr;

#[cfg(test)]
mod tests;

pub use checker::Checker;
pub use errors::TypeError;
pub use type_info::{Inferred, TypeAndValue, TypeInfo};
