//! # kite-syntax
//!
//! Front end of the Kite checker:
//! - tokens and a lexer with automatic semicolon insertion
//! - the AST, in which type expressions are ordinary expressions
//! - a recursive descent parser that skips function bodies

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use errors::SyntaxError;
pub use lexer::{unquote, Lexer};
pub use parser::{parse_file, Parser};
pub use token::{Token, TokenKind};
