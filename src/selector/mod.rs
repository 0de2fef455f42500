//! Selector Engine
//!
//! CSS-style component selectors:
//! - Ordered matcher registry (type, id, attribute, pseudo, member expression)
//! - `>`, `^` and whitespace axes
//! - Forward queries and backward `is` tests
//! - Built-in and runtime-registered pseudo-classes

pub mod attribute;
pub mod axes;
pub mod compiler;
pub mod eval;
pub mod expr;
pub mod lexer;
pub mod parser;
pub mod pseudos;

pub use compiler::{compile, CompiledBranch, Compiler, Filter, Op, Query};
pub use eval::{execute, is_match, Scope};
pub use parser::parse;
pub use pseudos::{PseudoFn, PseudoRegistry};
