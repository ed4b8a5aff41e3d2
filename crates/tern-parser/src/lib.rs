//! Tern compiler: source text straight to bytecode in a single pass.
//!
//! There is no syntax tree. Expressions are compiled by an operator
//! precedence parser driving a pending-operator stack; statements and
//! control constructs emit jumps that are backpatched once their targets
//! are known. Identifier records, string literals and function entry
//! points are written into the program heap as compilation proceeds.

mod parse_expr;
mod parse_stmt;
mod parser;
mod stack;

pub use parser::Parser;
pub use stack::BoundedStack;

use tern_codegen::Program;
use tern_types::{Limits, Result, SourceFile};

/// Compile a whole program. Fails at the first error.
pub fn compile(source: &SourceFile, limits: &Limits) -> Result<Program> {
    Parser::new(source, limits)?.compile()
}
