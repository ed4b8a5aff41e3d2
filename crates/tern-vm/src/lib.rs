//! Tern bytecode virtual machine.
//!
//! Executes a compiled [`Program`] against a [`Console`]. Runtime errors are
//! fatal and come back as a [`Trap`] carrying the offending instruction's
//! offset, which the source map turns into a source location.

pub mod builtins;
pub mod console;
pub mod error;
mod stack;
mod vm;

pub use console::{BufferConsole, Console, StdConsole};
pub use error::{RuntimeError, RuntimeResult, Trap};
pub use stack::OperandStack;
pub use vm::Vm;

use tern_codegen::Program;
use tern_types::Limits;

/// Run `program` to completion on a fresh copy of its heap.
///
/// Invalid limits trap before the first instruction.
pub fn run(program: &Program, limits: &Limits, console: &mut dyn Console) -> Result<(), Trap> {
    Vm::new(program, limits)
        .map_err(|error| Trap { pc: 0, error })?
        .run(console)
}
