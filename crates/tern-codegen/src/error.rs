//! Codegen error types.

use thiserror::Error;

/// Errors raised while emitting or finishing a bytecode buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// The program does not fit the configured code capacity.
    #[error("code buffer overflow: program exceeds {capacity} bytes")]
    CodeOverflow { capacity: usize },

    /// A relative jump distance does not fit a signed 16-bit operand.
    #[error("jump from {from:#06x} to {to:#06x} is out of range")]
    JumpOutOfRange { from: usize, to: usize },

    /// Forward jumps were emitted but never patched.
    #[error("{0} forward jump(s) left unresolved")]
    UnresolvedFixups(usize),
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
