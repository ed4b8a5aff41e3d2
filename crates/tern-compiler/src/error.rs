//! Pipeline error type.

use tern_types::CompileError;
use tern_vm::Trap;
use thiserror::Error;

/// Any failure between source text and a finished run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TernError {
    /// Rejected `Limits`.
    #[error("invalid limits: {0}")]
    Config(String),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("runtime error: {0}")]
    Runtime(#[from] Trap),
}
