//! Runtime error types for the Tern VM.
//!
//! Every runtime error is fatal: the VM stops at the first one and reports
//! it together with the offset of the instruction that raised it.

use tern_types::HeapError;
use thiserror::Error;

/// A fatal runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// An operator or built-in received a value of the wrong kind.
    #[error("type mismatch: '{op}' cannot take {operands}")]
    TypeMismatch { op: &'static str, operands: String },

    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    /// The program counter left the code.
    #[error("program counter {0:#06x} is outside the code")]
    CodeOverrun(usize),

    /// A global or local was read before being assigned.
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("'{0}' is not defined")]
    UndefinedCallTarget(String),

    /// A proc called as a func, or anything that is not code called at all.
    #[error("'{name}' is not a {expected}")]
    BadCallTarget { name: String, expected: &'static str },

    #[error("wrong argument count for '{name}': expected {expected}, got {found}")]
    ArgumentCount { name: String, expected: u8, found: u8 },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i32, len: usize },

    #[error("negative argument {value} to '{op}'")]
    NegativeArgument { op: &'static str, value: i16 },

    #[error("number out of range for '{0}'")]
    NumberOutOfRange(&'static str),

    #[error("division by zero")]
    DivisionByZero,

    /// A func reached its `end` without returning a value.
    #[error("func ended without 'return'")]
    MissingReturn,

    /// `int`/`float` of a string that is not a number in its entirety.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("operand stack overflow ({capacity} bytes)")]
    StackOverflow { capacity: usize },

    #[error("operand stack underflow")]
    StackUnderflow,

    /// A stack slot whose kind byte is not a value kind.
    #[error("corrupt value with kind byte {0:#04x}")]
    CorruptValue(u8),

    #[error(transparent)]
    Heap(#[from] HeapError),

    #[error("console: {0}")]
    Io(String),

    #[error("invalid limits: {0}")]
    InvalidLimits(String),

    #[error("end of input")]
    EndOfInput,
}

/// A runtime error and the instruction that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error} (pc {pc:#06x})")]
pub struct Trap {
    pub pc: usize,
    #[source]
    pub error: RuntimeError,
}

/// Result alias for VM operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
