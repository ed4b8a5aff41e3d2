//! Shared types for the Tern compiler and VM.
//!
//! This crate holds the binary contract between the two halves of the
//! pipeline: the heap arena and its record layouts, the identifier table,
//! tagged values, the opcode set, the half-precision codec, plus source
//! spans, compile errors and capacity limits.

mod error;
pub mod f16;
pub mod heap;
pub mod ident;
mod limits;
pub mod opcode;
mod span;
pub mod value;

pub use error::{CompileError, ErrorCategory, ErrorCode, HeapError};
pub use f16::F16;
pub use heap::{ArrayRef, Heap, StrRef, HEAP_ADDRESSABLE};
pub use ident::{IdentRef, IdentTable, NO_SLOT};
pub use limits::Limits;
pub use opcode::{Opcode, Shape};
pub use span::{SourceFile, Span};
pub use value::{Kind, Value, VALUE_SIZE};

/// Result type used throughout the Tern compiler.
pub type Result<T> = std::result::Result<T, CompileError>;
