//! Tern bytecode generation support.
//!
//! The compiler emits straight into a [`CodeBuffer`]; forward jumps are
//! tracked as [`Fixup`] handles and must all be patched before the buffer
//! can be finished. The result, together with the heap and identifier
//! table built during compilation, is a [`Program`].

pub mod buffer;
pub mod error;
pub mod listing;
pub mod program;
pub mod source_map;

pub use buffer::{CodeBuffer, Fixup};
pub use error::{CodegenError, CodegenResult};
pub use listing::{decode, disassemble, Instruction};
pub use program::Program;
pub use source_map::{SourceMap, SourceMapEntry};
