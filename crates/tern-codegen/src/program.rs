//! A compiled Tern program.

use tern_types::{Heap, IdentTable};

use crate::listing;
use crate::source_map::SourceMap;

/// Everything the VM needs to run: the finished bytecode, the heap holding
/// identifier, string and array records, the identifier table that indexes
/// the heap, and a source map for diagnostics.
///
/// A `Program` is immutable once built; each run works on its own copy of
/// the heap, so one program can be run any number of times.
#[derive(Debug, Clone)]
pub struct Program {
    pub code: Vec<u8>,
    pub heap: Heap,
    pub idents: IdentTable,
    pub source_map: SourceMap,
}

impl Program {
    /// Size of the emitted bytecode.
    pub fn code_len(&self) -> usize {
        self.code.len()
    }

    /// One line per instruction: `0000 op_name operands`.
    pub fn disassemble(&self) -> String {
        listing::disassemble(&self.code, &self.heap)
    }
}
