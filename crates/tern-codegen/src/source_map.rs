//! Source mapping: bytecode offset → Tern source location.
//!
//! One entry is recorded at the first instruction of every statement, in
//! emission order, so offsets are non-decreasing. A runtime fault at `pc`
//! belongs to the last entry starting at or before `pc`.

use serde::{Deserialize, Serialize};
use tern_types::Span;

/// A complete source map for a compiled program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMap {
    pub entries: Vec<SourceMapEntry>,
}

/// Code emitted from `offset` onwards came from the statement at `span`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceMapEntry {
    pub offset: usize,
    pub span: Span,
}

impl SourceMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a statement starting at `offset`. A statement that emitted no
    /// code replaces the previous entry at the same offset.
    pub fn push(&mut self, offset: usize, span: Span) {
        if let Some(last) = self.entries.last_mut() {
            if last.offset == offset {
                last.span = span;
                return;
            }
        }
        self.entries.push(SourceMapEntry { offset, span });
    }

    /// The statement containing bytecode offset `pc`.
    pub fn lookup(&self, pc: usize) -> Option<Span> {
        let idx = self.entries.partition_point(|e| e.offset <= pc);
        idx.checked_sub(1).map(|i| self.entries[i].span)
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Deserialize from JSON bytes.
    pub fn from_json(data: &[u8]) -> Option<Self> {
        serde_json::from_slice(data).ok()
    }
}
