//! Compiler context: lexer cursor, code buffer, heap, and the bounded
//! auxiliary stacks shared by the expression and statement compilers.

use tern_codegen::{CodeBuffer, CodegenError, Fixup, Program, SourceMap};
use tern_lexer::{Lexer, OpInfo};
use tern_types::{
    CompileError, ErrorCode, Heap, HeapError, IdentRef, IdentTable, Limits, Opcode, Result,
    SourceFile,
};

use crate::stack::BoundedStack;

/// An operator (or group mark) waiting for its right operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pending {
    pub op: Opcode,
    pub info: OpInfo,
}

impl Pending {
    pub const MARK: Pending = Pending {
        op: Opcode::Mark,
        info: OpInfo::MARK,
    };
}

/// An open control construct and where its keyword appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Control {
    pub op: Opcode,
    pub start: usize,
    pub end: usize,
}

/// Which kind of body is being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FuncKind {
    Proc,
    Func,
}

/// The func/proc whose body is being compiled.
#[derive(Debug)]
pub(crate) struct FuncState {
    pub id: IdentRef,
    pub kind: FuncKind,
    /// Parameters then locals; the index is the slot number.
    pub locals: Vec<IdentRef>,
}

/// The Tern compiler.
///
/// Compiles statements straight to bytecode in one pass. Fails at the
/// first error; no partial program is ever produced.
pub struct Parser<'src> {
    pub(crate) lx: Lexer<'src>,
    pub(crate) code: CodeBuffer,
    pub(crate) heap: Heap,
    pub(crate) idents: IdentTable,
    pub(crate) source_map: SourceMap,
    pub(crate) max_slots: usize,

    // ── Expression state ──────────────────────────────────────────────────────
    pub(crate) pending: BoundedStack<Pending>,

    // ── Control state ─────────────────────────────────────────────────────────
    pub(crate) control: BoundedStack<Control>,
    pub(crate) loop_starts: BoundedStack<usize>,
    /// Exit counts of the enclosing loops, saved on loop entry.
    pub(crate) saved_exit_counts: BoundedStack<usize>,
    /// Unresolved exit jumps of all open loops, innermost last.
    pub(crate) loop_exits: BoundedStack<Fixup>,
    /// Exit jumps recorded for the innermost loop.
    pub(crate) exit_count: usize,
    pub(crate) forward: BoundedStack<Fixup>,
    pub(crate) func: Option<FuncState>,
}

impl<'src> Parser<'src> {
    /// Create a compiler for `source` using the given capacities.
    ///
    /// Limits that 16-bit offsets cannot address are rejected up front.
    pub fn new(source: &'src SourceFile, limits: &Limits) -> Result<Self> {
        limits
            .validate()
            .map_err(|msg| CompileError::new(source, ErrorCode::INVALID_LIMITS, msg, 0, 0))?;
        let buckets = limits.ident_buckets;
        Ok(Self {
            lx: Lexer::new(source),
            code: CodeBuffer::new(limits.code_size),
            heap: Heap::new(limits.heap_size),
            idents: IdentTable::new(buckets),
            source_map: SourceMap::new(),
            max_slots: limits.max_slots,
            pending: BoundedStack::new(limits.pending_ops, "expression is too complex"),
            control: BoundedStack::new(limits.control_depth, "too many nested control statements"),
            loop_starts: BoundedStack::new(limits.loop_depth, "too many nested loops"),
            saved_exit_counts: BoundedStack::new(limits.loop_depth, "too many nested loops"),
            loop_exits: BoundedStack::new(limits.loop_exits, "control flow is too complicated"),
            exit_count: 0,
            forward: BoundedStack::new(limits.forward_jumps, "control flow is too complicated"),
            func: None,
        })
    }

    /// Compile the whole source into a [`Program`].
    pub fn compile(mut self) -> Result<Program> {
        self.parse_program()?;
        let code = self.code.finish().map_err(|e| {
            CompileError::new(self.lx.source(), ErrorCode::CODE_OVERFLOW, e.to_string(), 0, 0)
        })?;
        Ok(Program {
            code,
            heap: self.heap,
            idents: self.idents,
            source_map: self.source_map,
        })
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    pub(crate) fn err_here(&mut self, code: ErrorCode, message: impl Into<String>) -> CompileError {
        self.lx.error_here(code, message)
    }

    pub(crate) fn err_at(
        &self,
        code: ErrorCode,
        message: impl Into<String>,
        start: usize,
        end: usize,
    ) -> CompileError {
        self.lx.error_at(code, message, start, end)
    }

    pub(crate) fn heap_error(&mut self, e: HeapError) -> CompileError {
        self.err_here(ErrorCode::HEAP_EXHAUSTED, e.to_string())
    }

    pub(crate) fn code_error(&mut self, e: CodegenError) -> CompileError {
        self.err_here(ErrorCode::CODE_OVERFLOW, e.to_string())
    }

    pub(crate) fn too_complex(&mut self, message: &'static str) -> CompileError {
        self.err_here(ErrorCode::TOO_COMPLEX, message)
    }

    /// Consume `ch` or fail with "expected 'ch'".
    pub(crate) fn expect(&mut self, ch: u8) -> Result<()> {
        if self.lx.char(ch) {
            return Ok(());
        }
        if self.lx.at_end() {
            return Err(self.err_here(
                ErrorCode::UNEXPECTED_END,
                format!("expected '{}' but reached end of input", ch as char),
            ));
        }
        Err(self.err_here(ErrorCode::EXPECTED_TOKEN, format!("expected '{}'", ch as char)))
    }

    // ── Emission ──────────────────────────────────────────────────────────────

    pub(crate) fn emit_op(&mut self, op: Opcode) -> Result<()> {
        self.code.emit_op(op).map_err(|e| self.code_error(e))
    }

    pub(crate) fn emit_byte(&mut self, b: u8) -> Result<()> {
        self.code.emit_byte(b).map_err(|e| self.code_error(e))
    }

    pub(crate) fn emit_word(&mut self, w: u16) -> Result<()> {
        self.code.emit_word(w).map_err(|e| self.code_error(e))
    }

    pub(crate) fn emit_ident(&mut self, op: Opcode, id: IdentRef) -> Result<()> {
        self.emit_op(op)?;
        self.emit_word(id.offset())
    }

    pub(crate) fn emit_forward(&mut self, op: Opcode) -> Result<Fixup> {
        self.code.emit_forward(op).map_err(|e| self.code_error(e))
    }

    pub(crate) fn emit_backward(&mut self, op: Opcode, target: usize) -> Result<()> {
        self.code
            .emit_backward(op, target)
            .map_err(|e| self.code_error(e))
    }

    pub(crate) fn patch(&mut self, fixup: Fixup) -> Result<()> {
        self.code.patch(fixup).map_err(|e| self.code_error(e))
    }

    pub(crate) fn patch_to(&mut self, fixup: Fixup, target: usize) -> Result<()> {
        self.code
            .patch_to(fixup, target)
            .map_err(|e| self.code_error(e))
    }

    // ── Identifiers ───────────────────────────────────────────────────────────

    pub(crate) fn intern(&mut self, name: &[u8]) -> Result<IdentRef> {
        match self.idents.intern(&mut self.heap, name) {
            Ok((id, _)) => Ok(id),
            Err(e) => Err(self.heap_error(e)),
        }
    }

    /// Local slot of `id` inside the current func/proc body, if it has one.
    pub(crate) fn slot_of(&self, id: IdentRef) -> Option<u8> {
        let func = self.func.as_ref()?;
        if func.locals.contains(&id) {
            Some(self.heap.ident_slot(id))
        } else {
            None
        }
    }
}
