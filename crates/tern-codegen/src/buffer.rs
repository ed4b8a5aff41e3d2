//! Bytecode emission with symbolic forward-jump fixups.
//!
//! Every forward jump hands back a [`Fixup`] naming the operand to patch.
//! A fixup is consumed by patching it, and [`CodeBuffer::finish`] refuses
//! to produce code while any remain open.

use tern_types::Opcode;
use tracing::trace;

use crate::error::{CodegenError, CodegenResult};

/// An unresolved forward jump: the offset of its 16-bit operand.
#[must_use = "a forward jump must be patched"]
#[derive(Debug, PartialEq, Eq)]
pub struct Fixup {
    at: usize,
}

impl Fixup {
    /// Offset of the placeholder operand.
    pub fn offset(&self) -> usize {
        self.at
    }
}

/// Growable bytecode buffer bounded by a fixed capacity.
#[derive(Debug, Clone)]
pub struct CodeBuffer {
    code: Vec<u8>,
    capacity: usize,
    open_fixups: usize,
}

impl CodeBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            code: Vec::new(),
            capacity,
            open_fixups: 0,
        }
    }

    /// Offset of the next emitted byte.
    pub fn pos(&self) -> usize {
        self.code.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    fn reserve(&self, n: usize) -> CodegenResult<()> {
        if self.code.len() + n > self.capacity {
            return Err(CodegenError::CodeOverflow {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    pub fn emit_op(&mut self, op: Opcode) -> CodegenResult<()> {
        self.reserve(1)?;
        trace!(pos = self.code.len(), op = op.name(), "emit op");
        self.code.push(op as u8);
        Ok(())
    }

    pub fn emit_byte(&mut self, b: u8) -> CodegenResult<()> {
        self.reserve(1)?;
        trace!(pos = self.code.len(), byte = b, "emit byte");
        self.code.push(b);
        Ok(())
    }

    /// Emit a big-endian word.
    pub fn emit_word(&mut self, w: u16) -> CodegenResult<()> {
        self.reserve(2)?;
        trace!(pos = self.code.len(), word = w, "emit word");
        self.code.extend_from_slice(&w.to_be_bytes());
        Ok(())
    }

    /// Emit `op` followed by a placeholder jump distance.
    pub fn emit_forward(&mut self, op: Opcode) -> CodegenResult<Fixup> {
        self.emit_op(op)?;
        let at = self.pos();
        self.emit_word(0)?;
        self.open_fixups += 1;
        Ok(Fixup { at })
    }

    /// Emit `op` jumping back to `target`, an already-emitted offset.
    pub fn emit_backward(&mut self, op: Opcode, target: usize) -> CodegenResult<()> {
        self.emit_op(op)?;
        let rel = relative(self.pos() + 2, target)?;
        self.emit_word(rel)
    }

    /// Resolve a forward jump to the current position.
    pub fn patch(&mut self, fixup: Fixup) -> CodegenResult<()> {
        let here = self.pos();
        self.patch_to(fixup, here)
    }

    /// Resolve a forward jump to an explicit target.
    pub fn patch_to(&mut self, fixup: Fixup, target: usize) -> CodegenResult<()> {
        let rel = relative(fixup.at + 2, target)?;
        trace!(at = fixup.at, target, "patch jump");
        self.code[fixup.at..fixup.at + 2].copy_from_slice(&rel.to_be_bytes());
        self.open_fixups -= 1;
        Ok(())
    }

    /// Number of forward jumps not yet patched.
    pub fn open_fixups(&self) -> usize {
        self.open_fixups
    }

    /// Hand over the finished code. Fails while fixups are still open.
    pub fn finish(self) -> CodegenResult<Vec<u8>> {
        if self.open_fixups != 0 {
            return Err(CodegenError::UnresolvedFixups(self.open_fixups));
        }
        Ok(self.code)
    }
}

/// Distance from `from` (the byte after an operand) to `to`, as the
/// operand's two's-complement encoding.
fn relative(from: usize, to: usize) -> CodegenResult<u16> {
    let rel = to as i64 - from as i64;
    i16::try_from(rel)
        .map(|r| r as u16)
        .map_err(|_| CodegenError::JumpOutOfRange { from, to })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_jump_is_relative_to_next_instruction() {
        let mut buf = CodeBuffer::new(64);
        let fix = buf.emit_forward(Opcode::Jump).unwrap();
        buf.emit_op(Opcode::Stop).unwrap();
        buf.emit_op(Opcode::Stop).unwrap();
        buf.patch(fix).unwrap();
        // operand at 1..3, next instruction at 3, target 5.
        assert_eq!(&buf.as_bytes()[1..3], &[0, 2]);
        assert_eq!(buf.open_fixups(), 0);
    }

    #[test]
    fn test_backward_jump_is_negative() {
        let mut buf = CodeBuffer::new(64);
        buf.emit_op(Opcode::True).unwrap();
        buf.emit_backward(Opcode::Jump, 0).unwrap();
        // operand ends at 4, target 0: -4.
        assert_eq!(&buf.as_bytes()[2..4], &(-4i16 as u16).to_be_bytes());
    }

    #[test]
    fn test_finish_rejects_open_fixups() {
        let mut buf = CodeBuffer::new(64);
        let _open = buf.emit_forward(Opcode::Jfalse).unwrap();
        assert_eq!(buf.finish(), Err(CodegenError::UnresolvedFixups(1)));
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut buf = CodeBuffer::new(2);
        buf.emit_op(Opcode::True).unwrap();
        assert_eq!(
            buf.emit_word(7),
            Err(CodegenError::CodeOverflow { capacity: 2 })
        );
        assert_eq!(buf.pos(), 1);
    }

    #[test]
    fn test_jump_out_of_range() {
        assert!(relative(0, 40_000).is_err());
        assert_eq!(relative(10, 4), Ok((-6i16) as u16));
    }
}
