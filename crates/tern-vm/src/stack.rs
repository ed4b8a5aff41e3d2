//! The VM operand stack.
//!
//! A fixed byte arena holding 3-byte tagged values and, for call frames,
//! 2-byte saved registers. `sp` is the offset of the first free byte.

use tern_types::{Value, VALUE_SIZE};

use crate::error::{RuntimeError, RuntimeResult};

pub struct OperandStack {
    bytes: Vec<u8>,
    sp: usize,
}

impl OperandStack {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
            sp: 0,
        }
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn overflow(&self) -> RuntimeError {
        RuntimeError::StackOverflow {
            capacity: self.bytes.len(),
        }
    }

    /// Move `sp`. Bytes uncovered by growing are zeroed, so fresh slots
    /// read as unset values.
    pub fn set_sp(&mut self, sp: usize) -> RuntimeResult<()> {
        if sp > self.bytes.len() {
            return Err(self.overflow());
        }
        if sp > self.sp {
            self.bytes[self.sp..sp].fill(0);
        }
        self.sp = sp;
        Ok(())
    }

    // ── Values ───────────────────────────────────────────────────────────────

    pub fn push(&mut self, value: Value) -> RuntimeResult<()> {
        let end = self.sp + VALUE_SIZE;
        if end > self.bytes.len() {
            return Err(self.overflow());
        }
        self.bytes[self.sp..end].copy_from_slice(&value.encode());
        self.sp = end;
        Ok(())
    }

    pub fn pop(&mut self) -> RuntimeResult<Value> {
        let start = self
            .sp
            .checked_sub(VALUE_SIZE)
            .ok_or(RuntimeError::StackUnderflow)?;
        let value = self.get(start)?;
        self.sp = start;
        Ok(value)
    }

    /// Pop `n` values, returned bottom first.
    pub fn pop_n(&mut self, n: usize) -> RuntimeResult<Vec<Value>> {
        let start = self
            .sp
            .checked_sub(n * VALUE_SIZE)
            .ok_or(RuntimeError::StackUnderflow)?;
        let values = (0..n)
            .map(|i| self.get(start + i * VALUE_SIZE))
            .collect::<RuntimeResult<Vec<_>>>()?;
        self.sp = start;
        Ok(values)
    }

    /// The value stored at byte offset `at`.
    pub fn get(&self, at: usize) -> RuntimeResult<Value> {
        let raw = self
            .bytes
            .get(at..at + VALUE_SIZE)
            .ok_or(RuntimeError::StackUnderflow)?;
        let bytes = [raw[0], raw[1], raw[2]];
        Value::decode(bytes).ok_or(RuntimeError::CorruptValue(bytes[0]))
    }

    pub fn set(&mut self, at: usize, value: Value) -> RuntimeResult<()> {
        if at + VALUE_SIZE > self.sp {
            return Err(self.overflow());
        }
        self.bytes[at..at + VALUE_SIZE].copy_from_slice(&value.encode());
        Ok(())
    }

    // ── Frame words ──────────────────────────────────────────────────────────

    pub fn push_word(&mut self, w: u16) -> RuntimeResult<()> {
        let end = self.sp + 2;
        if end > self.bytes.len() {
            return Err(self.overflow());
        }
        self.bytes[self.sp..end].copy_from_slice(&w.to_be_bytes());
        self.sp = end;
        Ok(())
    }

    pub fn pop_word(&mut self) -> RuntimeResult<u16> {
        let start = self.sp.checked_sub(2).ok_or(RuntimeError::StackUnderflow)?;
        let w = u16::from_be_bytes([self.bytes[start], self.bytes[start + 1]]);
        self.sp = start;
        Ok(w)
    }
}
