//! Growth-only bump arena shared by the compiler and the VM.
//!
//! Records are addressed by 16-bit offsets wrapped in typed handles. The
//! arena never frees; exhaustion is reported as [`HeapError::Exhausted`].
//!
//! ```text
//! string record : len(2, big-endian) bytes...
//! array record  : count(1) count × [kind(1) payload(2)]
//! ```
//!
//! Offsets `0..HEAP_RESERVED` are never handed out, so offset 0 can serve as
//! the end-of-chain marker in identifier records.

use crate::error::HeapError;
use crate::value::{Value, VALUE_SIZE};

/// Bytes at the start of the arena that never hold a record.
pub const HEAP_RESERVED: usize = 2;

/// Bytes reachable through a 16-bit offset. Space past this is never
/// handed out, however large the arena.
pub const HEAP_ADDRESSABLE: usize = u16::MAX as usize + 1;

/// Longest string a record can hold.
pub const MAX_STR_LEN: usize = u16::MAX as usize;

/// Most elements an array record can hold.
pub const MAX_ARRAY_LEN: usize = u8::MAX as usize;

/// Handle to a string record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrRef(pub(crate) u16);

/// Handle to an array record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayRef(pub(crate) u16);

impl StrRef {
    pub fn offset(self) -> u16 {
        self.0
    }
}

impl ArrayRef {
    pub fn offset(self) -> u16 {
        self.0
    }
}

/// The bump-allocated byte arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heap {
    bytes: Vec<u8>,
    top: usize,
}

impl Heap {
    /// Create a zero-filled arena of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size.max(HEAP_RESERVED)],
            top: HEAP_RESERVED,
        }
    }

    /// Reserve `n` bytes and return the offset of the block.
    ///
    /// The block is zeroed (memory is never reused) and carries no header.
    pub fn alloc(&mut self, n: usize) -> Result<u16, HeapError> {
        let available = self.bytes.len().min(HEAP_ADDRESSABLE) - self.top;
        let exhausted = HeapError::Exhausted {
            requested: n,
            available,
        };
        if n > available {
            return Err(exhausted);
        }
        let offset = u16::try_from(self.top).map_err(|_| exhausted)?;
        self.top += n;
        Ok(offset)
    }

    /// High-water mark: bytes handed out so far, including the reserved prefix.
    pub fn used(&self) -> usize {
        self.top
    }

    /// Total arena size.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// The allocated prefix of the arena.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.top]
    }

    fn in_bounds(&self, offset: usize, len: usize) -> bool {
        offset >= HEAP_RESERVED && offset + len <= self.top
    }

    // ── Raw access (record layouts live in this crate only) ──────────────────

    pub(crate) fn byte(&self, offset: usize) -> u8 {
        self.bytes[offset]
    }

    pub(crate) fn set_byte(&mut self, offset: usize, b: u8) {
        self.bytes[offset] = b;
    }

    pub(crate) fn word(&self, offset: usize) -> u16 {
        u16::from_be_bytes([self.bytes[offset], self.bytes[offset + 1]])
    }

    pub(crate) fn set_word(&mut self, offset: usize, w: u16) {
        self.bytes[offset..offset + 2].copy_from_slice(&w.to_be_bytes());
    }

    pub(crate) fn slice(&self, offset: usize, len: usize) -> &[u8] {
        &self.bytes[offset..offset + len]
    }

    pub(crate) fn write(&mut self, offset: usize, data: &[u8]) {
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
    }

    pub(crate) fn value_at(&self, offset: usize) -> Value {
        Value::decode([
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
        ])
        .unwrap_or(Value::Unset)
    }

    pub(crate) fn set_value_at(&mut self, offset: usize, value: Value) {
        self.write(offset, &value.encode());
    }

    // ── String records ───────────────────────────────────────────────────────

    /// Allocate an immutable string record holding `data`.
    pub fn alloc_str(&mut self, data: &[u8]) -> Result<StrRef, HeapError> {
        if data.len() > MAX_STR_LEN {
            return Err(HeapError::RecordTooLarge {
                len: data.len(),
                max: MAX_STR_LEN,
            });
        }
        let at = self.alloc(2 + data.len())?;
        let offset = at as usize;
        self.set_word(offset, data.len() as u16);
        self.write(offset + 2, data);
        Ok(StrRef(at))
    }

    /// Validate a raw offset (e.g. a bytecode operand) as a string record.
    pub fn str_at(&self, offset: u16) -> Result<StrRef, HeapError> {
        let off = offset as usize;
        if self.in_bounds(off, 2) && self.in_bounds(off, 2 + self.word(off) as usize) {
            Ok(StrRef(offset))
        } else {
            Err(HeapError::InvalidHandle { offset })
        }
    }

    /// The bytes of a string record.
    pub fn str_bytes(&self, s: StrRef) -> &[u8] {
        let off = s.0 as usize;
        let len = self.word(off) as usize;
        self.slice(off + 2, len)
    }

    // ── Array records ────────────────────────────────────────────────────────

    /// Allocate an immutable array record holding `elems` in order.
    pub fn alloc_array(&mut self, elems: &[Value]) -> Result<ArrayRef, HeapError> {
        if elems.len() > MAX_ARRAY_LEN {
            return Err(HeapError::RecordTooLarge {
                len: elems.len(),
                max: MAX_ARRAY_LEN,
            });
        }
        let at = self.alloc(1 + VALUE_SIZE * elems.len())?;
        let offset = at as usize;
        self.set_byte(offset, elems.len() as u8);
        for (i, v) in elems.iter().enumerate() {
            self.set_value_at(offset + 1 + i * VALUE_SIZE, *v);
        }
        Ok(ArrayRef(at))
    }

    /// Number of elements in an array record.
    pub fn array_len(&self, a: ArrayRef) -> usize {
        self.byte(a.0 as usize) as usize
    }

    /// Element `index` of an array record, or `None` past the end.
    pub fn array_get(&self, a: ArrayRef, index: usize) -> Option<Value> {
        if index >= self.array_len(a) {
            return None;
        }
        Some(self.value_at(a.0 as usize + 1 + index * VALUE_SIZE))
    }

    /// All elements of an array record.
    pub fn array_elems(&self, a: ArrayRef) -> Vec<Value> {
        (0..self.array_len(a))
            .filter_map(|i| self.array_get(a, i))
            .collect()
    }
}
