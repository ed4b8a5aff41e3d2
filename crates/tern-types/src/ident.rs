//! Identifier interning over the shared heap.
//!
//! Every distinct name maps to exactly one heap record:
//!
//! ```text
//! chain(2) hash(2) kind(1) value(2) slot(1) arg_count(1) name_len(1) name...
//! ```
//!
//! `kind` and `value` together hold the identifier's current tagged value
//! (for a proc/func, the value is its entry address). `slot` is the local
//! slot number while the name is a parameter or local of the function being
//! compiled; on the proc/func record itself it holds the frame slot count.

use crate::error::HeapError;
use crate::heap::{Heap, HEAP_RESERVED};
use crate::value::Value;

/// Slot byte meaning "not a local".
pub const NO_SLOT: u8 = 0xff;

/// Longest identifier name.
pub const MAX_IDENT_LEN: usize = u8::MAX as usize;

const CHAIN: usize = 0;
const HASH: usize = 2;
const VALUE: usize = 4;
const SLOT: usize = 7;
const ARG_COUNT: usize = 8;
const NAME_LEN: usize = 9;
const NAME: usize = 10;

/// Handle to an identifier record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentRef(pub(crate) u16);

impl IdentRef {
    pub fn offset(self) -> u16 {
        self.0
    }
}

/// The 16-bit polynomial name hash (`h = h * 101 + byte`).
pub fn hash(name: &[u8]) -> u16 {
    name.iter()
        .fold(0u16, |h, &b| h.wrapping_mul(101).wrapping_add(b as u16))
}

/// Bucket heads of the identifier hash table. Records live in the heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentTable {
    buckets: Vec<u16>,
}

impl IdentTable {
    /// `bucket_count` must be a power of two.
    pub fn new(bucket_count: usize) -> Self {
        debug_assert!(bucket_count.is_power_of_two());
        Self {
            buckets: vec![0; bucket_count],
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_of(&self, h: u16) -> usize {
        h as usize & (self.buckets.len() - 1)
    }

    /// Look up `name`, creating a fresh unset record if it is new.
    ///
    /// Returns the record and whether it was created by this call.
    pub fn intern(&mut self, heap: &mut Heap, name: &[u8]) -> Result<(IdentRef, bool), HeapError> {
        if name.len() > MAX_IDENT_LEN {
            return Err(HeapError::RecordTooLarge {
                len: name.len(),
                max: MAX_IDENT_LEN,
            });
        }
        let h = hash(name);
        let bucket = self.bucket_of(h);

        let mut last = 0usize;
        let mut p = self.buckets[bucket] as usize;
        while p != 0 {
            if heap.word(p + HASH) == h
                && heap.byte(p + NAME_LEN) as usize == name.len()
                && heap.slice(p + NAME, name.len()) == name
            {
                return Ok((IdentRef(p as u16), false));
            }
            last = p;
            p = heap.word(p + CHAIN) as usize;
        }

        let p = heap.alloc(NAME + name.len())? as usize;
        heap.set_word(p + CHAIN, 0);
        heap.set_word(p + HASH, h);
        heap.set_value_at(p + VALUE, Value::Unset);
        heap.set_byte(p + SLOT, NO_SLOT);
        heap.set_byte(p + ARG_COUNT, 0);
        heap.set_byte(p + NAME_LEN, name.len() as u8);
        heap.write(p + NAME, name);

        // Append at the tail so chains keep insertion order.
        if last == 0 {
            self.buckets[bucket] = p as u16;
        } else {
            heap.set_word(last + CHAIN, p as u16);
        }
        Ok((IdentRef(p as u16), true))
    }

    /// Find an existing record without creating one.
    pub fn find(&self, heap: &Heap, name: &[u8]) -> Option<IdentRef> {
        let h = hash(name);
        let mut p = self.buckets[self.bucket_of(h)] as usize;
        while p != 0 {
            if heap.word(p + HASH) == h
                && heap.byte(p + NAME_LEN) as usize == name.len()
                && heap.slice(p + NAME, name.len()) == name
            {
                return Some(IdentRef(p as u16));
            }
            p = heap.word(p + CHAIN) as usize;
        }
        None
    }

    /// Records of one bucket in chain order.
    pub fn chain(&self, heap: &Heap, bucket: usize) -> Vec<IdentRef> {
        let mut out = Vec::new();
        let mut p = self.buckets[bucket];
        while p != 0 {
            out.push(IdentRef(p));
            p = heap.word(p as usize + CHAIN);
        }
        out
    }
}

// ── Record accessors ─────────────────────────────────────────────────────────

impl Heap {
    /// Validate a raw offset (a bytecode operand) as an identifier record.
    pub fn ident_at(&self, offset: u16) -> Result<IdentRef, HeapError> {
        let off = offset as usize;
        let fits = |len: usize| off >= HEAP_RESERVED && off + len <= self.used();
        if fits(NAME) && fits(NAME + self.byte(off + NAME_LEN) as usize) {
            Ok(IdentRef(offset))
        } else {
            Err(HeapError::InvalidHandle { offset })
        }
    }

    pub fn ident_name(&self, id: IdentRef) -> &[u8] {
        let p = id.0 as usize;
        self.slice(p + NAME, self.byte(p + NAME_LEN) as usize)
    }

    pub fn ident_hash(&self, id: IdentRef) -> u16 {
        self.word(id.0 as usize + HASH)
    }

    pub fn ident_value(&self, id: IdentRef) -> Value {
        self.value_at(id.0 as usize + VALUE)
    }

    pub fn set_ident_value(&mut self, id: IdentRef, value: Value) {
        self.set_value_at(id.0 as usize + VALUE, value);
    }

    /// Local slot of a parameter/local, or [`NO_SLOT`]. On a proc/func
    /// record this is the frame slot count.
    pub fn ident_slot(&self, id: IdentRef) -> u8 {
        self.byte(id.0 as usize + SLOT)
    }

    pub fn set_ident_slot(&mut self, id: IdentRef, slot: u8) {
        self.set_byte(id.0 as usize + SLOT, slot);
    }

    pub fn ident_arg_count(&self, id: IdentRef) -> u8 {
        self.byte(id.0 as usize + ARG_COUNT)
    }

    pub fn set_ident_arg_count(&mut self, id: IdentRef, n: u8) {
        self.set_byte(id.0 as usize + ARG_COUNT, n);
    }

    /// Lossy UTF-8 rendering of an identifier name for diagnostics.
    pub fn ident_display(&self, id: IdentRef) -> String {
        String::from_utf8_lossy(self.ident_name(id)).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Heap, IdentTable) {
        (Heap::new(1024), IdentTable::new(32))
    }

    #[test]
    fn test_hash_is_polynomial() {
        assert_eq!(hash(b""), 0);
        assert_eq!(hash(b"a"), 97);
        assert_eq!(hash(b"ab"), 97 * 101 + 98);
    }

    #[test]
    fn test_intern_is_idempotent() {
        let (mut heap, mut table) = setup();
        let (a, new_a) = table.intern(&mut heap, b"count").unwrap();
        let used = heap.used();
        let (b, new_b) = table.intern(&mut heap, b"count").unwrap();
        assert!(new_a);
        assert!(!new_b);
        assert_eq!(a, b);
        assert_eq!(heap.used(), used);
    }

    #[test]
    fn test_new_record_defaults() {
        let (mut heap, mut table) = setup();
        let (id, _) = table.intern(&mut heap, b"x").unwrap();
        assert_eq!(heap.ident_value(id), Value::Unset);
        assert_eq!(heap.ident_slot(id), NO_SLOT);
        assert_eq!(heap.ident_arg_count(id), 0);
        assert_eq!(heap.ident_name(id), b"x");
    }

    #[test]
    fn test_colliding_names_stay_distinct() {
        let (mut heap, mut table) = setup();
        assert_eq!(hash(b"aAn"), hash(b"gla"));
        let (a, _) = table.intern(&mut heap, b"aAn").unwrap();
        let (g, new_g) = table.intern(&mut heap, b"gla").unwrap();
        assert!(new_g);
        assert_ne!(a, g);
        assert_eq!(table.chain(&heap, table.bucket_of(hash(b"aAn"))), vec![a, g]);
        assert_eq!(table.intern(&mut heap, b"gla").unwrap(), (g, false));
        assert_eq!(table.intern(&mut heap, b"aAn").unwrap(), (a, false));
    }

    #[test]
    fn test_find_does_not_allocate() {
        let (mut heap, mut table) = setup();
        assert_eq!(table.find(&heap, b"y"), None);
        let (id, _) = table.intern(&mut heap, b"y").unwrap();
        let used = heap.used();
        assert_eq!(table.find(&heap, b"y"), Some(id));
        assert_eq!(heap.used(), used);
    }

    #[test]
    fn test_value_and_slot_updates() {
        let (mut heap, mut table) = setup();
        let (id, _) = table.intern(&mut heap, b"n").unwrap();
        heap.set_ident_value(id, Value::Int(-5));
        heap.set_ident_slot(id, 2);
        assert_eq!(heap.ident_value(id), Value::Int(-5));
        assert_eq!(heap.ident_slot(id), 2);
        assert_eq!(heap.ident_at(id.offset()), Ok(id));
    }

    #[test]
    fn test_name_too_long() {
        let (mut heap, mut table) = setup();
        let name = vec![b'a'; 256];
        assert!(table.intern(&mut heap, &name).is_err());
    }
}
