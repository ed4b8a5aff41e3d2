//! Tagged runtime values.
//!
//! A value is a kind byte plus a 16-bit payload. The payload is either an
//! immediate (bool, int, float bits, character, code address) or a heap
//! offset (multi-character string, array). The encoded form is three bytes,
//! used unchanged on the operand stack, in identifier records and in array
//! records.

use crate::f16::F16;
use crate::heap::{ArrayRef, StrRef};
use std::fmt;

/// Encoded size of a tagged value.
pub const VALUE_SIZE: usize = 3;

/// Kind byte of a tagged value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Unset = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
    StrEmpty = 4,
    StrChar = 5,
    Str = 6,
    Proc = 7,
    Func = 8,
    Array = 9,
}

impl Kind {
    pub fn from_u8(b: u8) -> Option<Kind> {
        Some(match b {
            0 => Kind::Unset,
            1 => Kind::Bool,
            2 => Kind::Int,
            3 => Kind::Float,
            4 => Kind::StrEmpty,
            5 => Kind::StrChar,
            6 => Kind::Str,
            7 => Kind::Proc,
            8 => Kind::Func,
            9 => Kind::Array,
            _ => return None,
        })
    }

    /// Human-readable kind name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Unset => "unset",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::StrEmpty | Kind::StrChar | Kind::Str => "string",
            Kind::Proc => "proc",
            Kind::Func => "func",
            Kind::Array => "array",
        }
    }

    pub fn is_str(self) -> bool {
        matches!(self, Kind::StrEmpty | Kind::StrChar | Kind::Str)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tagged runtime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// Never assigned; the initial state of identifiers and local slots.
    Unset,
    Bool(bool),
    Int(i16),
    Float(F16),
    StrEmpty,
    StrChar(u8),
    Str(StrRef),
    /// Procedure entry address.
    Proc(u16),
    /// Function entry address.
    Func(u16),
    Array(ArrayRef),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Unset => Kind::Unset,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::StrEmpty => Kind::StrEmpty,
            Value::StrChar(_) => Kind::StrChar,
            Value::Str(_) => Kind::Str,
            Value::Proc(_) => Kind::Proc,
            Value::Func(_) => Kind::Func,
            Value::Array(_) => Kind::Array,
        }
    }

    pub fn payload(&self) -> u16 {
        match *self {
            Value::Unset | Value::StrEmpty => 0,
            Value::Bool(b) => b as u16,
            Value::Int(i) => i as u16,
            Value::Float(f) => f.to_bits(),
            Value::StrChar(c) => c as u16,
            Value::Str(s) => s.offset(),
            Value::Proc(addr) | Value::Func(addr) => addr,
            Value::Array(a) => a.offset(),
        }
    }

    /// Rebuild a value from its kind byte and payload.
    ///
    /// Heap payloads are trusted: values are only ever decoded from slots
    /// that were written by [`Value::encode`].
    pub fn from_parts(kind: u8, payload: u16) -> Option<Value> {
        Some(match Kind::from_u8(kind)? {
            Kind::Unset => Value::Unset,
            Kind::Bool => Value::Bool(payload != 0),
            Kind::Int => Value::Int(payload as i16),
            Kind::Float => Value::Float(F16::from_bits(payload)),
            Kind::StrEmpty => Value::StrEmpty,
            Kind::StrChar => Value::StrChar(payload as u8),
            Kind::Str => Value::Str(StrRef(payload)),
            Kind::Proc => Value::Proc(payload),
            Kind::Func => Value::Func(payload),
            Kind::Array => Value::Array(ArrayRef(payload)),
        })
    }

    pub fn encode(&self) -> [u8; VALUE_SIZE] {
        let [hi, lo] = self.payload().to_be_bytes();
        [self.kind() as u8, hi, lo]
    }

    pub fn decode(bytes: [u8; VALUE_SIZE]) -> Option<Value> {
        Value::from_parts(bytes[0], u16::from_be_bytes([bytes[1], bytes[2]]))
    }
}
