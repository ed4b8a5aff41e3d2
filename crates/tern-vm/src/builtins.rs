//! Operators and the built-in function library.
//!
//! Everything here is a function of its argument values and the heap.
//! Nothing mutates an existing heap record: results that need storage get
//! a fresh record, and strings are normalized by length (empty, single
//! character, heap record).

use std::borrow::Cow;
use std::cmp::Ordering;

use tern_types::{Heap, Opcode, Value, F16};

use crate::error::{RuntimeError, RuntimeResult};

// ══════════════════════════════════════════════════════════════════════════════
// Value views
// ══════════════════════════════════════════════════════════════════════════════

/// The bytes of any of the three string kinds.
pub fn text(heap: &Heap, v: Value) -> Option<Cow<'_, [u8]>> {
    match v {
        Value::StrEmpty => Some(Cow::Borrowed(&[])),
        Value::StrChar(c) => Some(Cow::Owned(vec![c])),
        Value::Str(s) => Some(Cow::Borrowed(heap.str_bytes(s))),
        _ => None,
    }
}

/// Build a string value, allocating only for two or more bytes.
pub fn make_str(heap: &mut Heap, bytes: &[u8]) -> RuntimeResult<Value> {
    Ok(match bytes {
        [] => Value::StrEmpty,
        [c] => Value::StrChar(*c),
        _ => Value::Str(heap.alloc_str(bytes)?),
    })
}

fn mismatch(op: Opcode, operands: &[Value]) -> RuntimeError {
    let kinds: Vec<&str> = operands.iter().map(|v| v.kind().name()).collect();
    RuntimeError::TypeMismatch {
        op: op.name(),
        operands: kinds.join(" and "),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Num {
    Int(i16),
    Float(f32),
}

fn num(v: Value) -> Option<Num> {
    match v {
        Value::Int(i) => Some(Num::Int(i)),
        Value::Float(f) => Some(Num::Float(f.to_f32())),
        _ => None,
    }
}

/// Bring two numbers to the same representation. An int is promoted to
/// float when paired with a float, never the reverse.
fn promote(a: Value, b: Value) -> Option<(Num, Num)> {
    match (num(a)?, num(b)?) {
        (Num::Int(x), Num::Float(y)) => Some((Num::Float(x as f32), Num::Float(y))),
        (Num::Float(x), Num::Int(y)) => Some((Num::Float(x), Num::Float(y as f32))),
        pair => Some(pair),
    }
}

fn float(f: f32) -> Value {
    Value::Float(F16::from_f32(f))
}

fn int_arg(op: Opcode, v: Value) -> RuntimeResult<i16> {
    match v {
        Value::Int(i) => Ok(i),
        other => Err(mismatch(op, &[other])),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Binary operators
// ══════════════════════════════════════════════════════════════════════════════

/// Apply a binary operator: `a op b`.
pub fn binary(op: Opcode, a: Value, b: Value, heap: &mut Heap) -> RuntimeResult<Value> {
    match op {
        Opcode::Add => {
            let joined = match (text(heap, a), text(heap, b)) {
                (Some(x), Some(y)) => Some([x.as_ref(), y.as_ref()].concat()),
                _ => None,
            };
            if let Some(joined) = joined {
                return make_str(heap, &joined);
            }
            arith(op, a, b)
        }
        Opcode::Sub | Opcode::Mul | Opcode::Div => arith(op, a, b),
        Opcode::Mod => match (a, b) {
            (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero),
            (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_rem(y))),
            _ => Err(mismatch(op, &[a, b])),
        },
        Opcode::Lsl | Opcode::Lsr | Opcode::Asr => shift(op, a, b),
        Opcode::Band | Opcode::Bor | Opcode::Beor => match (a, b) {
            (Value::Int(x), Value::Int(y)) => Ok(Value::Int(match op {
                Opcode::Band => x & y,
                Opcode::Bor => x | y,
                _ => x ^ y,
            })),
            _ => Err(mismatch(op, &[a, b])),
        },
        Opcode::Land | Opcode::Lor => match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(if op == Opcode::Land {
                x && y
            } else {
                x || y
            })),
            _ => Err(mismatch(op, &[a, b])),
        },
        Opcode::Lt | Opcode::Le | Opcode::Gt | Opcode::Ge | Opcode::Eq | Opcode::Ne => {
            compare(op, a, b, heap)
        }
        _ => Err(mismatch(op, &[a, b])),
    }
}

fn arith(op: Opcode, a: Value, b: Value) -> RuntimeResult<Value> {
    match promote(a, b) {
        Some((Num::Int(x), Num::Int(y))) => {
            let r = match op {
                Opcode::Add => x.wrapping_add(y),
                Opcode::Sub => x.wrapping_sub(y),
                Opcode::Mul => x.wrapping_mul(y),
                _ if y == 0 => return Err(RuntimeError::DivisionByZero),
                _ => x.wrapping_div(y),
            };
            Ok(Value::Int(r))
        }
        Some((Num::Float(x), Num::Float(y))) => Ok(float(match op {
            Opcode::Add => x + y,
            Opcode::Sub => x - y,
            Opcode::Mul => x * y,
            _ => x / y,
        })),
        _ => Err(mismatch(op, &[a, b])),
    }
}

/// `<<` and `>>` shift the 16-bit pattern logically, `>>>` keeps the sign.
fn shift(op: Opcode, a: Value, b: Value) -> RuntimeResult<Value> {
    let (Value::Int(x), Value::Int(n)) = (a, b) else {
        return Err(mismatch(op, &[a, b]));
    };
    if n < 0 {
        return Err(RuntimeError::NegativeArgument {
            op: op.name(),
            value: n,
        });
    }
    let bits = x as u16;
    let r = match op {
        Opcode::Lsl if n >= 16 => 0,
        Opcode::Lsl => (bits << n) as i16,
        Opcode::Lsr if n >= 16 => 0,
        Opcode::Lsr => (bits >> n) as i16,
        _ => x >> n.min(15),
    };
    Ok(Value::Int(r))
}

fn compare(op: Opcode, a: Value, b: Value, heap: &Heap) -> RuntimeResult<Value> {
    let ord = if let Some(pair) = promote(a, b) {
        match pair {
            (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
            (Num::Float(x), Num::Float(y)) => x.partial_cmp(&y),
            _ => None,
        }
    } else if let (Some(x), Some(y)) = (text(heap, a), text(heap, b)) {
        Some(x.as_ref().cmp(y.as_ref()))
    } else {
        match (a, b) {
            (Value::Bool(x), Value::Bool(y)) if matches!(op, Opcode::Eq | Opcode::Ne) => {
                Some(x.cmp(&y))
            }
            _ => return Err(mismatch(op, &[a, b])),
        }
    };
    // An unordered pair (NaN) is only ever unequal.
    let r = match op {
        Opcode::Lt => ord == Some(Ordering::Less),
        Opcode::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        Opcode::Gt => ord == Some(Ordering::Greater),
        Opcode::Ge => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
        Opcode::Eq => ord == Some(Ordering::Equal),
        _ => ord != Some(Ordering::Equal),
    };
    Ok(Value::Bool(r))
}

// ══════════════════════════════════════════════════════════════════════════════
// Unary operators and one-argument built-ins
// ══════════════════════════════════════════════════════════════════════════════

/// Apply a unary operator or one-argument built-in.
pub fn unary(op: Opcode, a: Value, heap: &mut Heap) -> RuntimeResult<Value> {
    match (op, a) {
        (Opcode::Neg, Value::Int(i)) => Ok(Value::Int(i.wrapping_neg())),
        (Opcode::Neg, Value::Float(f)) => Ok(float(-f.to_f32())),
        (Opcode::Bnot, Value::Int(i)) => Ok(Value::Int(!i)),
        (Opcode::Lnot, Value::Bool(b)) => Ok(Value::Bool(!b)),

        (Opcode::Abs, Value::Int(i)) => Ok(Value::Int(i.wrapping_abs())),
        (Opcode::Abs, Value::Float(f)) => Ok(Value::Float(F16::from_bits(f.to_bits() & 0x7fff))),
        (Opcode::Sgn, Value::Int(i)) => Ok(Value::Int(i.signum())),
        (Opcode::Sgn, Value::Float(f)) => {
            let f = f.to_f32();
            Ok(Value::Int(if f > 0.0 {
                1
            } else if f < 0.0 {
                -1
            } else {
                0
            }))
        }
        (Opcode::Sqrt, Value::Int(i)) => Ok(float((i as f32).sqrt())),
        (Opcode::Sqrt, Value::Float(f)) => Ok(float(f.to_f32().sqrt())),

        (Opcode::Int, Value::Int(_)) => Ok(a),
        (Opcode::Int, Value::Float(f)) => float_to_int(f.to_f32()),
        (Opcode::Float, Value::Int(i)) => Ok(float(i as f32)),
        (Opcode::Float, Value::Float(_)) => Ok(a),
        (Opcode::Int | Opcode::Float, _) => {
            let Some(t) = text(heap, a) else {
                return Err(mismatch(op, &[a]));
            };
            if op == Opcode::Int {
                parse_int(&t)
            } else {
                parse_float(&t)
            }
        }

        (Opcode::Asc, _) => match text(heap, a) {
            Some(t) => Ok(Value::Int(t.first().map_or(0, |&b| b as i16))),
            None => Err(mismatch(op, &[a])),
        },
        (Opcode::Chr, Value::Int(i)) => Ok(Value::StrChar(i as u8)),
        (Opcode::Str, _) => {
            let mut out = Vec::new();
            render(heap, a, &mut out);
            make_str(heap, &out)
        }
        (Opcode::Len, Value::Array(arr)) => len_value(heap.array_len(arr)),
        (Opcode::Len, _) => match text(heap, a) {
            Some(t) => len_value(t.len()),
            None => Err(mismatch(op, &[a])),
        },

        _ => Err(mismatch(op, &[a])),
    }
}

fn len_value(n: usize) -> RuntimeResult<Value> {
    i16::try_from(n)
        .map(Value::Int)
        .map_err(|_| RuntimeError::NumberOutOfRange("len"))
}

/// Truncate toward zero.
fn float_to_int(f: f32) -> RuntimeResult<Value> {
    let t = f.trunc();
    if f.is_nan() || t < i16::MIN as f32 || t > i16::MAX as f32 {
        return Err(RuntimeError::NumberOutOfRange("int"));
    }
    Ok(Value::Int(t as i16))
}

fn invalid(t: &[u8]) -> RuntimeError {
    RuntimeError::InvalidNumber(String::from_utf8_lossy(t).into_owned())
}

/// The whole of `t` must be `[+-]?digits`.
fn parse_int(t: &[u8]) -> RuntimeResult<Value> {
    let digits = t.strip_prefix(b"+").or_else(|| t.strip_prefix(b"-")).unwrap_or(t);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid(t));
    }
    let s = std::str::from_utf8(t).map_err(|_| invalid(t))?;
    s.parse::<i16>()
        .map(Value::Int)
        .map_err(|_| RuntimeError::NumberOutOfRange("int"))
}

/// The whole of `t` must have numeric-literal shape: optional sign,
/// digits with at most one decimal point, optional exponent.
fn parse_float(t: &[u8]) -> RuntimeResult<Value> {
    let body = t.strip_prefix(b"+").or_else(|| t.strip_prefix(b"-")).unwrap_or(t);
    let (mantissa, exponent) = match body.iter().position(|&b| b == b'e') {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let mantissa_ok = mantissa.iter().any(u8::is_ascii_digit)
        && mantissa.iter().all(|&b| b.is_ascii_digit() || b == b'.')
        && mantissa.iter().filter(|&&b| b == b'.').count() <= 1;
    let exponent_ok = exponent.map_or(true, |e| {
        let e = e.strip_prefix(b"+").or_else(|| e.strip_prefix(b"-")).unwrap_or(e);
        !e.is_empty() && e.iter().all(u8::is_ascii_digit)
    });
    if !mantissa_ok || !exponent_ok {
        return Err(invalid(t));
    }
    let s = std::str::from_utf8(t).map_err(|_| invalid(t))?;
    s.parse::<f32>().map(float).map_err(|_| invalid(t))
}

// ══════════════════════════════════════════════════════════════════════════════
// Substrings, indexing and slicing
// ══════════════════════════════════════════════════════════════════════════════

/// `count` bytes of `s` from `start`, clamped to the end of the string.
/// Negative arguments are errors.
pub fn substring(
    heap: &mut Heap,
    op: Opcode,
    s: Value,
    start: i16,
    count: i16,
) -> RuntimeResult<Value> {
    let Some(bytes) = text(heap, s).map(Cow::into_owned) else {
        return Err(mismatch(op, &[s]));
    };
    for value in [start, count] {
        if value < 0 {
            return Err(RuntimeError::NegativeArgument {
                op: op.name(),
                value,
            });
        }
    }
    let from = (start as usize).min(bytes.len());
    let to = from + (count as usize).min(bytes.len() - from);
    make_str(heap, &bytes[from..to])
}

/// `left(s, n)`
pub fn left(heap: &mut Heap, s: Value, n: Value) -> RuntimeResult<Value> {
    let n = int_arg(Opcode::Left, n)?;
    substring(heap, Opcode::Left, s, 0, n)
}

/// `right(s, n)`
pub fn right(heap: &mut Heap, s: Value, n: Value) -> RuntimeResult<Value> {
    let n = int_arg(Opcode::Right, n)?;
    let Some(len) = text(heap, s).map(|t| t.len()) else {
        return Err(mismatch(Opcode::Right, &[s]));
    };
    if n < 0 {
        return Err(RuntimeError::NegativeArgument {
            op: Opcode::Right.name(),
            value: n,
        });
    }
    let n = (n as usize).min(len);
    // Both fit in i16: n <= the requested count.
    substring(heap, Opcode::Right, s, (len - n) as i16, n as i16)
}

/// `substr(s, start, n)`, with `start` counted from 0.
pub fn substr(heap: &mut Heap, s: Value, start: Value, n: Value) -> RuntimeResult<Value> {
    let start = int_arg(Opcode::Substr, start)?;
    let n = int_arg(Opcode::Substr, n)?;
    substring(heap, Opcode::Substr, s, start, n)
}

/// Resolve an element index; negative indices count from the end.
fn element(i: i16, len: usize) -> RuntimeResult<usize> {
    let k = if i < 0 { len as i32 + i as i32 } else { i as i32 };
    if k < 0 || k >= len as i32 {
        return Err(RuntimeError::IndexOutOfRange {
            index: i as i32,
            len,
        });
    }
    Ok(k as usize)
}

/// Resolve a slice bound, which may equal the length.
fn bound(i: i16, len: usize) -> RuntimeResult<usize> {
    let k = if i < 0 { len as i32 + i as i32 } else { i as i32 };
    if k < 0 || k > len as i32 {
        return Err(RuntimeError::IndexOutOfRange {
            index: i as i32,
            len,
        });
    }
    Ok(k as usize)
}

/// `c[i]`: one element of an array or one character of a string.
pub fn index(heap: &Heap, container: Value, i: Value) -> RuntimeResult<Value> {
    let i = int_arg(Opcode::Index, i)?;
    if let Value::Array(arr) = container {
        let k = element(i, heap.array_len(arr))?;
        return heap.array_get(arr, k).ok_or(RuntimeError::IndexOutOfRange {
            index: i as i32,
            len: heap.array_len(arr),
        });
    }
    match text(heap, container) {
        Some(t) => Ok(Value::StrChar(t[element(i, t.len())?])),
        None => Err(mismatch(Opcode::Index, &[container])),
    }
}

/// `c[i:j]`: a copy of elements `i..j`.
pub fn slice(heap: &mut Heap, container: Value, i: Value, j: Value) -> RuntimeResult<Value> {
    let i = int_arg(Opcode::Slice, i)?;
    let j = int_arg(Opcode::Slice, j)?;
    let range = |len: usize| -> RuntimeResult<(usize, usize)> {
        let (from, to) = (bound(i, len)?, bound(j, len)?);
        if from > to {
            return Err(RuntimeError::IndexOutOfRange {
                index: j as i32,
                len,
            });
        }
        Ok((from, to))
    };
    if let Value::Array(arr) = container {
        let elems = heap.array_elems(arr);
        let (from, to) = range(elems.len())?;
        return Ok(Value::Array(heap.alloc_array(&elems[from..to])?));
    }
    let Some(bytes) = text(heap, container).map(Cow::into_owned) else {
        return Err(mismatch(Opcode::Slice, &[container]));
    };
    let (from, to) = range(bytes.len())?;
    make_str(heap, &bytes[from..to])
}

/// Build an array record from `elems`.
pub fn array(heap: &mut Heap, elems: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Array(heap.alloc_array(elems)?))
}

// ══════════════════════════════════════════════════════════════════════════════
// Rendering
// ══════════════════════════════════════════════════════════════════════════════

/// Append the printed form of `v` to `out`.
pub fn render(heap: &Heap, v: Value, out: &mut Vec<u8>) {
    match v {
        Value::Unset => out.extend_from_slice(b"<unset>"),
        Value::Bool(b) => out.extend_from_slice(if b { b"true" } else { b"false" }),
        Value::Int(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Value::Float(f) => out.extend_from_slice(render_float(f.to_f32()).as_bytes()),
        Value::StrEmpty | Value::StrChar(_) | Value::Str(_) => {
            if let Some(t) = text(heap, v) {
                out.extend_from_slice(&t);
            }
        }
        Value::Proc(_) => out.extend_from_slice(b"<proc>"),
        Value::Func(_) => out.extend_from_slice(b"<func>"),
        Value::Array(arr) => {
            out.push(b'[');
            for (i, elem) in heap.array_elems(arr).into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                render(heap, elem, out);
            }
            out.push(b']');
        }
    }
}

/// `%f` style: six decimals.
fn render_float(f: f32) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{f:.6}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap() -> Heap {
        Heap::new(512)
    }

    fn s(heap: &mut Heap, t: &str) -> Value {
        make_str(heap, t.as_bytes()).unwrap()
    }

    fn shown(heap: &Heap, v: Value) -> String {
        let mut out = Vec::new();
        render(heap, v, &mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_promotion_is_symmetric() {
        let mut h = heap();
        let one_half = Value::Float(F16::from_f32(2.5));
        let a = binary(Opcode::Add, Value::Int(1), one_half, &mut h).unwrap();
        let b = binary(Opcode::Add, one_half, Value::Int(1), &mut h).unwrap();
        assert_eq!(a, Value::Float(F16::from_f32(3.5)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_integer_division_truncates() {
        let mut h = heap();
        let div = |a, b, h: &mut Heap| binary(Opcode::Div, Value::Int(a), Value::Int(b), h);
        assert_eq!(div(5, 2, &mut h), Ok(Value::Int(2)));
        assert_eq!(div(-7, 2, &mut h), Ok(Value::Int(-3)));
        assert_eq!(div(i16::MIN, -1, &mut h), Ok(Value::Int(i16::MIN)));
        assert_eq!(div(1, 0, &mut h), Err(RuntimeError::DivisionByZero));
        let rem = binary(Opcode::Mod, Value::Int(-7), Value::Int(2), &mut h);
        assert_eq!(rem, Ok(Value::Int(-1)));
    }

    #[test]
    fn test_wrapping_arithmetic() {
        let mut h = heap();
        let r = binary(Opcode::Add, Value::Int(i16::MAX), Value::Int(1), &mut h);
        assert_eq!(r, Ok(Value::Int(i16::MIN)));
    }

    #[test]
    fn test_shifts() {
        let mut h = heap();
        let sh = |op, a, b, h: &mut Heap| binary(op, Value::Int(a), Value::Int(b), h);
        assert_eq!(sh(Opcode::Lsl, 1, 4, &mut h), Ok(Value::Int(16)));
        assert_eq!(sh(Opcode::Lsr, -16, 2, &mut h), Ok(Value::Int(0x3ffc)));
        assert_eq!(sh(Opcode::Asr, -16, 2, &mut h), Ok(Value::Int(-4)));
        assert_eq!(sh(Opcode::Lsl, 1, 16, &mut h), Ok(Value::Int(0)));
        assert_eq!(sh(Opcode::Asr, -1, 40, &mut h), Ok(Value::Int(-1)));
        assert!(matches!(
            sh(Opcode::Lsl, 1, -1, &mut h),
            Err(RuntimeError::NegativeArgument { .. })
        ));
    }

    #[test]
    fn test_mixed_kinds_fail() {
        let mut h = heap();
        let x = s(&mut h, "x");
        let err = binary(Opcode::Add, Value::Int(1), x, &mut h).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: 'add' cannot take int and string");
        assert!(binary(Opcode::Land, Value::Int(1), Value::Bool(true), &mut h).is_err());
        assert!(binary(Opcode::Lt, Value::Bool(false), Value::Bool(true), &mut h).is_err());
    }

    #[test]
    fn test_string_concat_and_compare_across_kinds() {
        let mut h = heap();
        let a = s(&mut h, "a");
        let bc = s(&mut h, "bc");
        let abc = binary(Opcode::Add, a, bc, &mut h).unwrap();
        assert_eq!(shown(&h, abc), "abc");
        let empty = binary(Opcode::Add, Value::StrEmpty, Value::StrEmpty, &mut h).unwrap();
        assert_eq!(empty, Value::StrEmpty);
        let abc2 = s(&mut h, "abc");
        assert_eq!(binary(Opcode::Eq, abc, abc2, &mut h), Ok(Value::Bool(true)));
        assert_eq!(binary(Opcode::Lt, a, bc, &mut h), Ok(Value::Bool(true)));
        assert_eq!(binary(Opcode::Lt, Value::StrEmpty, a, &mut h), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_nan_is_unequal() {
        let mut h = heap();
        let nan = Value::Float(F16::from_f32(f32::NAN));
        assert_eq!(binary(Opcode::Eq, nan, nan, &mut h), Ok(Value::Bool(false)));
        assert_eq!(binary(Opcode::Ne, nan, nan, &mut h), Ok(Value::Bool(true)));
        assert_eq!(binary(Opcode::Le, nan, nan, &mut h), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_conversions() {
        let mut h = heap();
        let f = |x: f32| Value::Float(F16::from_f32(x));
        assert_eq!(unary(Opcode::Int, f(-2.75), &mut h), Ok(Value::Int(-2)));
        assert_eq!(
            unary(Opcode::Int, f(1e5), &mut h),
            Err(RuntimeError::NumberOutOfRange("int"))
        );
        let t = s(&mut h, "-42");
        assert_eq!(unary(Opcode::Int, t, &mut h), Ok(Value::Int(-42)));
        let t = s(&mut h, "42x");
        assert_eq!(
            unary(Opcode::Int, t, &mut h),
            Err(RuntimeError::InvalidNumber("42x".into()))
        );
        let t = s(&mut h, "1.5e1");
        assert_eq!(unary(Opcode::Float, t, &mut h), Ok(f(15.0)));
        let t = s(&mut h, "1e");
        assert!(unary(Opcode::Float, t, &mut h).is_err());
        assert_eq!(unary(Opcode::Float, Value::Int(3), &mut h), Ok(f(3.0)));
    }

    #[test]
    fn test_abs_sgn_sqrt() {
        let mut h = heap();
        assert_eq!(unary(Opcode::Abs, Value::Int(-5), &mut h), Ok(Value::Int(5)));
        assert_eq!(unary(Opcode::Abs, Value::Int(i16::MIN), &mut h), Ok(Value::Int(i16::MIN)));
        let neg = Value::Float(F16::from_f32(-1.5));
        assert_eq!(
            unary(Opcode::Abs, neg, &mut h),
            Ok(Value::Float(F16::from_f32(1.5)))
        );
        assert_eq!(unary(Opcode::Sgn, neg, &mut h), Ok(Value::Int(-1)));
        assert_eq!(unary(Opcode::Sgn, Value::Int(0), &mut h), Ok(Value::Int(0)));
        assert_eq!(
            unary(Opcode::Sqrt, Value::Int(9), &mut h),
            Ok(Value::Float(F16::from_f32(3.0)))
        );
    }

    #[test]
    fn test_asc_chr_len() {
        let mut h = heap();
        let hello = s(&mut h, "hello");
        assert_eq!(unary(Opcode::Asc, hello, &mut h), Ok(Value::Int(104)));
        assert_eq!(unary(Opcode::Asc, Value::StrEmpty, &mut h), Ok(Value::Int(0)));
        assert_eq!(unary(Opcode::Chr, Value::Int(65), &mut h), Ok(Value::StrChar(b'A')));
        assert_eq!(unary(Opcode::Len, hello, &mut h), Ok(Value::Int(5)));
        assert_eq!(unary(Opcode::Len, Value::StrChar(b'x'), &mut h), Ok(Value::Int(1)));
    }

    #[test]
    fn test_substring_clamps() {
        let mut h = heap();
        let hello = s(&mut h, "hello");
        let n = |i| Value::Int(i);
        let l = left(&mut h, hello, n(2)).unwrap();
        assert_eq!(shown(&h, l), "he");
        let r = right(&mut h, hello, n(3)).unwrap();
        assert_eq!(shown(&h, r), "llo");
        assert_eq!(left(&mut h, hello, n(0)), Ok(Value::StrEmpty));
        let all = right(&mut h, hello, n(99)).unwrap();
        assert_eq!(shown(&h, all), "hello");
        let mid = substr(&mut h, hello, n(1), n(99)).unwrap();
        assert_eq!(shown(&h, mid), "ello");
        assert_eq!(substr(&mut h, hello, n(9), n(2)), Ok(Value::StrEmpty));
        assert_eq!(substr(&mut h, hello, n(4), n(1)), Ok(Value::StrChar(b'o')));
        assert!(matches!(
            substr(&mut h, hello, n(-1), n(1)),
            Err(RuntimeError::NegativeArgument { .. })
        ));
    }

    #[test]
    fn test_index_and_slice() {
        let mut h = heap();
        let arr = array(&mut h, &[Value::Int(10), Value::Int(20), Value::Int(30)]).unwrap();
        assert_eq!(index(&h, arr, Value::Int(0)), Ok(Value::Int(10)));
        assert_eq!(index(&h, arr, Value::Int(-1)), Ok(Value::Int(30)));
        assert_eq!(
            index(&h, arr, Value::Int(3)),
            Err(RuntimeError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert!(index(&h, arr, Value::Int(-4)).is_err());
        let tail = slice(&mut h, arr, Value::Int(1), Value::Int(3)).unwrap();
        assert_eq!(shown(&h, tail), "[20,30]");
        assert!(slice(&mut h, arr, Value::Int(2), Value::Int(1)).is_err());

        let word = s(&mut h, "tern");
        assert_eq!(index(&h, word, Value::Int(-1)), Ok(Value::StrChar(b'n')));
        let mid = slice(&mut h, word, Value::Int(1), Value::Int(-1)).unwrap();
        assert_eq!(shown(&h, mid), "er");
    }

    #[test]
    fn test_reads_do_not_touch_heap() {
        let mut h = heap();
        let word = s(&mut h, "stable");
        let arr = array(&mut h, &[word, Value::Int(1)]).unwrap();
        let before = h.as_bytes().to_vec();
        for _ in 0..10 {
            assert_eq!(unary(Opcode::Len, word, &mut h), Ok(Value::Int(6)));
            assert_eq!(unary(Opcode::Asc, word, &mut h), Ok(Value::Int(115)));
            assert_eq!(index(&h, arr, Value::Int(1)), Ok(Value::Int(1)));
        }
        assert_eq!(h.as_bytes(), &before[..]);
    }

    #[test]
    fn test_render() {
        let mut h = heap();
        let x = s(&mut h, "hi");
        let inner = array(&mut h, &[Value::Int(1), Value::Bool(true)]).unwrap();
        let outer = array(&mut h, &[inner, x, Value::StrEmpty]).unwrap();
        assert_eq!(shown(&h, outer), "[[1,true],hi,]");
        assert_eq!(shown(&h, Value::Float(F16::from_f32(0.5))), "0.500000");
        assert_eq!(shown(&h, Value::Float(F16::from_f32(f32::INFINITY))), "inf");
        assert_eq!(shown(&h, Value::Float(F16::from_f32(f32::NEG_INFINITY))), "-inf");
        assert_eq!(shown(&h, Value::Float(F16::from_f32(f32::NAN))), "NaN");
        assert_eq!(shown(&h, Value::Int(-3)), "-3");
        assert_eq!(shown(&h, Value::Func(4)), "<func>");
    }
}
