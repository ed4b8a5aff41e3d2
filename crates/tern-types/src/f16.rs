//! IEEE 754 binary16 codec.
//!
//! Floats live in value payloads as raw half-precision bit patterns; the VM
//! widens them to `f32` for arithmetic and narrows the result again.

/// Canonical quiet NaN produced for every NaN input.
pub const CANONICAL_NAN: u16 = 0x7e00;

const SIGN: u16 = 0x8000;
const INFINITY: u16 = 0x7c00;

/// A half-precision float stored as its bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct F16(u16);

impl F16 {
    pub fn from_bits(bits: u16) -> Self {
        F16(bits)
    }

    pub fn to_bits(self) -> u16 {
        self.0
    }

    /// Narrow an `f32`, rounding to nearest with ties to even.
    ///
    /// Magnitudes beyond the largest finite half round to infinity and
    /// results below the normal range become subnormals.
    pub fn from_f32(f: f32) -> Self {
        if f.is_nan() {
            return F16(CANONICAL_NAN);
        }
        let bits = f.to_bits();
        let sign = ((bits >> 16) as u16) & SIGN;
        if f.is_infinite() {
            return F16(sign | INFINITY);
        }
        let exp = ((bits >> 23) & 0xff) as i32 - 127 + 15;
        let mant = bits & 0x007f_ffff;

        if exp >= 31 {
            return F16(sign | INFINITY);
        }

        if exp <= 0 {
            // Subnormal or underflow: shift the implicit-one mantissa down.
            let shift = (14 - exp) as u32;
            if shift > 24 {
                return F16(sign);
            }
            let m = mant | 0x0080_0000;
            let half = round_shift(m, shift);
            return F16(sign | half as u16);
        }

        let base = ((exp as u32) << 10) | (mant >> 13);
        let half = base + round_increment(mant & 0x1fff, 13, base);
        if half >= INFINITY as u32 {
            return F16(sign | INFINITY);
        }
        F16(sign | half as u16)
    }

    /// Widen to `f32`. Exact for every pattern.
    pub fn to_f32(self) -> f32 {
        let sign = self.0 & SIGN != 0;
        let exp = (self.0 >> 10) & 0x1f;
        let mant = (self.0 & 0x03ff) as u32;
        let magnitude = match exp {
            0 => mant as f32 * f32::powi(2.0, -24),
            31 if mant == 0 => f32::INFINITY,
            31 => f32::NAN,
            _ => f32::from_bits(((exp as u32 + 112) << 23) | (mant << 13)),
        };
        if sign {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn is_nan(self) -> bool {
        self.0 & 0x7c00 == 0x7c00 && self.0 & 0x03ff != 0
    }
}

fn round_increment(rem: u32, shift: u32, kept: u32) -> u32 {
    let halfway = 1 << (shift - 1);
    if rem > halfway || (rem == halfway && kept & 1 == 1) {
        1
    } else {
        0
    }
}

fn round_shift(m: u32, shift: u32) -> u32 {
    let kept = m >> shift;
    let rem = m & ((1 << shift) - 1);
    kept + round_increment(rem, shift, kept)
}

impl From<f32> for F16 {
    fn from(f: f32) -> Self {
        F16::from_f32(f)
    }
}

impl From<F16> for f32 {
    fn from(h: F16) -> Self {
        h.to_f32()
    }
}
