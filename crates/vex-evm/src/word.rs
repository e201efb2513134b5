//! 256-bit word arithmetic helpers
//!
//! EVM arithmetic is defined over unsigned 256-bit words with wrapping
//! semantics; the signed operations reinterpret the same words as
//! two's-complement. These helpers supply the operations that
//! `primitive_types::U256` does not carry natively.

use primitive_types::{U256, U512};

/// The most significant bit of a 256-bit word, i.e. the sign bit under
/// two's-complement interpretation.
const SIGN_BIT: usize = 255;

/// True if `v` is negative under two's-complement interpretation.
pub fn is_negative(v: &U256) -> bool {
    v.bit(SIGN_BIT)
}

/// Two's-complement negation, `0 - v` with wrapping.
pub fn neg(v: U256) -> U256 {
    (!v).overflowing_add(U256::one()).0
}

/// Absolute value under two's-complement interpretation. The minimum
/// signed value maps to itself.
fn abs(v: U256) -> U256 {
    if is_negative(&v) {
        neg(v)
    } else {
        v
    }
}

/// Signed division. Division by zero yields zero; `MIN_I256 / -1`
/// wraps back to `MIN_I256`.
pub fn sdiv(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let quot = abs(a) / abs(b);
    if is_negative(&a) != is_negative(&b) {
        neg(quot)
    } else {
        quot
    }
}

/// Signed remainder. The result takes the sign of the dividend;
/// modulo by zero yields zero.
pub fn smod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let rem = abs(a) % abs(b);
    if is_negative(&a) {
        neg(rem)
    } else {
        rem
    }
}

/// `(a + b) % n` without intermediate overflow. Zero modulus yields zero.
pub fn addmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    let sum = U512::from(a) + U512::from(b);
    low_u256(sum % U512::from(n))
}

/// `(a * b) % n` over the full 512-bit product. Zero modulus yields zero.
pub fn mulmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    low_u256(a.full_mul(b) % U512::from(n))
}

/// Wrapping exponentiation by squaring.
pub fn exp(base: U256, power: U256) -> U256 {
    let mut result = U256::one();
    let mut base = base;
    let mut power = power;
    while !power.is_zero() {
        if power.bit(0) {
            result = result.overflowing_mul(base).0;
        }
        base = base.overflowing_mul(base).0;
        power >>= 1;
    }
    result
}

/// Sign-extend `value` from byte position `back` (0 = least significant
/// byte). Positions of 31 or more leave the word unchanged.
pub fn signextend(back: U256, value: U256) -> U256 {
    if back >= U256::from(31u8) {
        return value;
    }
    let bit = back.low_u64() as usize * 8 + 7;
    let mask = (U256::one() << (bit + 1)) - U256::one();
    if value.bit(bit) {
        value | !mask
    } else {
        value & mask
    }
}

/// The `i`-th byte of `value` counting from the most significant end.
/// Indices of 32 or more yield zero.
pub fn byte(i: U256, value: U256) -> U256 {
    if i >= U256::from(32u8) {
        return U256::zero();
    }
    let shift = (31 - i.low_u64() as usize) * 8;
    (value >> shift) & U256::from(0xffu8)
}

/// Logical left shift. Shifts of 256 or more yield zero.
pub fn shl(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256u32) {
        U256::zero()
    } else {
        value << shift.low_u64() as usize
    }
}

/// Logical right shift. Shifts of 256 or more yield zero.
pub fn shr(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256u32) {
        U256::zero()
    } else {
        value >> shift.low_u64() as usize
    }
}

/// Arithmetic right shift. Shifts of 256 or more saturate to all-ones
/// for negative values and zero otherwise.
pub fn sar(shift: U256, value: U256) -> U256 {
    let negative = is_negative(&value);
    if shift >= U256::from(256u32) {
        return if negative { U256::max_value() } else { U256::zero() };
    }
    let n = shift.low_u64() as usize;
    let shifted = value >> n;
    if negative && n > 0 {
        // Fill vacated high bits with ones.
        shifted | (U256::max_value() << (256 - n))
    } else {
        shifted
    }
}

/// Signed less-than comparison.
pub fn slt(a: &U256, b: &U256) -> bool {
    match (is_negative(a), is_negative(b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

/// Signed greater-than comparison.
pub fn sgt(a: &U256, b: &U256) -> bool {
    slt(b, a)
}

/// 1 for true, 0 for false.
pub fn from_bool(b: bool) -> U256 {
    if b {
        U256::one()
    } else {
        U256::zero()
    }
}

/// Number of significant bytes in `v`, zero for zero.
pub fn byte_length(v: &U256) -> u64 {
    ((v.bits() as u64) + 7) / 8
}

/// `v` as a u64 if it fits, `None` otherwise.
pub fn to_u64(v: &U256) -> Option<u64> {
    if v.bits() > 64 {
        None
    } else {
        Some(v.low_u64())
    }
}

fn low_u256(v: U512) -> U256 {
    let mut bytes = [0u8; 64];
    v.to_big_endian(&mut bytes);
    U256::from_big_endian(&bytes[32..])
}
