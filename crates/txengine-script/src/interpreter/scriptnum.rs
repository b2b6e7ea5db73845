//! Script number arithmetic with consensus encoding rules.
//!
//! Numbers on the script stack are little-endian byte strings with a sign bit
//! in the most significant bit of the last byte. Operands are limited to the
//! configured number length but results may overflow and remain valid as long
//! as they are not read back as numbers.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use super::error::{InterpreterError, InterpreterErrorCode};

/// A script number backed by a big integer so intermediate results never wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptNumber {
    pub val: BigInt,
}

impl ScriptNumber {
    pub fn new(val: i64) -> Self {
        ScriptNumber {
            val: BigInt::from(val),
        }
    }

    /// Decode a stack element.
    ///
    /// Fails with `NumberTooBig` when `bb` is longer than `max_len` and, if
    /// `require_minimal` is set, with `MinimalData` on a padded encoding.
    pub fn from_bytes(
        bb: &[u8],
        max_len: usize,
        require_minimal: bool,
    ) -> Result<Self, InterpreterError> {
        if bb.len() > max_len {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NumberTooBig,
                format!(
                    "numeric value encoded as {:02x?} is {} bytes which exceeds the max allowed of {}",
                    bb,
                    bb.len(),
                    max_len
                ),
            ));
        }

        if require_minimal {
            check_minimal_data_encoding(bb)?;
        }

        let Some((&last, _)) = bb.split_last() else {
            return Ok(ScriptNumber { val: BigInt::zero() });
        };

        let mut magnitude = bb.to_vec();
        let top = magnitude.len() - 1;
        magnitude[top] &= 0x7f;
        let mut val = BigInt::from_bytes_le(num_bigint::Sign::Plus, &magnitude);
        if last & 0x80 != 0 {
            val = -val;
        }
        Ok(ScriptNumber { val })
    }

    /// Minimal little-endian sign-magnitude encoding. Zero encodes as empty.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.val.is_zero() {
            return vec![];
        }

        let is_negative = self.val.is_negative();
        let (_, mut result) = self.val.abs().to_bytes_le();

        if result[result.len() - 1] & 0x80 != 0 {
            result.push(if is_negative { 0x80 } else { 0x00 });
        } else if is_negative {
            let last = result.len() - 1;
            result[last] |= 0x80;
        }
        result
    }

    pub fn add(&mut self, other: &ScriptNumber) -> &mut Self {
        self.val = &self.val + &other.val;
        self
    }

    pub fn sub(&mut self, other: &ScriptNumber) -> &mut Self {
        self.val = &self.val - &other.val;
        self
    }

    pub fn mul(&mut self, other: &ScriptNumber) -> &mut Self {
        self.val = &self.val * &other.val;
        self
    }

    /// Quotient truncated toward zero. The caller rejects a zero divisor.
    pub fn div(&mut self, other: &ScriptNumber) -> &mut Self {
        let (q, _) = self.val.div_rem(&other.val);
        self.val = q;
        self
    }

    /// Remainder with the sign of the dividend.
    pub fn modulo(&mut self, other: &ScriptNumber) -> &mut Self {
        let (_, r) = self.val.div_rem(&other.val);
        self.val = r;
        self
    }

    pub fn incr(&mut self) -> &mut Self {
        self.val += 1;
        self
    }

    pub fn decr(&mut self) -> &mut Self {
        self.val -= 1;
        self
    }

    pub fn neg(&mut self) -> &mut Self {
        self.val = -&self.val;
        self
    }

    pub fn abs(&mut self) -> &mut Self {
        self.val = self.val.abs();
        self
    }

    pub fn set(&mut self, i: i64) -> &mut Self {
        self.val = BigInt::from(i);
        self
    }

    pub fn is_zero(&self) -> bool {
        self.val.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.val.is_negative()
    }

    pub fn less_than(&self, other: &ScriptNumber) -> bool {
        self.val < other.val
    }

    pub fn less_than_or_equal(&self, other: &ScriptNumber) -> bool {
        self.val <= other.val
    }

    pub fn greater_than(&self, other: &ScriptNumber) -> bool {
        self.val > other.val
    }

    pub fn greater_than_or_equal(&self, other: &ScriptNumber) -> bool {
        self.val >= other.val
    }

    pub fn equal(&self, other: &ScriptNumber) -> bool {
        self.val == other.val
    }

    /// Convert to i32, clamping to [i32::MIN, i32::MAX] on overflow.
    pub fn to_i32(&self) -> i32 {
        match self.val.to_i32() {
            Some(v) => v,
            None if self.val.is_positive() => i32::MAX,
            None => i32::MIN,
        }
    }

    /// Convert to i64, clamping to [i64::MIN, i64::MAX] on overflow.
    pub fn to_i64(&self) -> i64 {
        match self.val.to_i64() {
            Some(v) => v,
            None if self.val.is_positive() => i64::MAX,
            None => i64::MIN,
        }
    }
}

/// Minimally encode a byte array (used by OP_BIN2NUM).
pub fn minimally_encode(data: &[u8]) -> Vec<u8> {
    if data.is_empty() {
        return vec![];
    }

    let mut data = data.to_vec();
    let last = data[data.len() - 1];

    if last & 0x7f != 0 {
        return data;
    }

    if data.len() == 1 {
        return vec![];
    }

    if data[data.len() - 2] & 0x80 != 0 {
        return data;
    }

    let mut i = data.len() - 1;
    while i > 0 {
        if data[i - 1] != 0 {
            if data[i - 1] & 0x80 != 0 {
                data[i] = last;
                data.truncate(i + 1);
            } else {
                data[i - 1] |= last;
                data.truncate(i);
            }
            return data;
        }
        i -= 1;
    }

    vec![]
}

/// Check that a byte array uses minimal numeric encoding.
pub fn check_minimal_data_encoding(v: &[u8]) -> Result<(), InterpreterError> {
    let Some((&last, rest)) = v.split_last() else {
        return Ok(());
    };

    if last & 0x7f == 0 && rest.last().map_or(true, |b| b & 0x80 == 0) {
        return Err(InterpreterError::new(
            InterpreterErrorCode::MinimalData,
            format!("numeric value encoded as {:02x?} is not minimally encoded", v),
        ));
    }

    Ok(())
}
