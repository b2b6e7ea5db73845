//! Numeric opcodes and the byte-string shifts.

use crate::opcodes::*;

use super::error::{InterpreterError, InterpreterErrorCode};
use super::parsed_opcode::ParsedOpcode;
use super::scriptnum::ScriptNumber;
use super::thread::Thread;

impl<'a> Thread<'a> {
    pub(crate) fn exec_arithmetic(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        match pop.opcode {
            OP_1ADD => self.op_unary_int(|m| {
                m.incr();
            }),
            OP_1SUB => self.op_unary_int(|m| {
                m.decr();
            }),
            OP_NEGATE => self.op_unary_int(|m| {
                m.neg();
            }),
            OP_ABS => self.op_unary_int(|m| {
                m.abs();
            }),
            OP_NOT => self.op_unary_int(|m| {
                let zero = m.is_zero();
                m.set(zero as i64);
            }),
            OP_0NOTEQUAL => self.op_unary_int(|m| {
                if !m.is_zero() {
                    m.set(1);
                }
            }),
            OP_ADD => self.op_binary_int(|a, b| {
                a.add(b);
            }),
            OP_SUB => self.op_binary_int(|a, b| {
                a.sub(b);
            }),
            OP_MUL => self.op_binary_int(|a, b| {
                a.mul(b);
            }),
            OP_DIV => self.op_div_mod(false),
            OP_MOD => self.op_div_mod(true),
            OP_LSHIFT => self.op_shift(true),
            OP_RSHIFT => self.op_shift(false),
            OP_BOOLAND => self.op_bool_binop(|a, b| !a.is_zero() && !b.is_zero()),
            OP_BOOLOR => self.op_bool_binop(|a, b| !a.is_zero() || !b.is_zero()),
            OP_NUMEQUAL => self.op_bool_binop(|a, b| a.equal(b)),
            OP_NUMEQUALVERIFY => {
                self.op_bool_binop(|a, b| a.equal(b))?;
                self.abstract_verify(pop, InterpreterErrorCode::NumEqualVerify)
            }
            OP_NUMNOTEQUAL => self.op_bool_binop(|a, b| !a.equal(b)),
            OP_LESSTHAN => self.op_bool_binop(|a, b| a.less_than(b)),
            OP_GREATERTHAN => self.op_bool_binop(|a, b| a.greater_than(b)),
            OP_LESSTHANOREQUAL => self.op_bool_binop(|a, b| a.less_than_or_equal(b)),
            OP_GREATERTHANOREQUAL => self.op_bool_binop(|a, b| a.greater_than_or_equal(b)),
            OP_MIN => self.op_binary_int(|a, b| {
                if b.less_than(a) {
                    *a = b.clone();
                }
            }),
            OP_MAX => self.op_binary_int(|a, b| {
                if b.greater_than(a) {
                    *a = b.clone();
                }
            }),
            OP_WITHIN => {
                let max_val = self.dstack.pop_int()?;
                let min_val = self.dstack.pop_int()?;
                let x = self.dstack.pop_int()?;
                self.dstack
                    .push_bool(min_val.less_than_or_equal(&x) && x.less_than(&max_val));
                Ok(())
            }
            _ => Err(Self::unhandled(pop)),
        }
    }

    fn op_unary_int(&mut self, f: impl FnOnce(&mut ScriptNumber)) -> Result<(), InterpreterError> {
        let mut m = self.dstack.pop_int()?;
        f(&mut m);
        self.dstack.push_int(&m);
        Ok(())
    }

    /// Pops `b` then `a` and pushes `f(a, b)` left in `a`.
    fn op_binary_int(
        &mut self,
        f: impl FnOnce(&mut ScriptNumber, &ScriptNumber),
    ) -> Result<(), InterpreterError> {
        let b = self.dstack.pop_int()?;
        let mut a = self.dstack.pop_int()?;
        f(&mut a, &b);
        self.dstack.push_int(&a);
        Ok(())
    }

    fn op_bool_binop(
        &mut self,
        f: impl FnOnce(&ScriptNumber, &ScriptNumber) -> bool,
    ) -> Result<(), InterpreterError> {
        let b = self.dstack.pop_int()?;
        let a = self.dstack.pop_int()?;
        self.dstack.push_int(&ScriptNumber::new(f(&a, &b) as i64));
        Ok(())
    }

    fn op_div_mod(&mut self, remainder: bool) -> Result<(), InterpreterError> {
        let b = self.dstack.pop_int()?;
        let mut a = self.dstack.pop_int()?;
        if b.is_zero() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::DivideByZero,
                if remainder { "mod by zero" } else { "divide by zero" },
            ));
        }
        if remainder {
            a.modulo(&b);
        } else {
            a.div(&b);
        }
        self.dstack.push_int(&a);
        Ok(())
    }

    /// Shift the byte string as one big-endian bit string, keeping its length.
    fn op_shift(&mut self, left: bool) -> Result<(), InterpreterError> {
        let num = self.dstack.pop_int()?;
        if num.is_negative() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NumberTooSmall,
                format!("shift amount {} is negative", num.to_i64()),
            ));
        }
        let x = self.dstack.pop_byte_array()?;
        let n = usize::try_from(num.to_i64()).unwrap_or(usize::MAX);
        let result = if left { shift_left(&x, n) } else { shift_right(&x, n) };
        self.dstack.push_byte_array(result);
        Ok(())
    }
}

fn shift_left(x: &[u8], n: usize) -> Vec<u8> {
    let byte_shift = n / 8;
    let bit_shift = (n % 8) as u32;
    let mut result = vec![0u8; x.len()];
    for k in 0..x.len() {
        let Some(i) = k.checked_add(byte_shift).filter(|&i| i < x.len()) else {
            break;
        };
        let mut v = x[i] << bit_shift;
        if bit_shift > 0 {
            if let Some(&next) = x.get(i + 1) {
                v |= next >> (8 - bit_shift);
            }
        }
        result[k] = v;
    }
    result
}

fn shift_right(x: &[u8], n: usize) -> Vec<u8> {
    let byte_shift = n / 8;
    let bit_shift = (n % 8) as u32;
    let mut result = vec![0u8; x.len()];
    for k in byte_shift.min(x.len())..x.len() {
        let i = k - byte_shift;
        let mut v = x[i] >> bit_shift;
        if bit_shift > 0 && i > 0 {
            v |= x[i - 1] << (8 - bit_shift);
        }
        result[k] = v;
    }
    result
}
