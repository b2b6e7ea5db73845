//! Splice and bitwise opcodes.

use crate::opcodes::*;

use super::error::{InterpreterError, InterpreterErrorCode};
use super::parsed_opcode::ParsedOpcode;
use super::scriptnum::*;
use super::thread::Thread;

impl<'a> Thread<'a> {
    pub(crate) fn exec_splice(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        match pop.opcode {
            OP_CAT => self.op_cat(),
            OP_SPLIT => self.op_split(),
            OP_NUM2BIN => self.op_num2bin(),
            OP_BIN2NUM => self.op_bin2num(),
            OP_SIZE => {
                let len = self.dstack.peek(0)?.len() as i64;
                self.dstack.push_int(&ScriptNumber::new(len));
                Ok(())
            }
            _ => Err(Self::unhandled(pop)),
        }
    }

    pub(crate) fn exec_bitwise(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        match pop.opcode {
            OP_INVERT => {
                let ba = self.dstack.pop_byte_array()?;
                self.dstack.push_byte_array(ba.iter().map(|b| !b).collect());
                Ok(())
            }
            OP_AND => self.op_bitwise(|a, b| a & b),
            OP_OR => self.op_bitwise(|a, b| a | b),
            OP_XOR => self.op_bitwise(|a, b| a ^ b),
            OP_EQUAL => self.op_equal(),
            OP_EQUALVERIFY => {
                self.op_equal()?;
                self.abstract_verify(pop, InterpreterErrorCode::EqualVerify)
            }
            _ => Err(Self::unhandled(pop)),
        }
    }

    fn op_cat(&mut self) -> Result<(), InterpreterError> {
        let b = self.dstack.pop_byte_array()?;
        let mut c = self.dstack.pop_byte_array()?;
        if c.len() + b.len() > self.cfg.max_element_size() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::ElementTooBig,
                format!(
                    "concatenated size {} exceeds max allowed size {}",
                    c.len() + b.len(),
                    self.cfg.max_element_size()
                ),
            ));
        }
        c.extend_from_slice(&b);
        self.dstack.push_byte_array(c);
        Ok(())
    }

    fn op_split(&mut self) -> Result<(), InterpreterError> {
        let n = self.dstack.pop_int()?;
        let mut c = self.dstack.pop_byte_array()?;
        let pos = usize::try_from(n.to_i64())
            .ok()
            .filter(|&pos| pos <= c.len())
            .ok_or_else(|| {
                InterpreterError::new(
                    InterpreterErrorCode::InvalidSplitRange,
                    format!("split position {} outside of 0..={}", n.to_i64(), c.len()),
                )
            })?;
        let b = c.split_off(pos);
        self.dstack.push_byte_array(c);
        self.dstack.push_byte_array(b);
        Ok(())
    }

    fn op_num2bin(&mut self) -> Result<(), InterpreterError> {
        let n = self.dstack.pop_int()?;
        let a = self.dstack.pop_byte_array()?;

        let max = self.cfg.max_element_size();
        let size = usize::try_from(n.to_i64()).map_err(|_| {
            InterpreterError::new(
                InterpreterErrorCode::NumberTooSmall,
                format!("requested size {} is negative", n.to_i64()),
            )
        })?;
        if size > max {
            return Err(InterpreterError::new(
                InterpreterErrorCode::ElementTooBig,
                format!("requested size {} is larger than the max of {}", size, max),
            ));
        }

        let mut b = minimally_encode(&a);
        if size < b.len() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NumberTooSmall,
                format!("value of {} bytes cannot fit into {} bytes", b.len(), size),
            ));
        }
        if size == b.len() {
            self.dstack.push_byte_array(b);
            return Ok(());
        }

        let mut signbit = 0x00;
        if let Some(last) = b.last_mut() {
            signbit = *last & 0x80;
            *last &= 0x7f;
        }
        b.resize(size - 1, 0x00);
        b.push(signbit);

        self.dstack.push_byte_array(b);
        Ok(())
    }

    fn op_bin2num(&mut self) -> Result<(), InterpreterError> {
        let a = self.dstack.pop_byte_array()?;
        let b = minimally_encode(&a);
        if b.len() > self.cfg.max_number_length() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NumberTooBig,
                format!(
                    "script numbers are limited to {} bytes",
                    self.cfg.max_number_length()
                ),
            ));
        }
        self.dstack.push_byte_array(b);
        Ok(())
    }

    fn op_bitwise(&mut self, f: fn(u8, u8) -> u8) -> Result<(), InterpreterError> {
        let a = self.dstack.pop_byte_array()?;
        let b = self.dstack.pop_byte_array()?;
        if a.len() != b.len() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::InvalidInputLength,
                format!("operands have lengths {} and {}", b.len(), a.len()),
            ));
        }
        let c = a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect();
        self.dstack.push_byte_array(c);
        Ok(())
    }

    fn op_equal(&mut self) -> Result<(), InterpreterError> {
        let a = self.dstack.pop_byte_array()?;
        let b = self.dstack.pop_byte_array()?;
        self.dstack.push_bool(a == b);
        Ok(())
    }
}
