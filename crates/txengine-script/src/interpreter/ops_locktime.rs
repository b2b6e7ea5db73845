//! OP_CHECKLOCKTIMEVERIFY and OP_CHECKSEQUENCEVERIFY.
//!
//! Without their enabling flag both behave as the NOPs they replaced.

use crate::opcodes::*;

use super::error::{InterpreterError, InterpreterErrorCode};
use super::flags::ScriptFlags;
use super::parsed_opcode::ParsedOpcode;
use super::scriptnum::ScriptNumber;
use super::thread::Thread;
use super::TxContext;

/// Lock times below this are block heights, at or above are timestamps.
const LOCK_TIME_THRESHOLD: i64 = 500_000_000;
const MAX_TX_IN_SEQUENCE_NUM: u32 = 0xffff_ffff;
const SEQUENCE_LOCK_TIME_DISABLED: i64 = 1 << 31;
const SEQUENCE_LOCK_TIME_IS_SECONDS: i64 = 1 << 22;
const SEQUENCE_LOCK_TIME_MASK: i64 = 0x0000_ffff;

/// Lock-time operands may be five bytes to cover the full u32 range.
const LOCK_TIME_NUM_LEN: usize = 5;

impl<'a> Thread<'a> {
    pub(crate) fn exec_locktime(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        let flag = match pop.opcode {
            OP_CHECKLOCKTIMEVERIFY => ScriptFlags::VERIFY_CHECKLOCKTIMEVERIFY,
            OP_CHECKSEQUENCEVERIFY => ScriptFlags::VERIFY_CHECKSEQUENCEVERIFY,
            _ => return Err(Self::unhandled(pop)),
        };
        if !self.has_flag(flag) {
            return self.exec_nop(pop);
        }

        let ctx = self.require_tx_context(pop)?;
        let operand = ScriptNumber::from_bytes(
            self.dstack.peek(0)?,
            LOCK_TIME_NUM_LEN,
            self.has_flag(ScriptFlags::VERIFY_MINIMAL_DATA),
        )?;
        if operand.is_negative() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NegativeLockTime,
                format!("negative lock time: {}", operand.to_i64()),
            ));
        }

        if pop.opcode == OP_CHECKLOCKTIMEVERIFY {
            self.check_lock_time(ctx, operand.to_i64())
        } else {
            self.check_sequence(ctx, operand.to_i64())
        }
    }

    fn input_sequence(&self, ctx: &dyn TxContext) -> Result<u32, InterpreterError> {
        ctx.input_sequence(self.input_idx).ok_or_else(|| {
            InterpreterError::new(
                InterpreterErrorCode::InvalidIndex,
                format!("input index {} is out of range", self.input_idx),
            )
        })
    }

    fn check_lock_time(&self, ctx: &dyn TxContext, lock_time: i64) -> Result<(), InterpreterError> {
        verify_lock_time(ctx.lock_time() as i64, LOCK_TIME_THRESHOLD, lock_time)?;

        if self.input_sequence(ctx)? == MAX_TX_IN_SEQUENCE_NUM {
            return Err(InterpreterError::new(
                InterpreterErrorCode::UnsatisfiedLockTime,
                "transaction input is finalized",
            ));
        }
        Ok(())
    }

    fn check_sequence(&self, ctx: &dyn TxContext, sequence: i64) -> Result<(), InterpreterError> {
        if sequence & SEQUENCE_LOCK_TIME_DISABLED != 0 {
            return Ok(());
        }

        if ctx.tx_version() < 2 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::UnsatisfiedLockTime,
                format!("invalid transaction version: {}", ctx.tx_version()),
            ));
        }

        let tx_sequence = self.input_sequence(ctx)? as i64;
        if tx_sequence & SEQUENCE_LOCK_TIME_DISABLED != 0 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::UnsatisfiedLockTime,
                format!(
                    "transaction sequence has sequence locktime disabled bit set: 0x{:x}",
                    tx_sequence
                ),
            ));
        }

        let mask = SEQUENCE_LOCK_TIME_IS_SECONDS | SEQUENCE_LOCK_TIME_MASK;
        verify_lock_time(tx_sequence & mask, SEQUENCE_LOCK_TIME_IS_SECONDS, sequence & mask)
    }
}

fn verify_lock_time(tx_lock_time: i64, threshold: i64, lock_time: i64) -> Result<(), InterpreterError> {
    if (tx_lock_time < threshold) != (lock_time < threshold) {
        return Err(InterpreterError::new(
            InterpreterErrorCode::UnsatisfiedLockTime,
            format!(
                "mismatched locktime types -- tx locktime {}, stack locktime {}",
                tx_lock_time, lock_time
            ),
        ));
    }
    if lock_time > tx_lock_time {
        return Err(InterpreterError::new(
            InterpreterErrorCode::UnsatisfiedLockTime,
            format!(
                "locktime requirement not satisfied -- locktime is greater than the transaction locktime: {} > {}",
                lock_time, tx_lock_time
            ),
        ));
    }
    Ok(())
}
