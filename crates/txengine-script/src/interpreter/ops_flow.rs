//! Flow control and NOP opcodes.

use crate::opcodes::*;

use super::error::{InterpreterError, InterpreterErrorCode};
use super::flags::ScriptFlags;
use super::parsed_opcode::ParsedOpcode;
use super::stack::as_bool;
use super::thread::Thread;

impl<'a> Thread<'a> {
    pub(crate) fn exec_flow(
        &mut self,
        pop: &ParsedOpcode,
        executing: bool,
    ) -> Result<(), InterpreterError> {
        match pop.opcode {
            OP_IF | OP_NOTIF => {
                if !executing {
                    self.branches.push_skipped();
                    return Ok(());
                }
                let value = self.pop_if_bool()?;
                self.branches.push_if(value == (pop.opcode == OP_IF));
                Ok(())
            }
            OP_ELSE => self.branches.toggle_else(),
            OP_ENDIF => self.branches.pop_endif(),
            OP_VERIFY => self.abstract_verify(pop, InterpreterErrorCode::Verify),
            OP_RETURN => Err(InterpreterError::new(
                InterpreterErrorCode::EarlyReturn,
                "script returned early",
            )),
            _ => Err(Self::unhandled(pop)),
        }
    }

    /// Pop the IF/NOTIF operand. With VERIFY_MINIMAL_IF it must be empty or
    /// exactly `0x01`.
    fn pop_if_bool(&mut self) -> Result<bool, InterpreterError> {
        if !self.has_flag(ScriptFlags::VERIFY_MINIMAL_IF) {
            return self.dstack.pop_bool();
        }
        let b = self.dstack.pop_byte_array()?;
        if b.len() > 1 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::MinimalIf,
                format!("conditional has data of length {}", b.len()),
            ));
        }
        if b.len() == 1 && b[0] != 1 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::MinimalIf,
                format!("conditional operand 0x{:02x} is not minimal", b[0]),
            ));
        }
        Ok(as_bool(&b))
    }

    /// Pop the top item and fail with `code` unless it is true.
    pub(crate) fn abstract_verify(
        &mut self,
        pop: &ParsedOpcode,
        code: InterpreterErrorCode,
    ) -> Result<(), InterpreterError> {
        if !self.dstack.pop_bool()? {
            return Err(InterpreterError::new(code, format!("{} failed", pop.name())));
        }
        Ok(())
    }

    pub(crate) fn exec_nop(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        if pop.opcode != OP_NOP && self.has_flag(ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS) {
            return Err(InterpreterError::new(
                InterpreterErrorCode::DiscourageUpgradableNops,
                format!("{} reserved for soft-fork upgrades", pop.name()),
            ));
        }
        Ok(())
    }
}
