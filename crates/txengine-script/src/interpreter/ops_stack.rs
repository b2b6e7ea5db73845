//! Stack manipulation opcodes.

use crate::opcodes::*;

use super::error::{InterpreterError, InterpreterErrorCode};
use super::parsed_opcode::ParsedOpcode;
use super::scriptnum::ScriptNumber;
use super::stack::as_bool;
use super::thread::Thread;

impl<'a> Thread<'a> {
    pub(crate) fn exec_stack(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        match pop.opcode {
            OP_TOALTSTACK => {
                let data = self.dstack.pop_byte_array()?;
                self.astack.push_byte_array(data);
                Ok(())
            }
            OP_FROMALTSTACK => {
                let data = self.astack.pop_byte_array()?;
                self.dstack.push_byte_array(data);
                Ok(())
            }
            OP_2DROP => self.dstack.drop_n(2),
            OP_2DUP => self.dstack.dup_n(2),
            OP_3DUP => self.dstack.dup_n(3),
            OP_2OVER => self.dstack.over_n(2),
            OP_2ROT => self.dstack.rot_n(2),
            OP_2SWAP => self.dstack.swap_n(2),
            OP_IFDUP => {
                let so = self.dstack.peek_byte_array(0)?;
                if as_bool(&so) {
                    self.dstack.push_byte_array(so);
                }
                Ok(())
            }
            OP_DEPTH => {
                let depth = self.dstack.depth() as i64;
                self.dstack.push_int(&ScriptNumber::new(depth));
                Ok(())
            }
            OP_DROP => self.dstack.drop_n(1),
            OP_DUP => self.dstack.dup_n(1),
            OP_NIP => self.dstack.nip_n_discard(1),
            OP_OVER => self.dstack.over_n(1),
            OP_PICK => {
                let n = self.pop_stack_index()?;
                self.dstack.pick_n(n)
            }
            OP_ROLL => {
                let n = self.pop_stack_index()?;
                self.dstack.roll_n(n)
            }
            OP_ROT => self.dstack.rot_n(1),
            OP_SWAP => self.dstack.swap_n(1),
            OP_TUCK => self.dstack.tuck(),
            _ => Err(Self::unhandled(pop)),
        }
    }

    fn pop_stack_index(&mut self) -> Result<usize, InterpreterError> {
        let n = self.dstack.pop_int()?;
        usize::try_from(n.to_i64()).map_err(|_| {
            InterpreterError::new(
                InterpreterErrorCode::InvalidStackOperation,
                format!("negative stack index {}", n.to_i64()),
            )
        })
    }
}
