//! Script execution thread: the evaluation loop and opcode dispatch.

use log::{debug, trace};

use crate::opcodes::*;
use crate::Script;

use super::branch::BranchStack;
use super::config::Config;
use super::error::{InterpreterError, InterpreterErrorCode};
use super::flags::ScriptFlags;
use super::opcode_table::{Gate, OpcodeCategory, OpcodeInfo};
use super::parsed_opcode::*;
use super::script_code::ScriptCode;
use super::stack::*;
use super::TxContext;

/// State for one verification of an unlocking/locking script pair.
pub struct Thread<'a> {
    pub(crate) dstack: Stack,
    pub(crate) astack: Stack,
    pub(crate) branches: BranchStack,
    pub(crate) cfg: Config,
    pub(crate) flags: ScriptFlags,
    pub(crate) tx_context: Option<&'a dyn TxContext>,
    pub(crate) input_idx: usize,
    /// The script currently being evaluated.
    script: ParsedScript,
    script_off: usize,
    /// Index of the first instruction after the last executed OP_CODESEPARATOR.
    code_start: usize,
    num_ops: usize,
}

impl<'a> Thread<'a> {
    /// Validate the flag set and build an empty thread.
    ///
    /// ENABLE_SIGHASH_FORKID implies STRICT_ENCODING. VERIFY_CLEAN_STACK
    /// without P2SH is rejected.
    pub fn new(
        cfg: Config,
        flags: ScriptFlags,
        tx_context: Option<&'a dyn TxContext>,
        input_idx: usize,
    ) -> Result<Self, InterpreterError> {
        let mut actual_flags = flags;
        if actual_flags.has_flag(ScriptFlags::ENABLE_SIGHASH_FORKID) {
            actual_flags.add_flag(ScriptFlags::STRICT_ENCODING);
        }

        if actual_flags.has_flag(ScriptFlags::VERIFY_CLEAN_STACK)
            && !actual_flags.has_flag(ScriptFlags::P2SH)
        {
            return Err(InterpreterError::new(
                InterpreterErrorCode::InvalidFlags,
                "invalid scriptflag combination: clean stack requires P2SH",
            ));
        }

        let verify_minimal_data = actual_flags.has_flag(ScriptFlags::VERIFY_MINIMAL_DATA);
        let max_num_len = cfg.max_number_length();

        Ok(Thread {
            dstack: Stack::new(max_num_len, verify_minimal_data),
            astack: Stack::new(max_num_len, verify_minimal_data),
            branches: BranchStack::new(),
            cfg,
            flags: actual_flags,
            tx_context,
            input_idx,
            script: Vec::new(),
            script_off: 0,
            code_start: 0,
            num_ops: 0,
        })
    }

    pub fn has_flag(&self, flag: ScriptFlags) -> bool {
        self.flags.has_flag(flag)
    }

    /// Evaluate `unlocking` then `locking` and, for a P2SH locking script,
    /// the redeem script the unlocking script pushed last.
    pub fn verify(&mut self, unlocking: &Script, locking: &Script) -> Result<(), InterpreterError> {
        self.check_script_size("unlocking", unlocking.len())?;
        self.check_script_size("locking", locking.len())?;

        if unlocking.is_empty() && locking.is_empty() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::EvalFalse,
                "false stack entry at end of script execution",
            ));
        }

        let uscript = parse_script(unlocking.to_bytes())?;
        let lscript = parse_script(locking.to_bytes())?;
        let unlocking_push_only = is_push_only(&uscript);

        if self.has_flag(ScriptFlags::VERIFY_SIG_PUSH_ONLY) && !unlocking_push_only {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NotPushOnly,
                "signature script is not push only",
            ));
        }

        let p2sh = self.has_flag(ScriptFlags::P2SH) && locking.is_p2sh();
        if p2sh && !unlocking_push_only {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NotPushOnly,
                "pay to script hash is not push only",
            ));
        }

        self.run_script(uscript)?;
        let saved_first_stack = if p2sh {
            self.dstack.items().to_vec()
        } else {
            Vec::new()
        };

        self.run_script(lscript)?;
        self.check_top_true()?;

        if p2sh {
            let mut stack = saved_first_stack;
            let redeem = stack.pop().ok_or_else(|| {
                InterpreterError::new(
                    InterpreterErrorCode::EmptyStack,
                    "no redeem script on the stack for pay to script hash",
                )
            })?;
            self.check_script_size("redeem", redeem.len())?;
            debug!(
                "evaluating P2SH redeem script of {} bytes for input {}",
                redeem.len(),
                self.input_idx
            );
            let rscript = parse_script(&redeem)?;
            self.dstack.set_stack(stack);
            self.run_script(rscript)?;
            self.check_top_true()?;
        }

        if self.has_flag(ScriptFlags::VERIFY_CLEAN_STACK) && self.dstack.depth() != 1 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::CleanStack,
                format!("stack contains {} unexpected items", self.dstack.depth() - 1),
            ));
        }

        Ok(())
    }

    fn check_script_size(&self, which: &str, len: usize) -> Result<(), InterpreterError> {
        if len > self.cfg.max_script_size() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::ScriptTooBig,
                format!(
                    "{} script size {} is larger than the max allowed size {}",
                    which,
                    len,
                    self.cfg.max_script_size()
                ),
            ));
        }
        Ok(())
    }

    fn check_top_true(&self) -> Result<(), InterpreterError> {
        if self.dstack.depth() == 0 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::EmptyStack,
                "stack empty at end of script execution",
            ));
        }
        if !self.dstack.peek_bool(0)? {
            return Err(InterpreterError::new(
                InterpreterErrorCode::EvalFalse,
                "false stack entry at end of script execution",
            ));
        }
        Ok(())
    }

    /// Run one script to completion on the current main stack.
    ///
    /// The operation count, branch state, alt stack and code separator
    /// position do not carry over from one script to the next.
    fn run_script(&mut self, script: ParsedScript) -> Result<(), InterpreterError> {
        self.script = script;
        self.script_off = 0;
        self.code_start = 0;
        self.num_ops = 0;
        self.branches = BranchStack::new();

        while self.script_off < self.script.len() {
            let pop = self.script[self.script_off].clone();
            self.execute_opcode(&pop)?;
            self.script_off += 1;

            let combined = self.dstack.depth() + self.astack.depth();
            if combined > self.cfg.max_stack_size() {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::StackOverflow,
                    format!(
                        "combined stack size {} > max allowed {}",
                        combined,
                        self.cfg.max_stack_size()
                    ),
                ));
            }
        }

        if !self.branches.is_empty() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::UnbalancedConditional,
                "end of script reached in conditional execution",
            ));
        }

        self.astack.clear();
        Ok(())
    }

    /// The signed portion of the executing script.
    pub(crate) fn script_code(&self) -> ScriptCode<'_> {
        ScriptCode::new(&self.script, self.code_start)
    }

    /// Opcodes whose gate is closed fail wherever they appear, executed or not.
    fn check_gate(&self, pop: &ParsedOpcode, info: &OpcodeInfo) -> Result<(), InterpreterError> {
        let (enabled, requirement) = match info.gate {
            Gate::Always => return Ok(()),
            Gate::ExtendedA => (
                self.has_flag(ScriptFlags::ENABLE_EXTENDED_OPS_A),
                "ENABLE_EXTENDED_OPS_A",
            ),
            Gate::ExtendedB => (
                self.has_flag(ScriptFlags::ENABLE_EXTENDED_OPS_B),
                "ENABLE_EXTENDED_OPS_B",
            ),
            Gate::Never if info.category == OpcodeCategory::Disabled => {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::DisabledOpcode,
                    format!("attempt to execute disabled opcode {}", pop.name()),
                ));
            }
            Gate::Never => {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::ReservedOpcode,
                    format!("attempt to execute reserved opcode {}", pop.name()),
                ));
            }
        };
        if !enabled {
            return Err(InterpreterError::new(
                InterpreterErrorCode::OpcodeNotEnabled,
                format!("opcode {} requires the {} flag", pop.name(), requirement),
            ));
        }
        Ok(())
    }

    fn execute_opcode(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        let info = pop.info();

        if pop.data.len() > self.cfg.max_element_size() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::ElementTooBig,
                format!(
                    "element size {} exceeds max allowed size {}",
                    pop.data.len(),
                    self.cfg.max_element_size()
                ),
            ));
        }

        self.check_gate(pop, info)?;

        if pop.opcode > OP_16 {
            self.add_ops(1)?;
        }

        let executing = self.branches.is_executing();
        if !executing && !pop.is_conditional() {
            return Ok(());
        }

        trace!(
            "{:04} {} depth={} branches={}",
            self.script_off,
            info.name,
            self.dstack.depth(),
            self.branches.depth()
        );

        if executing {
            if self.has_flag(ScriptFlags::VERIFY_MINIMAL_DATA) && pop.opcode <= OP_PUSHDATA4 {
                pop.enforce_minimum_data_push()?;
            }
            if self.dstack.depth() < info.arity as usize {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::InvalidStackOperation,
                    format!(
                        "{} requires {} stack items, have {}",
                        info.name,
                        info.arity,
                        self.dstack.depth()
                    ),
                ));
            }
        }

        match info.category {
            OpcodeCategory::Push => self.exec_push(pop),
            OpcodeCategory::FlowControl => self.exec_flow(pop, executing),
            OpcodeCategory::Stack => self.exec_stack(pop),
            OpcodeCategory::Splice => self.exec_splice(pop),
            OpcodeCategory::Bitwise => self.exec_bitwise(pop),
            OpcodeCategory::Arithmetic => self.exec_arithmetic(pop),
            OpcodeCategory::Crypto => self.exec_crypto(pop),
            OpcodeCategory::LockTime => self.exec_locktime(pop),
            OpcodeCategory::Nop => self.exec_nop(pop),
            OpcodeCategory::Reserved => Err(InterpreterError::new(
                InterpreterErrorCode::ReservedOpcode,
                format!("attempt to execute reserved opcode {}", pop.name()),
            )),
            OpcodeCategory::Disabled => Err(InterpreterError::new(
                InterpreterErrorCode::DisabledOpcode,
                format!("attempt to execute disabled opcode {}", pop.name()),
            )),
            OpcodeCategory::Invalid => Err(InterpreterError::new(
                InterpreterErrorCode::InvalidOpcode,
                format!("attempt to execute invalid opcode 0x{:02x}", pop.opcode),
            )),
        }
    }

    fn exec_push(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        match pop.opcode {
            OP_1NEGATE => self.dstack.push_byte_array(vec![0x81]),
            op @ OP_1..=OP_16 => self.dstack.push_byte_array(vec![op - (OP_1 - 1)]),
            _ => self.dstack.push_byte_array(pop.data.clone()),
        }
        Ok(())
    }

    /// Count `n` operations against the per-script limit. Multisig charges
    /// one per public key on top of its own opcode.
    pub(crate) fn add_ops(&mut self, n: usize) -> Result<(), InterpreterError> {
        self.num_ops += n;
        if self.num_ops > self.cfg.max_ops() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::TooManyOperations,
                format!("exceeded max operation limit of {}", self.cfg.max_ops()),
            ));
        }
        Ok(())
    }

    pub(crate) fn on_code_separator(&mut self) {
        self.code_start = self.script_off + 1;
    }

    /// Error for an opcode routed to a handler group that does not know it.
    pub(crate) fn unhandled(pop: &ParsedOpcode) -> InterpreterError {
        InterpreterError::new(
            InterpreterErrorCode::InvalidOpcode,
            format!("no handler for opcode {}", pop.name()),
        )
    }
}
