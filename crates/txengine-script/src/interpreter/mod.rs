//! Flag-gated script interpreter.
//!
//! Executes an unlocking script followed by a locking script (and, for P2SH,
//! the redeem script) against a stack machine with consensus resource limits.
//!
//! # Architecture
//!
//! Opcode dispatch is driven by a static [`opcode_table::OPCODE_TABLE`]:
//! every byte value maps to a handler category, the flag gate that enables
//! it and its stack arity. Conditional execution lives in an explicit
//! [`branch::BranchStack`], and signature opcodes see the executing script
//! through a read-only [`script_code::ScriptCode`] view.
//!
//! The interpreter does not depend on the transaction crate. Callers provide
//! a [`TxContext`] that computes signature digests and exposes lock-time
//! fields; the interpreter does the DER parsing and curve check itself.
//!
//! # Example
//!
//! ```
//! use txengine_script::interpreter::{Engine, ScriptFlags};
//! use txengine_script::opcodes::*;
//! use txengine_script::Script;
//!
//! let unlock = Script::from_bytes(&[OP_2, OP_3]);
//! let lock = Script::from_bytes(&[OP_ADD, OP_5, OP_EQUAL]);
//! Engine::new()
//!     .execute(&unlock, &lock, ScriptFlags::STANDARD, None, 0)
//!     .unwrap();
//! ```

pub mod branch;
pub mod config;
pub mod error;
pub mod flags;
pub mod opcode_table;
pub mod parsed_opcode;
pub mod script_code;
pub mod scriptnum;
pub mod stack;
pub mod thread;

mod ops_arithmetic;
mod ops_crypto;
mod ops_data;
mod ops_flow;
mod ops_locktime;
mod ops_stack;

pub use config::Config;
pub use error::{ErrorKind, InterpreterError, InterpreterErrorCode};
pub use flags::ScriptFlags;
pub use opcode_table::{Gate, OpcodeCategory, OpcodeInfo, OPCODE_TABLE};
pub use parsed_opcode::{ParsedOpcode, ParsedScript};
pub use scriptnum::ScriptNumber;
pub use stack::Stack;

use log::debug;

use crate::Script;
use thread::Thread;

/// Transaction data the interpreter needs for signature and lock-time opcodes.
pub trait TxContext {
    /// Digest a signature over input `input_idx` commits to.
    ///
    /// `script_code` is already reduced to the signed portion (and, for
    /// legacy digests, stripped of the signatures being checked).
    /// `forkid` selects the FORKID preimage over the legacy one.
    fn signature_digest(
        &self,
        input_idx: usize,
        script_code: &[u8],
        sighash_flag: u32,
        forkid: bool,
    ) -> Result<[u8; 32], InterpreterError>;

    fn lock_time(&self) -> u32;

    fn tx_version(&self) -> u32;

    /// Sequence number of the input, `None` when the index is out of range.
    fn input_sequence(&self, input_idx: usize) -> Option<u32>;
}

/// The script execution engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    config: Config,
}

impl Engine {
    /// An engine enforcing the consensus limits.
    pub fn new() -> Self {
        Engine {
            config: Config::consensus(),
        }
    }

    pub fn with_config(config: Config) -> Self {
        Engine { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute unlocking + locking scripts.
    ///
    /// # Arguments
    /// * `unlocking_script` - The input's unlocking (signature) script.
    /// * `locking_script` - The output's locking (pubkey) script.
    /// * `flags` - Verification flags.
    /// * `tx_context` - Transaction context, needed only by signature and
    ///   lock-time opcodes.
    /// * `input_idx` - The input index being verified.
    pub fn execute(
        &self,
        unlocking_script: &Script,
        locking_script: &Script,
        flags: ScriptFlags,
        tx_context: Option<&dyn TxContext>,
        input_idx: usize,
    ) -> Result<(), InterpreterError> {
        debug!(
            "verifying input {} ({} + {} script bytes, flags 0x{:x})",
            input_idx,
            unlocking_script.len(),
            locking_script.len(),
            flags.0
        );
        let result = Thread::new(self.config, flags, tx_context, input_idx)
            .and_then(|mut thread| thread.verify(unlocking_script, locking_script));
        match &result {
            Ok(()) => debug!("input {} verified", input_idx),
            Err(e) => debug!("input {} failed: {:?} ({})", input_idx, e.code, e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::*;
    use txengine_primitives::ec::signature::CURVE_ORDER;
    use txengine_primitives::ec::{PrivateKey, Signature};
    use txengine_primitives::hash::{hash160, sha256d};

    fn run(unlock: &[u8], lock: &[u8], flags: ScriptFlags) -> Result<(), InterpreterError> {
        Engine::new().execute(
            &Script::from_bytes(unlock),
            &Script::from_bytes(lock),
            flags,
            None,
            0,
        )
    }

    fn code_of(result: Result<(), InterpreterError>) -> InterpreterErrorCode {
        result.expect_err("script should fail").code
    }

    fn push(data: &[u8]) -> Vec<u8> {
        let mut s = Script::new();
        s.append_push_data(data).unwrap();
        s.to_bytes().to_vec()
    }

    const EXT_A: ScriptFlags = ScriptFlags::ENABLE_EXTENDED_OPS_A;
    const EXT_B: ScriptFlags = ScriptFlags::ENABLE_EXTENDED_OPS_B;

    #[test]
    fn test_op_1_op_1_op_equal() {
        assert!(run(&[OP_1], &[OP_1, OP_EQUAL], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_1_op_2_op_equal_fails() {
        let err = run(&[OP_1], &[OP_2, OP_EQUAL], ScriptFlags::NONE).unwrap_err();
        assert_eq!(err.code, InterpreterErrorCode::EvalFalse);
        assert_eq!(err.kind(), ErrorKind::ScriptFailure);
    }

    #[test]
    fn test_arithmetic() {
        let cases: Vec<(&[u8], &[u8])> = vec![
            (&[OP_2, OP_3], &[OP_ADD, OP_5, OP_EQUAL]),
            (&[OP_5, OP_3], &[OP_SUB, OP_2, OP_EQUAL]),
            (&[OP_1], &[OP_NEGATE, OP_1NEGATE, OP_EQUAL]),
            (&[OP_1NEGATE], &[OP_ABS, OP_1, OP_EQUAL]),
            (&[OP_0], &[OP_NOT]),
            (&[OP_3, OP_2, OP_5], &[OP_WITHIN]),
            (&[OP_1, OP_1], &[OP_BOOLAND]),
            (&[OP_1, OP_0], &[OP_BOOLAND, OP_NOT]),
            (&[OP_5, OP_5], &[OP_NUMEQUAL]),
            (&[OP_3, OP_5], &[OP_LESSTHAN]),
            (&[OP_5, OP_3], &[OP_GREATERTHAN]),
            (&[OP_3, OP_5], &[OP_MIN, OP_3, OP_EQUAL]),
            (&[OP_3, OP_5], &[OP_MAX, OP_5, OP_EQUAL]),
            (&[OP_16], &[OP_1ADD, OP_DATA_1, 17, OP_EQUAL]),
        ];
        for (unlock, lock) in cases {
            let result = run(unlock, lock, ScriptFlags::STANDARD);
            assert!(result.is_ok(), "{:02x?} / {:02x?}: {:?}", unlock, lock, result.err());
        }
    }

    #[test]
    fn test_extended_arithmetic() {
        assert!(run(&[OP_3, OP_4], &[OP_MUL, OP_12, OP_EQUAL], EXT_B).is_ok());
        assert!(run(&[OP_6, OP_3], &[OP_DIV, OP_2, OP_EQUAL], EXT_A).is_ok());
        assert!(run(&[OP_7, OP_3], &[OP_MOD, OP_1, OP_EQUAL], EXT_A).is_ok());
        assert_eq!(
            code_of(run(&[OP_6, OP_0], &[OP_DIV], EXT_A)),
            InterpreterErrorCode::DivideByZero
        );
        assert!(run(&[OP_DATA_1, 0x01, OP_1], &[OP_LSHIFT, OP_DATA_1, 0x02, OP_EQUAL], EXT_B).is_ok());
        assert!(run(&[OP_DATA_1, 0x02, OP_1], &[OP_RSHIFT, OP_DATA_1, 0x01, OP_EQUAL], EXT_B).is_ok());
    }

    #[test]
    fn test_op_dup_hash160_equalverify() {
        let pubkey = vec![0x04; 33];
        let mut lock = vec![OP_DUP, OP_HASH160];
        lock.extend(push(&hash160(&pubkey)));
        lock.push(OP_EQUALVERIFY);
        lock.push(OP_1);

        let result = run(&push(&pubkey), &lock, ScriptFlags::NONE);
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn test_conditionals() {
        assert!(run(&[], &[OP_1, OP_IF, OP_2, OP_ELSE, OP_0, OP_ENDIF], ScriptFlags::NONE).is_ok());
        assert!(run(&[], &[OP_0, OP_NOTIF, OP_1, OP_ELSE, OP_0, OP_ENDIF], ScriptFlags::NONE).is_ok());
        assert!(run(&[], &[OP_1, OP_IF, OP_1, OP_IF, OP_2, OP_ENDIF, OP_ENDIF], ScriptFlags::NONE).is_ok());
        assert!(run(
            &[],
            &[OP_0, OP_IF, OP_1, OP_IF, OP_RETURN, OP_ELSE, OP_RETURN, OP_ENDIF, OP_ELSE, OP_1, OP_ENDIF],
            ScriptFlags::NONE
        )
        .is_ok());
    }

    #[test]
    fn test_unbalanced_conditionals() {
        for lock in [
            vec![OP_IF],
            vec![OP_ENDIF],
            vec![OP_ELSE],
            vec![OP_1, OP_IF, OP_ELSE, OP_ELSE, OP_ENDIF],
            vec![OP_0, OP_IF, OP_1, OP_IF],
        ] {
            let err = run(&[OP_1], &lock, ScriptFlags::NONE).unwrap_err();
            assert_eq!(err.code, InterpreterErrorCode::UnbalancedConditional, "{:02x?}", lock);
            assert_eq!(err.kind(), ErrorKind::MalformedScript);
        }
    }

    #[test]
    fn test_op_return_fails() {
        assert_eq!(
            code_of(run(&[OP_1], &[OP_RETURN], ScriptFlags::NONE)),
            InterpreterErrorCode::EarlyReturn
        );
        assert_eq!(
            code_of(run(&[OP_1], &[OP_1, OP_RETURN, 0x01, 0x02], ScriptFlags::NONE)),
            InterpreterErrorCode::EarlyReturn
        );
        // An unexecuted OP_RETURN is harmless.
        assert!(run(&[OP_1], &[OP_0, OP_IF, OP_RETURN, OP_ENDIF], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_stack_ops() {
        let cases: Vec<(&[u8], &[u8])> = vec![
            (&[OP_1, OP_2, OP_3], &[OP_DEPTH, OP_3, OP_EQUAL]),
            (&[0x03, 0xaa, 0xbb, 0xcc], &[OP_SIZE, OP_3, OP_EQUALVERIFY, OP_1]),
            (
                &[OP_1, OP_2, OP_3, OP_2],
                &[OP_PICK, OP_1, OP_EQUALVERIFY, OP_3, OP_EQUALVERIFY, OP_2, OP_EQUALVERIFY, OP_1],
            ),
            (
                &[OP_1, OP_2, OP_3, OP_2],
                &[OP_ROLL, OP_1, OP_EQUALVERIFY, OP_3, OP_EQUALVERIFY, OP_2, OP_EQUAL],
            ),
            (&[OP_5], &[OP_TOALTSTACK, OP_FROMALTSTACK, OP_5, OP_EQUAL]),
            (
                &[OP_1, OP_2, OP_3],
                &[OP_ROT, OP_1, OP_EQUALVERIFY, OP_3, OP_EQUALVERIFY, OP_2, OP_EQUAL],
            ),
            (
                &[OP_1, OP_2],
                &[OP_TUCK, OP_2, OP_EQUALVERIFY, OP_1, OP_EQUALVERIFY, OP_2, OP_EQUAL],
            ),
            (
                &[OP_1, OP_2],
                &[
                    OP_2DUP, OP_2, OP_EQUALVERIFY, OP_1, OP_EQUALVERIFY, OP_2, OP_EQUALVERIFY,
                    OP_1, OP_EQUAL,
                ],
            ),
            (&[OP_1], &[OP_IFDUP, OP_EQUAL]),
            (&[OP_1, OP_2], &[OP_NIP, OP_2, OP_EQUAL]),
        ];
        for (unlock, lock) in cases {
            let result = run(unlock, lock, ScriptFlags::NONE);
            assert!(result.is_ok(), "{:02x?} / {:02x?}: {:?}", unlock, lock, result.err());
        }
    }

    #[test]
    fn test_arity_underflow() {
        assert_eq!(
            code_of(run(&[OP_1], &[OP_ADD], ScriptFlags::NONE)),
            InterpreterErrorCode::InvalidStackOperation
        );
        assert_eq!(
            code_of(run(&[OP_1], &[OP_FROMALTSTACK], ScriptFlags::NONE)),
            InterpreterErrorCode::InvalidStackOperation
        );
        assert_eq!(
            code_of(run(&[OP_1, OP_5], &[OP_PICK], ScriptFlags::NONE)),
            InterpreterErrorCode::InvalidStackOperation
        );
    }

    #[test]
    fn test_splice_and_bitwise() {
        assert!(run(&[0x01, 0xaa, 0x01, 0xbb], &[OP_CAT, 0x02, 0xaa, 0xbb, OP_EQUAL], EXT_A).is_ok());
        assert!(run(
            &[0x02, 0xaa, 0xbb, OP_1],
            &[OP_SPLIT, 0x01, 0xbb, OP_EQUALVERIFY, 0x01, 0xaa, OP_EQUAL],
            EXT_A
        )
        .is_ok());
        assert_eq!(
            code_of(run(&[0x02, 0xaa, 0xbb, OP_3], &[OP_SPLIT], EXT_A)),
            InterpreterErrorCode::InvalidSplitRange
        );
        assert!(run(&[OP_1, OP_4], &[OP_NUM2BIN, 0x04, 0x01, 0x00, 0x00, 0x00, OP_EQUAL], EXT_A).is_ok());
        assert!(run(&[0x04, 0x01, 0x00, 0x00, 0x00], &[OP_BIN2NUM, OP_1, OP_EQUAL], EXT_A).is_ok());
        assert!(run(&[0x01, 0x00], &[OP_INVERT, 0x01, 0xff, OP_EQUAL], EXT_B).is_ok());
        assert!(run(&[0x01, 0xff, 0x01, 0x0f], &[OP_AND, 0x01, 0x0f, OP_EQUAL], EXT_A).is_ok());
        assert!(run(&[0x01, 0xf0, 0x01, 0x0f], &[OP_OR, 0x01, 0xff, OP_EQUAL], EXT_A).is_ok());
        assert!(run(&[0x01, 0xff, 0x01, 0xff], &[OP_XOR, 0x01, 0x00, OP_EQUAL], EXT_A).is_ok());
        assert_eq!(
            code_of(run(&[0x01, 0xff, 0x02, 0xff, 0xff], &[OP_AND], EXT_A)),
            InterpreterErrorCode::InvalidInputLength
        );
    }

    #[test]
    fn test_hash_ops() {
        assert!(run(&[OP_0], &[OP_SHA256, OP_SIZE, 0x01, 0x20, OP_EQUALVERIFY, OP_1], ScriptFlags::NONE).is_ok());
        assert!(run(&[OP_0], &[OP_SHA1, OP_SIZE, 0x01, 0x14, OP_EQUALVERIFY, OP_1], ScriptFlags::NONE).is_ok());
        assert!(run(&[OP_0], &[OP_RIPEMD160, OP_SIZE, 0x01, 0x14, OP_EQUALVERIFY, OP_1], ScriptFlags::NONE).is_ok());

        let mut lock = vec![OP_HASH256];
        lock.extend(push(&sha256d(&[])));
        lock.push(OP_EQUAL);
        assert!(run(&[OP_0], &lock, ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_disabled_opcodes_fail_under_every_flag() {
        let mut flag_sets: Vec<ScriptFlags> = ScriptFlags::ALL.to_vec();
        flag_sets.push(ScriptFlags::NONE);
        flag_sets.push(ScriptFlags::STANDARD | EXT_A | EXT_B);

        for op in [OP_2MUL, OP_2DIV] {
            for &flags in &flag_sets {
                let mut flags = flags;
                if flags.has_flag(ScriptFlags::VERIFY_CLEAN_STACK) {
                    flags.add_flag(ScriptFlags::P2SH);
                }
                for lock in [vec![op, OP_1], vec![OP_0, OP_IF, op, OP_ENDIF, OP_1]] {
                    let err = run(&[OP_1], &lock, flags).unwrap_err();
                    assert_eq!(err.code, InterpreterErrorCode::DisabledOpcode, "flags 0x{:x}", flags.0);
                    assert_eq!(err.kind(), ErrorKind::DisabledOpcode);
                }
            }
        }
    }

    #[test]
    fn test_extended_opcodes_are_gated() {
        let gated_a = [OP_CAT, OP_SPLIT, OP_NUM2BIN, OP_BIN2NUM, OP_AND, OP_OR, OP_XOR, OP_DIV, OP_MOD];
        let gated_b = [OP_INVERT, OP_MUL, OP_LSHIFT, OP_RSHIFT];

        for (ops, flag) in [(&gated_a[..], EXT_A), (&gated_b[..], EXT_B)] {
            for &op in ops {
                // Fails even in an unexecuted branch while the flag is off.
                let lock = [OP_0, OP_IF, op, OP_ENDIF, OP_1];
                let err = run(&[], &lock, ScriptFlags::STANDARD).unwrap_err();
                assert_eq!(err.code, InterpreterErrorCode::OpcodeNotEnabled);
                assert_eq!(err.kind(), ErrorKind::DisabledOpcode);

                assert!(run(&[], &lock, ScriptFlags::STANDARD | flag).is_ok());
            }
        }
    }

    #[test]
    fn test_unknown_and_reserved_opcodes() {
        // Unknown opcodes only fail when executed.
        assert!(run(&[OP_1], &[OP_0, OP_IF, 0xba, OP_ENDIF], ScriptFlags::NONE).is_ok());
        assert!(run(&[OP_1], &[OP_0, OP_IF, OP_INVALIDOPCODE, OP_ENDIF], ScriptFlags::NONE).is_ok());
        let err = run(&[OP_1], &[0xba], ScriptFlags::NONE).unwrap_err();
        assert_eq!(err.code, InterpreterErrorCode::InvalidOpcode);
        assert_eq!(err.kind(), ErrorKind::MalformedScript);

        // Reserved opcodes likewise, except VERIF and VERNOTIF.
        assert!(run(&[OP_1], &[OP_0, OP_IF, OP_RESERVED, OP_VER, OP_ENDIF], ScriptFlags::NONE).is_ok());
        assert_eq!(
            code_of(run(&[OP_1], &[OP_RESERVED], ScriptFlags::NONE)),
            InterpreterErrorCode::ReservedOpcode
        );
        for op in [OP_VERIF, OP_VERNOTIF] {
            assert_eq!(
                code_of(run(&[OP_1], &[OP_0, OP_IF, op, OP_ENDIF], ScriptFlags::NONE)),
                InterpreterErrorCode::ReservedOpcode
            );
        }
    }

    #[test]
    fn test_upgradable_nops() {
        assert!(run(&[OP_1], &[OP_NOP1, OP_NOP10], ScriptFlags::NONE).is_ok());
        assert_eq!(
            code_of(run(&[OP_1], &[OP_NOP5], ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS)),
            InterpreterErrorCode::DiscourageUpgradableNops
        );
        assert!(run(&[OP_1], &[OP_NOP], ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS).is_ok());
        // Lock-time opcodes without their flag are NOPs.
        assert!(run(&[OP_1], &[OP_CHECKLOCKTIMEVERIFY], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_operation_limit() {
        let mut lock = vec![OP_NOP; 201];
        lock.push(OP_1);
        assert!(run(&[], &lock, ScriptFlags::NONE).is_ok());

        lock.insert(0, OP_NOP);
        let err = run(&[], &lock, ScriptFlags::NONE).unwrap_err();
        assert_eq!(err.code, InterpreterErrorCode::TooManyOperations);
        assert_eq!(err.kind(), ErrorKind::ResourceLimitExceeded);

        // Push opcodes are free, unexecuted non-push opcodes still count.
        let engine = Engine::with_config(Config::consensus().with_max_ops(2));
        let unlock = Script::from_bytes(&[OP_1, OP_2, OP_3]);
        assert!(engine
            .execute(&unlock, &Script::from_bytes(&[OP_DROP, OP_DROP]), ScriptFlags::NONE, None, 0)
            .is_ok());
        let lock = Script::from_bytes(&[OP_0, OP_IF, OP_NOP, OP_NOP, OP_ENDIF]);
        assert_eq!(
            code_of(engine.execute(&unlock, &lock, ScriptFlags::NONE, None, 0)),
            InterpreterErrorCode::TooManyOperations
        );
    }

    #[test]
    fn test_resource_limits() {
        let engine = Engine::with_config(Config::consensus().with_max_stack_size(2));
        let result = engine.execute(
            &Script::from_bytes(&[OP_1, OP_1, OP_1]),
            &Script::from_bytes(&[OP_1]),
            ScriptFlags::NONE,
            None,
            0,
        );
        assert_eq!(code_of(result), InterpreterErrorCode::StackOverflow);

        let big = push(&[0xaa; 521]);
        assert_eq!(
            code_of(run(&big, &[OP_DROP, OP_1], ScriptFlags::NONE)),
            InterpreterErrorCode::ElementTooBig
        );
        assert!(run(&push(&[0xaa; 520]), &[OP_DROP, OP_1], ScriptFlags::NONE).is_ok());

        let huge = vec![OP_NOP; 10_001];
        assert_eq!(
            code_of(run(&[OP_1], &huge, ScriptFlags::NONE)),
            InterpreterErrorCode::ScriptTooBig
        );

        assert_eq!(
            code_of(run(&[0x05, 1, 2, 3, 4, 5], &[OP_1ADD], ScriptFlags::NONE)),
            InterpreterErrorCode::NumberTooBig
        );
        assert_eq!(
            code_of(run(&[0x02, 0xaa], &[OP_1], ScriptFlags::NONE)),
            InterpreterErrorCode::MalformedPush
        );
    }

    #[test]
    fn test_relaxed_config_accepts_large_numbers() {
        let engine = Engine::with_config(Config::relaxed());
        let result = engine.execute(
            &Script::from_bytes(&[0x05, 1, 2, 3, 4, 5]),
            &Script::from_bytes(&[OP_1ADD]),
            ScriptFlags::NONE,
            None,
            0,
        );
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn test_minimal_encoding_flags() {
        assert_eq!(
            code_of(run(&[0x01, 0x05], &[OP_5, OP_EQUAL], ScriptFlags::VERIFY_MINIMAL_DATA)),
            InterpreterErrorCode::MinimalData
        );
        assert!(run(&[0x01, 0x05], &[OP_5, OP_EQUAL], ScriptFlags::NONE).is_ok());
        assert_eq!(
            code_of(run(&[0x01, 0x02], &[OP_IF, OP_1, OP_ENDIF], ScriptFlags::VERIFY_MINIMAL_IF)),
            InterpreterErrorCode::MinimalIf
        );
        assert!(run(&[0x01, 0x02], &[OP_IF, OP_1, OP_ENDIF], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_empty_both_scripts() {
        assert_eq!(code_of(run(&[], &[], ScriptFlags::NONE)), InterpreterErrorCode::EvalFalse);
    }

    #[test]
    fn test_op_verify_fail() {
        assert_eq!(code_of(run(&[OP_0], &[OP_VERIFY], ScriptFlags::NONE)), InterpreterErrorCode::Verify);
    }

    #[test]
    fn test_clean_stack() {
        let err = run(&[OP_1], &[OP_1], ScriptFlags::VERIFY_CLEAN_STACK).unwrap_err();
        assert_eq!(err.code, InterpreterErrorCode::InvalidFlags);
        assert_eq!(err.kind(), ErrorKind::InvalidFlags);

        let flags = ScriptFlags::VERIFY_CLEAN_STACK | ScriptFlags::P2SH;
        assert_eq!(code_of(run(&[OP_1], &[OP_1], flags)), InterpreterErrorCode::CleanStack);
        assert!(run(&[], &[OP_1], flags).is_ok());
    }

    #[test]
    fn test_sig_push_only() {
        assert_eq!(
            code_of(run(&[OP_1, OP_DUP], &[OP_EQUAL], ScriptFlags::VERIFY_SIG_PUSH_ONLY)),
            InterpreterErrorCode::NotPushOnly
        );
        assert!(run(&[OP_1, OP_DUP], &[OP_EQUAL], ScriptFlags::NONE).is_ok());
    }

    fn p2sh_lock(redeem: &[u8]) -> Vec<u8> {
        let mut lock = vec![OP_HASH160];
        lock.extend(push(&hash160(redeem)));
        lock.push(OP_EQUAL);
        lock
    }

    #[test]
    fn test_p2sh() {
        let redeem = [OP_2, OP_EQUAL];
        let mut unlock = vec![OP_2];
        unlock.extend(push(&redeem));
        assert!(run(&unlock, &p2sh_lock(&redeem), ScriptFlags::P2SH).is_ok());

        // A redeem script that fails only matters when P2SH is on.
        let redeem = [OP_3, OP_EQUAL];
        let mut unlock = vec![OP_2];
        unlock.extend(push(&redeem));
        assert!(run(&unlock, &p2sh_lock(&redeem), ScriptFlags::NONE).is_ok());
        assert_eq!(
            code_of(run(&unlock, &p2sh_lock(&redeem), ScriptFlags::P2SH)),
            InterpreterErrorCode::EvalFalse
        );

        let mut unlock = vec![OP_2, OP_NOP];
        unlock.extend(push(&[OP_2, OP_EQUAL]));
        assert_eq!(
            code_of(run(&unlock, &p2sh_lock(&[OP_2, OP_EQUAL]), ScriptFlags::P2SH)),
            InterpreterErrorCode::NotPushOnly
        );
    }

    #[test]
    fn test_missing_tx_context() {
        let err = run(&[OP_0, OP_0], &[OP_CHECKSIG], ScriptFlags::NONE).unwrap_err();
        assert_eq!(err.code, InterpreterErrorCode::MissingTxContext);
        assert_eq!(err.kind(), ErrorKind::InvalidFlags);
    }

    /// Digest over the script code, sighash and mode, enough to tell
    /// different commitments apart.
    struct MockContext {
        lock_time: u32,
        version: u32,
        sequence: u32,
    }

    impl Default for MockContext {
        fn default() -> Self {
            MockContext {
                lock_time: 0,
                version: 1,
                sequence: 0xffff_fffe,
            }
        }
    }

    impl MockContext {
        fn digest(script_code: &[u8], sighash_flag: u32, forkid: bool) -> [u8; 32] {
            let mut data = script_code.to_vec();
            data.extend_from_slice(&sighash_flag.to_le_bytes());
            data.push(forkid as u8);
            sha256d(&data)
        }
    }

    impl TxContext for MockContext {
        fn signature_digest(
            &self,
            input_idx: usize,
            script_code: &[u8],
            sighash_flag: u32,
            forkid: bool,
        ) -> Result<[u8; 32], InterpreterError> {
            if input_idx != 0 {
                return Err(InterpreterError::new(InterpreterErrorCode::InvalidIndex, "bad input"));
            }
            Ok(Self::digest(script_code, sighash_flag, forkid))
        }

        fn lock_time(&self) -> u32 {
            self.lock_time
        }

        fn tx_version(&self) -> u32 {
            self.version
        }

        fn input_sequence(&self, input_idx: usize) -> Option<u32> {
            (input_idx == 0).then_some(self.sequence)
        }
    }

    fn key(b: u8) -> PrivateKey {
        PrivateKey::from_bytes(&[b; 32]).unwrap()
    }

    fn sign(key: &PrivateKey, script_code: &[u8], shf: u8, forkid: bool) -> Vec<u8> {
        let digest = MockContext::digest(script_code, shf as u32, forkid);
        let mut sig = key.sign(&digest).unwrap().to_der();
        sig.push(shf);
        sig
    }

    fn exec_with(
        ctx: &MockContext,
        unlock: &[u8],
        lock: &[u8],
        flags: ScriptFlags,
    ) -> Result<(), InterpreterError> {
        Engine::new().execute(
            &Script::from_bytes(unlock),
            &Script::from_bytes(lock),
            flags,
            Some(ctx),
            0,
        )
    }

    fn p2pk_lock(key: &PrivateKey) -> Vec<u8> {
        let mut lock = push(&key.pub_key().to_compressed());
        lock.push(OP_CHECKSIG);
        lock
    }

    #[test]
    fn test_checksig_legacy_and_forkid() {
        let ctx = MockContext::default();
        let k = key(0x11);
        let lock = p2pk_lock(&k);

        let sig = sign(&k, &lock, 0x01, false);
        assert!(exec_with(&ctx, &push(&sig), &lock, ScriptFlags::NONE).is_ok());
        assert!(exec_with(&ctx, &push(&sig), &lock, ScriptFlags::STRICT_ENCODING).is_ok());
        assert_eq!(
            code_of(exec_with(&ctx, &push(&sig), &lock, ScriptFlags::ENABLE_SIGHASH_FORKID)),
            InterpreterErrorCode::IllegalForkId
        );

        let sig = sign(&k, &lock, 0x41, true);
        assert!(exec_with(&ctx, &push(&sig), &lock, ScriptFlags::ENABLE_SIGHASH_FORKID).is_ok());
        // Without the flag the same bytes are checked against the legacy digest.
        assert_eq!(
            code_of(exec_with(&ctx, &push(&sig), &lock, ScriptFlags::NONE)),
            InterpreterErrorCode::EvalFalse
        );
    }

    #[test]
    fn test_checksig_failure_modes() {
        let ctx = MockContext::default();
        let k = key(0x11);
        let lock = p2pk_lock(&k);

        let wrong = sign(&k, b"something else", 0x01, false);
        assert_eq!(
            code_of(exec_with(&ctx, &push(&wrong), &lock, ScriptFlags::NONE)),
            InterpreterErrorCode::EvalFalse
        );
        assert_eq!(
            code_of(exec_with(&ctx, &push(&wrong), &lock, ScriptFlags::VERIFY_NULL_FAIL)),
            InterpreterErrorCode::NullFail
        );
        // An empty signature is a clean false.
        assert_eq!(
            code_of(exec_with(&ctx, &[OP_0], &lock, ScriptFlags::VERIFY_NULL_FAIL)),
            InterpreterErrorCode::EvalFalse
        );

        let mut garbage = vec![0x30, 0x01, 0x02];
        garbage.push(0x01);
        assert_eq!(
            code_of(exec_with(&ctx, &push(&garbage), &lock, ScriptFlags::NONE)),
            InterpreterErrorCode::EvalFalse
        );
        let err = exec_with(&ctx, &push(&garbage), &lock, ScriptFlags::VERIFY_DER_SIGNATURES).unwrap_err();
        assert_eq!(err.code, InterpreterErrorCode::SigTooShort);
        assert_eq!(err.kind(), ErrorKind::MalformedSignature);

        let sig = sign(&k, &lock, 0x04, false);
        assert_eq!(
            code_of(exec_with(&ctx, &push(&sig), &lock, ScriptFlags::STRICT_ENCODING)),
            InterpreterErrorCode::InvalidSigHashType
        );
    }

    fn negate(s: &[u8; 32]) -> [u8; 32] {
        let mut out = [0u8; 32];
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let mut d = CURVE_ORDER[i] as i16 - s[i] as i16 - borrow;
            borrow = 0;
            if d < 0 {
                d += 256;
                borrow = 1;
            }
            out[i] = d as u8;
        }
        out
    }

    #[test]
    fn test_high_s_rejected_only_under_low_s() {
        let ctx = MockContext::default();
        let k = key(0x22);
        let lock = p2pk_lock(&k);
        let digest = MockContext::digest(&lock, 0x01, false);
        let low = k.sign(&digest).unwrap();
        let high = Signature::new(*low.r(), negate(low.s()));
        let mut full = high.to_der();
        full.push(0x01);

        assert!(exec_with(&ctx, &push(&full), &lock, ScriptFlags::NONE).is_ok());
        assert_eq!(
            code_of(exec_with(&ctx, &push(&full), &lock, ScriptFlags::VERIFY_LOW_S)),
            InterpreterErrorCode::SigHighS
        );
    }

    #[test]
    fn test_code_separator_limits_signed_script() {
        let ctx = MockContext::default();
        let k = key(0x33);
        let tail = p2pk_lock(&k);
        let mut lock = vec![OP_CODESEPARATOR];
        lock.extend_from_slice(&tail);

        let sig = sign(&k, &tail, 0x01, false);
        assert!(exec_with(&ctx, &push(&sig), &lock, ScriptFlags::NONE).is_ok());

        let sig = sign(&k, &lock, 0x01, false);
        assert_eq!(
            code_of(exec_with(&ctx, &push(&sig), &lock, ScriptFlags::NONE)),
            InterpreterErrorCode::EvalFalse
        );
    }

    #[test]
    fn test_checkmultisig() {
        let ctx = MockContext::default();
        let (k1, k2) = (key(0x44), key(0x55));
        let mut lock = vec![OP_1];
        lock.extend(push(&k1.pub_key().to_compressed()));
        lock.extend(push(&k2.pub_key().to_compressed()));
        lock.extend([OP_2, OP_CHECKMULTISIG]);

        for k in [&k1, &k2] {
            let mut unlock = vec![OP_0];
            unlock.extend(push(&sign(k, &lock, 0x01, false)));
            let result = exec_with(&ctx, &unlock, &lock, ScriptFlags::VERIFY_NULL_DUMMY);
            assert!(result.is_ok(), "{:?}", result.err());
        }

        let mut unlock = vec![OP_1];
        unlock.extend(push(&sign(&k1, &lock, 0x01, false)));
        assert_eq!(
            code_of(exec_with(&ctx, &unlock, &lock, ScriptFlags::VERIFY_NULL_DUMMY)),
            InterpreterErrorCode::SigNullDummy
        );
        assert!(exec_with(&ctx, &unlock, &lock, ScriptFlags::NONE).is_ok());

        let mut unlock = vec![OP_0];
        unlock.extend(push(&sign(&key(0x66), &lock, 0x01, false)));
        assert_eq!(
            code_of(exec_with(&ctx, &unlock, &lock, ScriptFlags::NONE)),
            InterpreterErrorCode::EvalFalse
        );

        assert_eq!(
            code_of(exec_with(&ctx, &[OP_0, OP_0], &[OP_1, OP_DATA_1, 21, OP_CHECKMULTISIG], ScriptFlags::NONE)),
            InterpreterErrorCode::InvalidPubKeyCount
        );
    }

    #[test]
    fn test_lock_time_opcodes() {
        let ctx = MockContext {
            lock_time: 100,
            version: 2,
            sequence: 10,
        };
        let cltv = ScriptFlags::VERIFY_CHECKLOCKTIMEVERIFY;
        let csv = ScriptFlags::VERIFY_CHECKSEQUENCEVERIFY;

        assert!(exec_with(&ctx, &[OP_DATA_1, 50], &[OP_CHECKLOCKTIMEVERIFY], cltv).is_ok());
        assert_eq!(
            code_of(exec_with(&ctx, &[OP_DATA_1, 101], &[OP_CHECKLOCKTIMEVERIFY], cltv)),
            InterpreterErrorCode::UnsatisfiedLockTime
        );
        assert_eq!(
            code_of(exec_with(&ctx, &[OP_1NEGATE], &[OP_CHECKLOCKTIMEVERIFY], cltv)),
            InterpreterErrorCode::NegativeLockTime
        );

        assert!(exec_with(&ctx, &[OP_5], &[OP_CHECKSEQUENCEVERIFY], csv).is_ok());
        assert_eq!(
            code_of(exec_with(&ctx, &[OP_11], &[OP_CHECKSEQUENCEVERIFY], csv)),
            InterpreterErrorCode::UnsatisfiedLockTime
        );

        let v1 = MockContext {
            version: 1,
            ..MockContext::default()
        };
        assert_eq!(
            code_of(exec_with(&v1, &[OP_5], &[OP_CHECKSEQUENCEVERIFY], csv)),
            InterpreterErrorCode::UnsatisfiedLockTime
        );
    }

    #[test]
    fn test_opcode_table_is_public() {
        assert_eq!(OPCODE_TABLE[OP_CAT as usize].gate, Gate::ExtendedA);
        assert_eq!(OPCODE_TABLE[OP_2MUL as usize].category, OpcodeCategory::Disabled);
    }
}
