//! Script verification against a transaction.
//!
//! [`verify_script`] runs the interpreter for one input and folds the
//! outcome into a [`Verification`]: a verdict plus the error that decided
//! it. The typed [`Engine::execute`] is there for callers that want the
//! `Result` directly.

use serde::{Deserialize, Serialize};
use txengine_script::interpreter::{
    Engine, ErrorKind, InterpreterError, InterpreterErrorCode, ScriptFlags,
};
use txengine_script::Script;

use crate::context::TransactionContext;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Outcome of verifying one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub valid: bool,
    /// Empty when valid, otherwise the failing rule in words.
    pub diagnostic: String,
    pub error: Option<InterpreterError>,
}

impl Verification {
    fn success() -> Self {
        Verification {
            valid: true,
            diagnostic: String::new(),
            error: None,
        }
    }

    fn failure(error: InterpreterError) -> Self {
        Verification {
            valid: false,
            diagnostic: format!("{}: {}", error.code, error.description),
            error: Some(error),
        }
    }

    /// The error kind of a failed verification.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(InterpreterError::kind)
    }

    pub fn code(&self) -> Option<InterpreterErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }
}

impl From<Result<(), InterpreterError>> for Verification {
    fn from(result: Result<(), InterpreterError>) -> Self {
        match result {
            Ok(()) => Verification::success(),
            Err(e) => Verification::failure(e),
        }
    }
}

/// Verify that `unlocking` satisfies `locking` for input `input_index` of
/// `tx`, which spends `amount` satoshis, under consensus limits.
pub fn verify_script(
    unlocking: &Script,
    locking: &Script,
    tx: &Transaction,
    input_index: usize,
    flags: ScriptFlags,
    amount: u64,
) -> Verification {
    verify_script_with(&Engine::new(), unlocking, locking, tx, input_index, flags, amount)
}

/// [`verify_script`] with a caller-chosen engine configuration.
pub fn verify_script_with(
    engine: &Engine,
    unlocking: &Script,
    locking: &Script,
    tx: &Transaction,
    input_index: usize,
    flags: ScriptFlags,
    amount: u64,
) -> Verification {
    if input_index >= tx.inputs.len() {
        return Verification::failure(InterpreterError::new(
            InterpreterErrorCode::InvalidIndex,
            format!(
                "input index {} out of range (tx has {} inputs)",
                input_index,
                tx.inputs.len()
            ),
        ));
    }

    let ctx = TransactionContext::new(tx, input_index, amount);
    engine
        .execute(unlocking, locking, flags, Some(&ctx), input_index)
        .into()
}

/// Verify input `input_index` of `tx` with its own unlocking script and the
/// locking script and amount of its attached source output.
pub fn verify_input(
    tx: &Transaction,
    input_index: usize,
    flags: ScriptFlags,
) -> Result<Verification, TransactionError> {
    let input = tx.input(input_index)?;
    let source = input
        .source_output()
        .ok_or(TransactionError::MissingSourceOutput(input_index))?;
    Ok(verify_script(
        &input.unlocking_script,
        &source.locking_script,
        tx,
        input_index,
        flags,
        source.satoshis,
    ))
}
