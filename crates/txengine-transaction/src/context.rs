//! The interpreter's view of a transaction.

use txengine_script::interpreter::{InterpreterError, InterpreterErrorCode, TxContext};

use crate::sighash;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Binds a transaction, the input being verified and the amount that input
/// spends, so signature opcodes can re-derive digests.
#[derive(Debug, Clone, Copy)]
pub struct TransactionContext<'a> {
    tx: &'a Transaction,
    input_index: usize,
    amount: u64,
}

impl<'a> TransactionContext<'a> {
    /// Bind `tx` for verifying one input.
    ///
    /// # Arguments
    /// * `tx` - The spending transaction.
    /// * `input_index` - The input whose scripts are being run.
    /// * `amount` - Satoshis of the output that input spends; the FORKID
    ///   digest commits to it.
    pub fn new(tx: &'a Transaction, input_index: usize, amount: u64) -> Self {
        TransactionContext {
            tx,
            input_index,
            amount,
        }
    }

    /// Bind `tx` using the amount of the input's attached source output.
    ///
    /// # Returns
    /// The context, `InputIndex` when `input_index` is out of range, or
    /// `MissingSourceOutput` when nothing was attached.
    pub fn from_source_output(
        tx: &'a Transaction,
        input_index: usize,
    ) -> Result<Self, TransactionError> {
        let amount = tx
            .input(input_index)?
            .source_satoshis()
            .ok_or(TransactionError::MissingSourceOutput(input_index))?;
        Ok(Self::new(tx, input_index, amount))
    }

    pub fn transaction(&self) -> &'a Transaction {
        self.tx
    }

    /// The only input this context will produce digests for.
    pub fn input_index(&self) -> usize {
        self.input_index
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }
}

impl TxContext for TransactionContext<'_> {
    fn signature_digest(
        &self,
        input_idx: usize,
        script_code: &[u8],
        sighash_flag: u32,
        forkid: bool,
    ) -> Result<[u8; 32], InterpreterError> {
        if input_idx != self.input_index {
            return Err(InterpreterError::new(
                InterpreterErrorCode::InvalidIndex,
                format!(
                    "context is bound to input {}, asked for input {}",
                    self.input_index, input_idx
                ),
            ));
        }

        let digest = if forkid {
            sighash::signature_hash(self.tx, input_idx, script_code, self.amount, sighash_flag)
        } else {
            sighash::legacy_signature_hash(self.tx, input_idx, script_code, sighash_flag)
        };
        digest.map_err(|e| InterpreterError::new(InterpreterErrorCode::InvalidIndex, e.to_string()))
    }

    fn lock_time(&self) -> u32 {
        self.tx.lock_time
    }

    fn tx_version(&self) -> u32 {
        self.tx.version
    }

    fn input_sequence(&self, input_idx: usize) -> Option<u32> {
        self.tx.inputs.get(input_idx).map(|input| input.sequence_number)
    }
}
