//! Script templates for signing inputs.
//!
//! Provides the `UnlockingScriptTemplate` trait and a P2PKH implementation.

pub mod p2pkh;

use txengine_script::Script;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Something that can produce the unlocking script for an input.
///
/// The `sign` method receives the full transaction and the input index,
/// computes the appropriate signature hash, signs it, and returns the
/// unlocking script. The input's source output must be attached.
pub trait UnlockingScriptTemplate {
    fn sign(&self, tx: &Transaction, input_index: usize) -> Result<Script, TransactionError>;
}
