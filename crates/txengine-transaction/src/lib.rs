/// Transactions, signature hashing and script verification for txengine.
///
/// Provides the Transaction type and its wire format, the FORKID preimage
/// builder with its zero-field report, the legacy digest, the interpreter's
/// transaction context and the `verify_script` entry point.

pub mod transaction;
pub mod input;
pub mod output;
pub mod sighash;
pub mod context;
pub mod verify;
pub mod template;

mod error;
pub use error::TransactionError;
pub use transaction::Transaction;
pub use input::TransactionInput;
pub use output::TransactionOutput;
pub use context::TransactionContext;
pub use verify::{verify_input, verify_script, verify_script_with, Verification};
