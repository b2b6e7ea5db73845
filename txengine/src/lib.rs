#![deny(missing_docs)]

//! txengine: canonical ECDSA signatures, the FORKID sighash preimage and a
//! flag-gated script interpreter.
//!
//! Re-exports the workspace crates for single-crate usage.
//!
//! # Example
//!
//! Sign a P2PKH input and verify it under the standard flags:
//!
//! ```
//! use txengine::primitives::ec::PrivateKey;
//! use txengine::script::interpreter::ScriptFlags;
//! use txengine::transaction::template::{p2pkh, UnlockingScriptTemplate};
//! use txengine::transaction::{verify_input, Transaction, TransactionOutput};
//!
//! let key = PrivateKey::from_hex(
//!     "14b2c42482bbc5c76632f1b216421f6cebf27fd7909dbaefc17a5e3bcc4ad30a",
//! )
//! .unwrap();
//! let locking = p2pkh::lock_public_key(&key.pub_key());
//!
//! let mut tx = Transaction::new();
//! tx.add_input_from(&"ab".repeat(32), 0, &locking.to_hex(), 10_000).unwrap();
//! tx.add_output(TransactionOutput::new(9_000, p2pkh::lock(&[0u8; 20])));
//! tx.inputs[0].unlocking_script = p2pkh::unlock(key, None).sign(&tx, 0).unwrap();
//!
//! let verification = verify_input(&tx, 0, ScriptFlags::STANDARD).unwrap();
//! assert!(verification.valid, "{}", verification.diagnostic);
//! ```

pub use txengine_primitives as primitives;
pub use txengine_script as script;
pub use txengine_transaction as transaction;
