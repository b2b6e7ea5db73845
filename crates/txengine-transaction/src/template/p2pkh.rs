//! Pay-to-Public-Key-Hash (P2PKH) script template.
//!
//! Creates standard P2PKH locking scripts (`OP_DUP OP_HASH160 <hash>
//! OP_EQUALVERIFY OP_CHECKSIG`) and unlocking scripts (`<sig> <pubkey>`).

use txengine_primitives::ec::{PrivateKey, PublicKey};
use txengine_script::opcodes::*;
use txengine_script::Script;

use crate::sighash::SIGHASH_ALL_FORKID;
use crate::template::UnlockingScriptTemplate;
use crate::transaction::Transaction;
use crate::TransactionError;

/// `OP_DUP OP_HASH160 <pubkey_hash> OP_EQUALVERIFY OP_CHECKSIG`.
pub fn lock(pubkey_hash: &[u8; 20]) -> Script {
    let mut bytes = Vec::with_capacity(25);
    bytes.push(OP_DUP);
    bytes.push(OP_HASH160);
    bytes.push(OP_DATA_20);
    bytes.extend_from_slice(pubkey_hash);
    bytes.push(OP_EQUALVERIFY);
    bytes.push(OP_CHECKSIG);
    Script::from_bytes(&bytes)
}

/// P2PKH locking script for the hash160 of the compressed key.
pub fn lock_public_key(pub_key: &PublicKey) -> Script {
    lock(&pub_key.hash160())
}

/// Create a P2PKH unlocker. The sighash flag defaults to
/// `SIGHASH_ALL_FORKID` (0x41).
pub fn unlock(private_key: PrivateKey, sighash_flag: Option<u32>) -> P2PKH {
    P2PKH {
        private_key,
        sighash_flag: sighash_flag.unwrap_or(SIGHASH_ALL_FORKID),
    }
}

/// P2PKH signing template holding a private key and sighash flag.
pub struct P2PKH {
    private_key: PrivateKey,
    sighash_flag: u32,
}

impl P2PKH {
    pub fn sighash_flag(&self) -> u32 {
        self.sighash_flag
    }
}

impl UnlockingScriptTemplate for P2PKH {
    /// Sign the input and build `<DER_sig || sighash_byte> <compressed_pubkey>`.
    ///
    /// Signing is RFC6979 deterministic and always yields a low-S signature.
    fn sign(&self, tx: &Transaction, input_index: usize) -> Result<Script, TransactionError> {
        let sig_hash = tx.calc_input_signature_hash(input_index, self.sighash_flag)?;
        let signature = self
            .private_key
            .sign(&sig_hash)
            .map_err(|e| TransactionError::SigningError(e.to_string()))?;
        let pub_key_bytes = self.private_key.pub_key().to_compressed();

        let der_sig = signature.to_der();
        let mut sig_buf = Vec::with_capacity(der_sig.len() + 1);
        sig_buf.extend_from_slice(&der_sig);
        sig_buf.push(self.sighash_flag as u8);

        let mut script = Script::new();
        script.append_push_data(&sig_buf)?;
        script.append_push_data(&pub_key_bytes)?;
        Ok(script)
    }
}
