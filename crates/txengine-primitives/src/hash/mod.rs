//! Hash functions committed to by transactions and scripts.
//!
//! SHA-256, double SHA-256 (transaction ids and sighash digests),
//! RIPEMD-160 and Hash160 (public key and script hashes).

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256(SHA-256(data)).
///
/// Used for transaction ids, the intermediate preimage hashes
/// (hashPrevouts, hashSequence, hashOutputs) and the final signing digest.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute the RIPEMD-160 digest of `data`.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    let mut output = [0u8; 20];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Compute RIPEMD-160(SHA-256(data)).
///
/// The 20-byte hash embedded in pay-to-public-key-hash and
/// pay-to-script-hash locking scripts.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}
