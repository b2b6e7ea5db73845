/// Cryptographic primitives for the txengine workspace.
///
/// - Hash functions committed to by scripts and transactions
///   (SHA-256, SHA-256d, RIPEMD-160, Hash160)
/// - The protocol varint and little-endian wire reader/writer
/// - secp256k1 keys and the canonical ECDSA signature engine
///   (RFC6979 signing, low-S canonicalization, strict DER)

pub mod hash;
pub mod util;
pub mod ec;

mod error;
pub use error::{Component, DerError, PrimitivesError};
