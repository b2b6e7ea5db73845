/// secp256k1 keys and the canonical ECDSA signature engine.

pub mod private_key;
pub mod public_key;
pub mod signature;

pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use signature::{check_der_encoding, Signature};
