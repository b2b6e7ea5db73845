//! secp256k1 public keys in SEC1 form.

use k256::ecdsa::VerifyingKey;
use std::fmt;

use crate::ec::signature::Signature;
use crate::hash::hash160;
use crate::PrimitivesError;

/// Length of a compressed public key (prefix + x).
pub const COMPRESSED_LEN: usize = 33;

/// Length of an uncompressed public key (prefix + x + y).
pub const UNCOMPRESSED_LEN: usize = 65;

/// A secp256k1 public key.
///
/// Wraps a k256 `VerifyingKey`. Parsing accepts compressed (`02`/`03`) and
/// uncompressed (`04`) SEC1 encodings and rejects points off the curve.
#[derive(Clone, Debug)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    /// Parse a SEC1-encoded public key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.is_empty() {
            return Err(PrimitivesError::InvalidPublicKey(
                "public key is empty".to_string(),
            ));
        }
        let vk = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| PrimitivesError::InvalidPublicKey(e.to_string()))?;
        Ok(PublicKey { inner: vk })
    }

    /// Parse a hex-encoded SEC1 public key.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }

    /// Compressed SEC1 encoding (33 bytes).
    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Uncompressed SEC1 encoding (65 bytes).
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Compressed encoding as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// Hash160 of the compressed encoding, as committed to by P2PKH.
    pub fn hash160(&self) -> [u8; 20] {
        hash160(&self.to_compressed())
    }

    /// Check `sig` over `digest` (pure curve check, accepts high S).
    pub fn verify(&self, digest: &[u8; 32], sig: &Signature) -> bool {
        sig.verify(digest, self)
    }

    pub(crate) fn from_k256_verifying_key(vk: &VerifyingKey) -> Self {
        PublicKey { inner: *vk }
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.inner
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_compressed() == other.to_compressed()
    }
}

impl Eq for PublicKey {}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNCOMPRESSED_OK: &str = "0411db93e1dcdb8a016b49840f8c53bc1eb68a382e97b1482ecad7b148a6909a5cb2e0eaddfb84ccf9744464f82e160bfa9b8b64f9d4c03f999b8643f656b412a3";
    const COMPRESSED_EVEN: &str = "02ce0b14fb842b1ba549fdd675c98075f12e9c510f8ef52bd021a9a1f4809d3b4d";
    const COMPRESSED_ODD: &str = "032689c7c2dab13309fb143e0e8fe396342521887e976690b6b47f5b2a4b7d448e";

    #[test]
    fn test_pub_key_parsing() {
        let cases = [
            ("uncompressed ok", UNCOMPRESSED_OK.to_string(), true),
            (
                "uncompressed x changed",
                UNCOMPRESSED_OK.replacen("0411", "0415", 1),
                false,
            ),
            ("compressed ok (ybit = 0)", COMPRESSED_EVEN.to_string(), true),
            ("compressed ok (ybit = 1)", COMPRESSED_ODD.to_string(), true),
            ("wrong length", "05".to_string(), false),
            ("empty", String::new(), false),
        ];

        for (name, key_hex, is_valid) in &cases {
            let result = PublicKey::from_hex(key_hex);
            assert_eq!(result.is_ok(), *is_valid, "{}: {:?}", name, result.err());
        }
    }

    #[test]
    fn test_compressed_round_trip() {
        let pk = PublicKey::from_hex(COMPRESSED_EVEN).unwrap();
        assert_eq!(hex::encode(pk.to_compressed()), COMPRESSED_EVEN);
        assert_eq!(format!("{}", pk), COMPRESSED_EVEN);
    }

    #[test]
    fn test_uncompressed_matches_compressed_point() {
        let pk = PublicKey::from_hex(UNCOMPRESSED_OK).unwrap();
        assert_eq!(hex::encode(pk.to_uncompressed()), UNCOMPRESSED_OK);
        let again = PublicKey::from_bytes(&pk.to_compressed()).unwrap();
        assert_eq!(pk, again);
    }

    #[test]
    fn test_equality() {
        let pk1 = PublicKey::from_hex(COMPRESSED_ODD).unwrap();
        let pk2 = PublicKey::from_hex(COMPRESSED_EVEN).unwrap();
        assert_eq!(pk1, pk1.clone());
        assert_ne!(pk1, pk2);
    }
}
