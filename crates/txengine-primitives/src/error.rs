/// Unified error type for primitives operations.
///
/// Covers key parsing, signature decoding and wire-format reads.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("malformed signature: {0}")]
    MalformedSignature(#[from] DerError),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("varint does not fit in memory")]
    VarIntTooLarge,

    #[error("unexpected end of data")]
    UnexpectedEof,
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}

/// The specific rule a DER-encoded signature violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DerError {
    #[error("signature is shorter than the minimum of 8 bytes")]
    TooShort,
    #[error("signature is longer than the maximum of 72 bytes")]
    TooLong,
    #[error("missing SEQUENCE tag 0x30")]
    InvalidSequenceTag,
    #[error("SEQUENCE length does not match the signature length")]
    SequenceLengthMismatch,
    #[error("missing INTEGER tag 0x02 for {0}")]
    MissingIntegerTag(Component),
    #[error("{0} has zero length")]
    ZeroLengthInteger(Component),
    #[error("{0} length runs past the end of the signature")]
    IntegerLengthOverflow(Component),
    #[error("{0} is negative")]
    NegativeInteger(Component),
    #[error("{0} has superfluous leading zero padding")]
    ExcessivePadding(Component),
    #[error("{0} does not fit in 32 bytes")]
    IntegerTooLarge(Component),
    #[error("{0} is zero")]
    ZeroValue(Component),
    #[error("{0} is not below the curve order")]
    OutOfRange(Component),
    #[error("trailing bytes after the S integer")]
    TrailingBytes,
}

/// Which integer of the signature an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    R,
    S,
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::R => f.write_str("R"),
            Component::S => f.write_str("S"),
        }
    }
}
