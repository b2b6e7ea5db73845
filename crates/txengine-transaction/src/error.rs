/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// An input index past the end of the input list.
    #[error("input index {index} out of range (tx has {count} inputs)")]
    InputIndex { index: usize, count: usize },
    /// The spent output of an input was never supplied.
    #[error("input {0} has no source output")]
    MissingSourceOutput(usize),
    /// A sighash flag with bits set above the low byte.
    #[error("sighash flag 0x{0:x} does not fit in one byte")]
    InvalidSighashFlag(u32),
    #[error("signing error: {0}")]
    SigningError(String),
    /// An error occurred during binary/hex serialization or deserialization.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// A byte string that does not split into sighash preimage fields.
    #[error("invalid preimage: {0}")]
    InvalidPreimage(String),
    #[error("script error: {0}")]
    Script(#[from] txengine_script::ScriptError),
    #[error("primitives error: {0}")]
    Primitives(#[from] txengine_primitives::PrimitivesError),
}
