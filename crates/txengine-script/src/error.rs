/// Errors raised while building, parsing or rendering scripts.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// An ASM token is neither an opcode name nor valid hex.
    #[error("invalid ASM token '{0}'")]
    InvalidAsmToken(String),

    /// A push opcode was handed to `append_opcodes`.
    #[error("{0} carries data; use append_push_data")]
    PushOpcodeNotAllowed(String),

    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// A push runs past the end of the script.
    #[error("push at offset {0} runs past the end of the script")]
    DataTooSmall(usize),

    /// A push length does not fit the encoding.
    #[error("push data too big")]
    DataTooBig,

    #[error("primitives error: {0}")]
    Primitives(#[from] txengine_primitives::PrimitivesError),
}
