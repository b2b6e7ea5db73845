//! Interpreter error codes and the coarse error taxonomy they map onto.

use std::fmt;

use serde::{Deserialize, Serialize};
use txengine_primitives::{Component, DerError};

/// The category a failure belongs to.
///
/// Callers branch on the kind; the code inside an [`InterpreterError`]
/// names the exact rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad DER, high S, bad sighash byte, bad public key encoding.
    MalformedSignature,
    /// Truncated pushes, unbalanced conditionals, invalid opcodes.
    MalformedScript,
    /// The script ran and said no.
    ScriptFailure,
    /// A configured bound was exceeded.
    ResourceLimitExceeded,
    /// A disabled opcode, or a gated opcode whose flag is not set.
    DisabledOpcode,
    /// The call itself is inconsistent: contradictory flags, a missing
    /// transaction context or an input index the transaction lacks.
    InvalidFlags,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error codes for the script interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterpreterErrorCode {
    InvalidFlags,
    MissingTxContext,
    InvalidIndex,
    EarlyReturn,
    EmptyStack,
    EvalFalse,
    ScriptTooBig,
    ElementTooBig,
    TooManyOperations,
    StackOverflow,
    InvalidPubKeyCount,
    InvalidSignatureCount,
    NumberTooBig,
    NumberTooSmall,
    InvalidSplitRange,
    DivideByZero,
    Verify,
    EqualVerify,
    NumEqualVerify,
    CheckSigVerify,
    CheckMultiSigVerify,
    DisabledOpcode,
    OpcodeNotEnabled,
    ReservedOpcode,
    InvalidOpcode,
    MalformedPush,
    InvalidStackOperation,
    UnbalancedConditional,
    InvalidInputLength,
    MinimalData,
    MinimalIf,
    InvalidSigHashType,
    SigTooShort,
    SigTooLong,
    SigInvalidSeqID,
    SigInvalidDataLen,
    SigInvalidRIntID,
    SigInvalidRLen,
    SigZeroRLen,
    SigNegativeR,
    SigTooMuchRPadding,
    SigInvalidSIntID,
    SigInvalidSLen,
    SigZeroSLen,
    SigNegativeS,
    SigTooMuchSPadding,
    SigValueOutOfRange,
    SigHighS,
    NotPushOnly,
    SigNullDummy,
    PubKeyType,
    CleanStack,
    NullFail,
    DiscourageUpgradableNops,
    NegativeLockTime,
    UnsatisfiedLockTime,
    IllegalForkId,
}

impl InterpreterErrorCode {
    /// The taxonomy entry this code belongs to.
    pub fn kind(self) -> ErrorKind {
        use InterpreterErrorCode::*;
        match self {
            InvalidFlags | MissingTxContext | InvalidIndex => ErrorKind::InvalidFlags,

            ScriptTooBig | ElementTooBig | TooManyOperations | StackOverflow
            | InvalidPubKeyCount | InvalidSignatureCount | NumberTooBig => {
                ErrorKind::ResourceLimitExceeded
            }

            DisabledOpcode | OpcodeNotEnabled => ErrorKind::DisabledOpcode,

            ReservedOpcode | InvalidOpcode | MalformedPush | UnbalancedConditional
            | MinimalData | NotPushOnly => ErrorKind::MalformedScript,

            InvalidSigHashType | SigTooShort | SigTooLong | SigInvalidSeqID
            | SigInvalidDataLen | SigInvalidRIntID | SigInvalidRLen | SigZeroRLen
            | SigNegativeR | SigTooMuchRPadding | SigInvalidSIntID | SigInvalidSLen
            | SigZeroSLen | SigNegativeS | SigTooMuchSPadding | SigValueOutOfRange
            | SigHighS | PubKeyType | IllegalForkId => ErrorKind::MalformedSignature,

            EarlyReturn | EmptyStack | EvalFalse | NumberTooSmall | InvalidSplitRange
            | DivideByZero | Verify | EqualVerify | NumEqualVerify | CheckSigVerify
            | CheckMultiSigVerify | InvalidStackOperation | InvalidInputLength
            | MinimalIf | SigNullDummy | CleanStack | NullFail
            | DiscourageUpgradableNops | NegativeLockTime | UnsatisfiedLockTime => {
                ErrorKind::ScriptFailure
            }
        }
    }
}

impl fmt::Display for InterpreterErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<DerError> for InterpreterErrorCode {
    fn from(err: DerError) -> Self {
        use InterpreterErrorCode::*;
        match err {
            DerError::TooShort => SigTooShort,
            DerError::TooLong => SigTooLong,
            DerError::InvalidSequenceTag => SigInvalidSeqID,
            DerError::SequenceLengthMismatch | DerError::TrailingBytes => SigInvalidDataLen,
            DerError::MissingIntegerTag(Component::R) => SigInvalidRIntID,
            DerError::MissingIntegerTag(Component::S) => SigInvalidSIntID,
            DerError::IntegerLengthOverflow(Component::R) => SigInvalidRLen,
            DerError::IntegerLengthOverflow(Component::S) => SigInvalidSLen,
            DerError::ZeroLengthInteger(Component::R) => SigZeroRLen,
            DerError::ZeroLengthInteger(Component::S) => SigZeroSLen,
            DerError::NegativeInteger(Component::R) => SigNegativeR,
            DerError::NegativeInteger(Component::S) => SigNegativeS,
            DerError::ExcessivePadding(Component::R) => SigTooMuchRPadding,
            DerError::ExcessivePadding(Component::S) => SigTooMuchSPadding,
            DerError::IntegerTooLarge(_) | DerError::ZeroValue(_) | DerError::OutOfRange(_) => {
                SigValueOutOfRange
            }
        }
    }
}

/// A script interpreter error with an error code and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{description}")]
pub struct InterpreterError {
    pub code: InterpreterErrorCode,
    pub description: String,
}

impl InterpreterError {
    pub fn new(code: InterpreterErrorCode, description: impl Into<String>) -> Self {
        InterpreterError {
            code,
            description: description.into(),
        }
    }

    /// Shorthand for `self.code.kind()`.
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }
}

impl From<DerError> for InterpreterError {
    fn from(err: DerError) -> Self {
        InterpreterError::new(err.into(), format!("malformed signature: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        use InterpreterErrorCode::*;
        assert_eq!(DisabledOpcode.kind(), ErrorKind::DisabledOpcode);
        assert_eq!(OpcodeNotEnabled.kind(), ErrorKind::DisabledOpcode);
        assert_eq!(UnbalancedConditional.kind(), ErrorKind::MalformedScript);
        assert_eq!(TooManyOperations.kind(), ErrorKind::ResourceLimitExceeded);
        assert_eq!(EqualVerify.kind(), ErrorKind::ScriptFailure);
        assert_eq!(SigHighS.kind(), ErrorKind::MalformedSignature);
        assert_eq!(InvalidFlags.kind(), ErrorKind::InvalidFlags);
    }

    #[test]
    fn test_der_error_conversion() {
        let err: InterpreterError = DerError::ExcessivePadding(Component::S).into();
        assert_eq!(err.code, InterpreterErrorCode::SigTooMuchSPadding);
        assert_eq!(err.kind(), ErrorKind::MalformedSignature);
        assert!(err.to_string().contains("S has superfluous leading zero padding"));
    }
}
