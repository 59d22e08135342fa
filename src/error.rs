//! Error types for key handling, serialization and script verification

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// Errors raised by the arithmetic, codec, serialization and sighash layers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("Invalid field element: {0}")]
    InvalidFieldElement(Cow<'static, str>),

    #[error("Malformed signature: {0}")]
    MalformedSignature(Cow<'static, str>),

    #[error("Input index {0} out of range")]
    IndexOutOfRange(usize),

    #[error("Prevouts count {0} does not match input count {1}")]
    InvalidPrevoutsCount(usize, usize),

    #[error("Serialization error: {0}")]
    Serialization(Cow<'static, str>),

    #[error("Transaction validation failed: {0}")]
    TransactionValidation(Cow<'static, str>),

    #[error("Invalid configuration: {0}")]
    Configuration(Cow<'static, str>),
}

/// Resource ceilings enforced by the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLimit {
    ScriptSize,
    PushSize,
    OpCount,
    StackSize,
    PubkeyCount,
    SigCount,
}

impl fmt::Display for ResourceLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceLimit::ScriptSize => "script size",
            ResourceLimit::PushSize => "push size",
            ResourceLimit::OpCount => "operation count",
            ResourceLimit::StackSize => "stack size",
            ResourceLimit::PubkeyCount => "public key count",
            ResourceLimit::SigCount => "signature count",
        };
        f.write_str(name)
    }
}

/// Verification failures raised by the script interpreter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Invalid script: {0}")]
    InvalidScript(Cow<'static, str>),

    #[error("Resource limit exceeded: {0}")]
    ResourceLimitExceeded(ResourceLimit),

    #[error("Script evaluated without error but finished with a false/empty top stack element")]
    StackFalse,

    #[error("Operation not valid with the current stack size")]
    InvalidStackOperation,

    #[error("Operation not valid with the current altstack size")]
    InvalidAltStackOperation,

    #[error("Invalid OP_IF construction")]
    UnbalancedConditional,

    #[error("OP_RETURN was encountered")]
    OpReturn,

    #[error("Attempted to use a disabled opcode: {0:#04x}")]
    DisabledOpcode(u8),

    #[error("Opcode missing or not understood: {0:#04x}")]
    BadOpcode(u8),

    #[error("Script failed an OP_VERIFY operation")]
    VerifyFailed,

    #[error("Script failed an OP_EQUALVERIFY operation")]
    EqualVerify,

    #[error("Script failed an OP_NUMEQUALVERIFY operation")]
    NumEqualVerify,

    #[error("Signature must be zero for failed CHECK(MULTI)SIG operation")]
    IncorrectSignature,

    #[error("Non-canonical DER signature")]
    MalformedSignature,

    #[error("Invalid script number: {0}")]
    InvalidNumber(Cow<'static, str>),

    #[error("Dummy CHECKMULTISIG argument must be zero")]
    NullDummy,

    #[error("Negative locktime")]
    NegativeLockTime,

    #[error("Locktime requirement not satisfied")]
    UnsatisfiedLockTime,

    #[error("Only push operators allowed in signatures")]
    SigPushOnly,

    #[error("Stack size must be exactly one after execution")]
    CleanStack,

    #[error("Witness provided for non-witness script")]
    UnexpectedWitness,

    #[error("Witness program was passed an empty witness")]
    MissingWitness,

    #[error("Witness program hash mismatch")]
    WitnessProgramMismatch,

    #[error("Witness program has incorrect length")]
    WitnessProgramWrongLength,

    #[error("Witness requires empty scriptSig")]
    WitnessMalleated,

    #[error("Witness requires only-redeemscript scriptSig")]
    WitnessMalleatedP2sh,

    #[error(transparent)]
    Consensus(#[from] ConsensusError),
}

pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Result of a script verification step.
pub type VerifyResult<T> = std::result::Result<T, VerifyError>;
