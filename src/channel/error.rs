use thiserror::Error;

use crate::{
    abiencode::{
        self,
        types::{Address, U256},
    },
    ledger::LedgerError,
    sig::SignatureError,
};

/// Why a transition was rejected. No state changes when any of these is
/// returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("initiator and partner are the same address")]
    SelfChannel,
    #[error("request names channel {actual}, the pair's channel is {expected}")]
    AddressCollision { expected: Address, actual: Address },
    #[error("invalid channel state: {0}")]
    InvalidState(#[from] InvalidState),
    #[error("expected nonce {expected}, request has {actual}")]
    NonceMismatch { expected: U256, actual: U256 },
    #[error("request expired at {deadline}, now is {now}")]
    Expired { deadline: U256, now: U256 },
    #[error("invalid signature: {0}")]
    InvalidSignature(#[source] SignatureError),
    #[error("pre-image does not hash to the signed payment hash")]
    HashMismatch,
    #[error("{account} holds {balance}, needs {required}")]
    InsufficientBalance {
        account: Address,
        balance: U256,
        required: U256,
    },
    #[error("amount overflows 256 bits")]
    Overflow,
    #[error("abi encoding failed: {0}")]
    AbiEncode(#[source] abiencode::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidState {
    #[error("request is for epoch {actual}, channel is at {expected}")]
    IndexMismatch { expected: U256, actual: U256 },
    #[error("hold count must be {expected}, got {actual}")]
    CountMismatch { expected: U256, actual: U256 },
    #[error("channel is already open")]
    AlreadyOpen,
    #[error("channel is not open")]
    NotOpen,
    #[error("total {total} is not amount1 + amount2 = {sum}")]
    TotalMismatch { total: U256, sum: U256 },
    #[error("request moves no value")]
    EmptyAllocation,
    #[error("release of {release} exceeds side balance {balance}")]
    ReleaseExceedsBalance { balance: U256, release: U256 },
    /// A decrease may not release the whole channel value, use close for that.
    #[error("decrease would empty the channel, close it instead")]
    DrainsChannel,
    #[error("allocation sums to {actual}, channel holds {expected}")]
    AllocationMismatch { expected: U256, actual: U256 },
}

impl Error {
    /// Whether the request can succeed if the partner signs a fresh one
    /// against the current channel state. Everything else is a permanent
    /// rejection of that request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::NonceMismatch { .. }
                | Error::Expired { .. }
                | Error::InvalidState(
                    InvalidState::IndexMismatch { .. } | InvalidState::CountMismatch { .. }
                )
        )
    }
}

impl From<SignatureError> for Error {
    fn from(e: SignatureError) -> Self {
        match e {
            SignatureError::Encoding(e) => Error::AbiEncode(e),
            e => Error::InvalidSignature(e),
        }
    }
}

impl From<abiencode::Error> for Error {
    fn from(e: abiencode::Error) -> Self {
        Error::AbiEncode(e)
    }
}

impl From<LedgerError> for Error {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientBalance {
                account,
                balance,
                required,
            } => Error::InsufficientBalance {
                account,
                balance,
                required,
            },
            LedgerError::Overflow { .. } => Error::Overflow,
        }
    }
}
