use sol_tx::TxError;
use thiserror::Error;

use crate::ledger::LedgerError;

/// Why a workflow failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The caller broke an API contract: malformed address, signer mismatch,
    /// wallet/key mismatch.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// A ledger query failed. Carries the upstream message verbatim.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("SOL amount {requested} is less than minimum rent {minimum}")]
    InsufficientRentExemption { requested: u64, minimum: u64 },

    #[error("no bump seed yields an off-curve associated token address")]
    DerivationExhausted,

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Machine-checkable tag of a [`TokenError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ContractViolation,
    UpstreamUnavailable,
    InsufficientRentExemption,
    DerivationExhausted,
    Config,
}

impl TokenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenError::ContractViolation(_) => ErrorKind::ContractViolation,
            TokenError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            TokenError::InsufficientRentExemption { .. } => ErrorKind::InsufficientRentExemption,
            TokenError::DerivationExhausted => ErrorKind::DerivationExhausted,
            TokenError::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<TxError> for TokenError {
    fn from(e: TxError) -> Self {
        match e {
            TxError::DerivationExhausted => TokenError::DerivationExhausted,
            TxError::ContractViolation(msg) => TokenError::ContractViolation(msg),
            other => TokenError::ContractViolation(other.to_string()),
        }
    }
}

impl From<LedgerError> for TokenError {
    fn from(e: LedgerError) -> Self {
        TokenError::UpstreamUnavailable(e.to_string())
    }
}
