use thiserror::Error;

/// Errors raised while encoding, deriving, assembling or signing Solana
/// transactions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    /// The caller broke an API contract (wrong key length, signer set
    /// mismatch, too many accounts, ...). Never retried.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("no bump seed in 0..=255 yields an off-curve address")]
    DerivationExhausted,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
