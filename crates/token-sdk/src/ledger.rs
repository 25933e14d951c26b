//! The read-only ledger queries the workflows depend on.
//!
//! Implementations own the transport. [`crate::rpc::RpcLedger`] speaks
//! JSON-RPC over any [`crate::rpc::RpcTransport`]; tests use in-memory
//! fakes.

use sol_tx::{Address, Blockhash};
use thiserror::Error;

/// Result of looking up the token accounts an owner holds for one mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenAccountsLookup {
    /// Non-empty, in the order the node returned them.
    Found(Vec<Address>),
    NotFound,
}

impl TokenAccountsLookup {
    pub fn from_accounts(accounts: Vec<Address>) -> Self {
        if accounts.is_empty() {
            TokenAccountsLookup::NotFound
        } else {
            TokenAccountsLookup::Found(accounts)
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Queries against current ledger state.
pub trait LedgerQuery {
    fn get_token_accounts_by_owner(
        &self,
        owner: &Address,
        mint: &Address,
    ) -> Result<TokenAccountsLookup, LedgerError>;

    fn get_latest_blockhash(&self) -> Result<Blockhash, LedgerError>;

    /// Lamports an account with `data_len` bytes of data needs to be exempt
    /// from rent.
    fn get_minimum_balance_for_rent_exemption(&self, data_len: usize)
        -> Result<u64, LedgerError>;
}

impl<T: LedgerQuery + ?Sized> LedgerQuery for &T {
    fn get_token_accounts_by_owner(
        &self,
        owner: &Address,
        mint: &Address,
    ) -> Result<TokenAccountsLookup, LedgerError> {
        (**self).get_token_accounts_by_owner(owner, mint)
    }

    fn get_latest_blockhash(&self) -> Result<Blockhash, LedgerError> {
        (**self).get_latest_blockhash()
    }

    fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, LedgerError> {
        (**self).get_minimum_balance_for_rent_exemption(data_len)
    }
}
