//! SPL token transfer and burn workflows on top of `sol-tx`.
//!
//! [`TokenClient`] is the entry point: give it a [`Config`] and something
//! that implements [`LedgerQuery`] (usually [`rpc::RpcLedger`] over an HTTP
//! transport) and it produces signed, base64-encoded transactions.
//!
//! Logging goes through `tracing`; install a subscriber in the binary to see
//! it.

pub mod client;
pub mod config;
pub mod error;
pub mod ledger;
pub mod resolver;
pub mod response;
pub mod rpc;

pub use client::{PreparedTransaction, TokenClient};
pub use config::{Cluster, ComputeBudget, Config};
pub use error::{ErrorKind, TokenError};
pub use ledger::{LedgerError, LedgerQuery, TokenAccountsLookup};
pub use resolver::{resolve, AssociatedAccount};
pub use response::TransactionResponse;
pub use rpc::{RpcLedger, RpcTransport, SubmitError};

pub use sol_tx;
