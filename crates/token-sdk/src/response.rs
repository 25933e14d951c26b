//! Flat `{ success, message, data }` result shape for callers that pass
//! results across a JSON boundary.

use serde::{Deserialize, Serialize};

use crate::client::PreparedTransaction;
use crate::error::TokenError;
use crate::rpc::SubmitError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub success: bool,
    pub message: String,
    /// Base64 transaction after preparation, signature after submission.
    pub data: Option<String>,
}

impl TransactionResponse {
    pub fn ok(message: impl Into<String>, data: String) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn from_transfer(result: Result<PreparedTransaction, TokenError>) -> Self {
        match result {
            Ok(prepared) => Self::ok("Transaction prepared successfully", prepared.base64),
            Err(e) => Self::failed(format!("Error preparing transaction: {e}")),
        }
    }

    pub fn from_transfer_with_burn(result: Result<PreparedTransaction, TokenError>) -> Self {
        match result {
            Ok(prepared) => Self::ok("Transaction with burn prepared successfully", prepared.base64),
            Err(e) => Self::failed(format!("Error preparing transaction with burn: {e}")),
        }
    }

    pub fn from_submission(result: Result<String, SubmitError>) -> Self {
        match result {
            Ok(signature) => Self::ok("Transaction sent successfully", signature),
            Err(e @ (SubmitError::Transport(_) | SubmitError::Malformed(_))) => {
                Self::failed(format!("Error sending transaction: {e}"))
            }
            Err(e) => Self::failed(format!("Transaction failed: {e}")),
        }
    }
}
