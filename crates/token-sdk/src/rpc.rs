//! JSON-RPC 2.0 bodies and response parsing for the ledger queries.
//!
//! Nothing here opens a socket. Callers plug an HTTP client in through
//! [`RpcTransport`]; [`RpcLedger`] turns that into a [`LedgerQuery`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use sol_tx::{Address, Blockhash};
use thiserror::Error;

use crate::ledger::{LedgerError, LedgerQuery, TokenAccountsLookup};

// Requests are sequential, so one id serves all of them.
const REQUEST_ID: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcRequest {
    GetTokenAccountsByOwner,
    GetLatestBlockhash,
    GetMinimumBalanceForRentExemption,
    SendTransaction,
}

impl RpcRequest {
    pub fn method(&self) -> &'static str {
        match self {
            RpcRequest::GetTokenAccountsByOwner => "getTokenAccountsByOwner",
            RpcRequest::GetLatestBlockhash => "getLatestBlockhash",
            RpcRequest::GetMinimumBalanceForRentExemption => "getMinimumBalanceForRentExemption",
            RpcRequest::SendTransaction => "sendTransaction",
        }
    }

    pub fn build_request_json(&self, id: u64, params: Option<Value>) -> Value {
        let mut request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": self.method(),
        });
        if let Some(params) = params {
            request["params"] = params;
        }
        request
    }
}

pub fn token_accounts_by_owner_request(owner: &Address, mint: &Address) -> Value {
    RpcRequest::GetTokenAccountsByOwner.build_request_json(
        REQUEST_ID,
        Some(json!([
            owner.to_string(),
            { "mint": mint.to_string() },
            { "encoding": "jsonParsed" },
        ])),
    )
}

pub fn latest_blockhash_request() -> Value {
    RpcRequest::GetLatestBlockhash.build_request_json(REQUEST_ID, None)
}

pub fn minimum_balance_for_rent_exemption_request(data_len: usize) -> Value {
    RpcRequest::GetMinimumBalanceForRentExemption
        .build_request_json(REQUEST_ID, Some(json!([data_len])))
}

pub fn send_transaction_request(transaction_base64: &str) -> Value {
    RpcRequest::SendTransaction.build_request_json(
        REQUEST_ID,
        Some(json!([transaction_base64, { "encoding": "base64" }])),
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<ErrorData>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorData {
    #[serde(default)]
    logs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct KeyedAccount {
    pubkey: String,
}

#[derive(Debug, Deserialize)]
struct LatestBlockhash {
    blockhash: String,
}

fn into_result<T: DeserializeOwned>(response: Value) -> Result<T, LedgerError> {
    let parsed: RpcResponse<T> =
        serde_json::from_value(response).map_err(|e| LedgerError::Malformed(e.to_string()))?;

    if let Some(error) = parsed.error {
        return Err(LedgerError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    parsed
        .result
        .ok_or_else(|| LedgerError::Malformed("response has neither result nor error".into()))
}

pub fn parse_token_accounts(response: Value) -> Result<TokenAccountsLookup, LedgerError> {
    let accounts: WithContext<Vec<KeyedAccount>> = into_result(response)?;
    let addresses = accounts
        .value
        .iter()
        .map(|account| {
            account
                .pubkey
                .parse::<Address>()
                .map_err(|e| LedgerError::Malformed(format!("token account pubkey: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TokenAccountsLookup::from_accounts(addresses))
}

pub fn parse_latest_blockhash(response: Value) -> Result<Blockhash, LedgerError> {
    let latest: WithContext<LatestBlockhash> = into_result(response)?;
    latest
        .value
        .blockhash
        .parse()
        .map_err(|e| LedgerError::Malformed(format!("blockhash: {e}")))
}

pub fn parse_minimum_balance(response: Value) -> Result<u64, LedgerError> {
    into_result(response)
}

// ---------------------------------------------------------------------------
// Transport + ledger
// ---------------------------------------------------------------------------

/// Delivers one JSON-RPC request body and returns the parsed response body.
pub trait RpcTransport {
    fn call(&self, request: &Value) -> Result<Value, String>;
}

/// Why the node refused a submitted transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("insufficient token funds")]
    InsufficientTokenFunds,

    #[error("insufficient SOL funds")]
    InsufficientNativeFunds,

    #[error("{0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

fn classify_rejection(error: RpcErrorObject) -> SubmitError {
    let logs = error.data.unwrap_or_default().logs;
    if logs.iter().any(|line| line.contains("insufficient funds")) {
        SubmitError::InsufficientTokenFunds
    } else if logs.iter().any(|line| line.contains("insufficient lamports")) {
        SubmitError::InsufficientNativeFunds
    } else {
        SubmitError::Rejected(format!("{} ({})", error.message, error.code))
    }
}

/// [`LedgerQuery`] over a JSON-RPC node.
#[derive(Debug, Clone)]
pub struct RpcLedger<T> {
    transport: T,
}

impl<T: RpcTransport> RpcLedger<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn call(&self, request: Value) -> Result<Value, LedgerError> {
        self.transport.call(&request).map_err(LedgerError::Transport)
    }

    /// Submit a base64 transaction. Returns the signature the node reports.
    pub fn send_transaction(&self, transaction_base64: &str) -> Result<String, SubmitError> {
        let response = self
            .transport
            .call(&send_transaction_request(transaction_base64))
            .map_err(SubmitError::Transport)?;
        let parsed: RpcResponse<String> =
            serde_json::from_value(response).map_err(|e| SubmitError::Malformed(e.to_string()))?;

        match (parsed.result, parsed.error) {
            (_, Some(error)) => Err(classify_rejection(error)),
            (Some(signature), None) => Ok(signature),
            (None, None) => Err(SubmitError::Malformed(
                "response has neither result nor error".into(),
            )),
        }
    }
}

impl<T: RpcTransport> LedgerQuery for RpcLedger<T> {
    fn get_token_accounts_by_owner(
        &self,
        owner: &Address,
        mint: &Address,
    ) -> Result<TokenAccountsLookup, LedgerError> {
        parse_token_accounts(self.call(token_accounts_by_owner_request(owner, mint))?)
    }

    fn get_latest_blockhash(&self) -> Result<Blockhash, LedgerError> {
        parse_latest_blockhash(self.call(latest_blockhash_request())?)
    }

    fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, LedgerError> {
        parse_minimum_balance(self.call(minimum_balance_for_rent_exemption_request(data_len))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const BLOCKHASH: &str = "4sGjMW1sUnHzSxGspuhpqLDx6wiyjNtZAMdL4VZHirAn";

    /// Replies with canned responses and records every request.
    struct CannedTransport {
        responses: RefCell<Vec<Result<Value, String>>>,
        requests: RefCell<Vec<Value>>,
    }

    impl CannedTransport {
        fn new(responses: Vec<Result<Value, String>>) -> Self {
            Self {
                responses: RefCell::new(responses),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl RpcTransport for CannedTransport {
        fn call(&self, request: &Value) -> Result<Value, String> {
            self.requests.borrow_mut().push(request.clone());
            self.responses.borrow_mut().remove(0)
        }
    }

    #[test]
    fn request_envelope() {
        let request = latest_blockhash_request();
        assert_eq!(request["jsonrpc"], "2.0");
        assert_eq!(request["id"], 1);
        assert_eq!(request["method"], "getLatestBlockhash");
        assert!(request.get("params").is_none());
    }

    #[test]
    fn token_accounts_request_filters_by_mint() {
        let owner = Address::new([7; 32]);
        let mint = Address::new([9; 32]);
        let request = token_accounts_by_owner_request(&owner, &mint);

        assert_eq!(request["method"], "getTokenAccountsByOwner");
        assert_eq!(request["params"][0], owner.to_string());
        assert_eq!(request["params"][1]["mint"], mint.to_string());
        assert_eq!(request["params"][2]["encoding"], "jsonParsed");
    }

    #[test]
    fn send_request_declares_base64() {
        let request = send_transaction_request("AQID");
        assert_eq!(request["params"], json!(["AQID", { "encoding": "base64" }]));
    }

    #[test]
    fn parses_token_accounts_in_node_order() {
        let first = Address::new([1; 32]);
        let second = Address::new([2; 32]);
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "context": { "slot": 1234 },
                "value": [
                    { "pubkey": first.to_string(), "account": { "lamports": 2039280 } },
                    { "pubkey": second.to_string(), "account": { "lamports": 2039280 } },
                ],
            },
        });
        assert_eq!(
            parse_token_accounts(response).unwrap(),
            TokenAccountsLookup::Found(vec![first, second])
        );
    }

    #[test]
    fn empty_token_accounts_is_not_found() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "context": { "slot": 1 }, "value": [] },
        });
        assert_eq!(
            parse_token_accounts(response).unwrap(),
            TokenAccountsLookup::NotFound
        );
    }

    #[test]
    fn parses_latest_blockhash() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "context": { "slot": 2792 },
                "value": { "blockhash": BLOCKHASH, "lastValidBlockHeight": 3090 },
            },
        });
        let blockhash = parse_latest_blockhash(response).unwrap();
        assert_eq!(blockhash.to_string(), BLOCKHASH);
    }

    #[test]
    fn parses_minimum_balance() {
        let response = json!({ "jsonrpc": "2.0", "id": 1, "result": 1238880 });
        assert_eq!(parse_minimum_balance(response).unwrap(), 1_238_880);
    }

    #[test]
    fn rpc_error_object_is_surfaced() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid param: could not find mint" },
        });
        assert_eq!(
            parse_token_accounts(response).unwrap_err(),
            LedgerError::Rpc {
                code: -32602,
                message: "Invalid param: could not find mint".into(),
            }
        );
    }

    #[test]
    fn missing_result_is_malformed() {
        let response = json!({ "jsonrpc": "2.0", "id": 1 });
        assert!(matches!(
            parse_minimum_balance(response),
            Err(LedgerError::Malformed(_))
        ));
    }

    #[test]
    fn bad_pubkey_is_malformed() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "context": { "slot": 1 }, "value": [{ "pubkey": "not-base58!" }] },
        });
        assert!(matches!(
            parse_token_accounts(response),
            Err(LedgerError::Malformed(_))
        ));
    }

    #[test]
    fn ledger_routes_through_transport() {
        let transport = CannedTransport::new(vec![
            Ok(json!({ "jsonrpc": "2.0", "id": 1, "result": 2039280 })),
            Err("connection refused".into()),
        ]);
        let ledger = RpcLedger::new(transport);

        assert_eq!(
            ledger.get_minimum_balance_for_rent_exemption(165).unwrap(),
            2_039_280
        );
        assert_eq!(
            ledger.get_latest_blockhash().unwrap_err(),
            LedgerError::Transport("connection refused".into())
        );

        let requests = ledger.transport().requests.borrow();
        assert_eq!(requests[0]["params"], json!([165]));
        assert_eq!(requests[1]["method"], "getLatestBlockhash");
    }

    #[test]
    fn send_returns_signature() {
        let transport = CannedTransport::new(vec![Ok(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": "2id3YC2jK9G5Wo2phDx4gJVAew8DcY5NAojnVuao8rkxwPYPe8cSwE5GzhEgJA2y8fVjDEo6iR6ykBvDxrTQrtpb",
        }))]);
        let ledger = RpcLedger::new(transport);
        let signature = ledger.send_transaction("AQID").unwrap();
        assert!(signature.starts_with("2id3YC2j"));
    }

    fn simulation_failure(log: &str) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": -32002,
                "message": "Transaction simulation failed",
                "data": { "logs": ["Program log: Instruction: Transfer", log] },
            },
        })
    }

    #[test]
    fn send_classifies_token_shortfall() {
        let ledger = RpcLedger::new(CannedTransport::new(vec![Ok(simulation_failure(
            "Program log: Error: insufficient funds",
        ))]));
        assert_eq!(
            ledger.send_transaction("AQID").unwrap_err(),
            SubmitError::InsufficientTokenFunds
        );
    }

    #[test]
    fn send_classifies_native_shortfall() {
        let ledger = RpcLedger::new(CannedTransport::new(vec![Ok(simulation_failure(
            "Transfer: insufficient lamports 100, need 2039280",
        ))]));
        assert_eq!(
            ledger.send_transaction("AQID").unwrap_err(),
            SubmitError::InsufficientNativeFunds
        );
    }

    #[test]
    fn send_keeps_other_rejections() {
        let ledger = RpcLedger::new(CannedTransport::new(vec![Ok(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32003, "message": "Transaction signature verification failure" },
        }))]));
        assert_eq!(
            ledger.send_transaction("AQID").unwrap_err(),
            SubmitError::Rejected("Transaction signature verification failure (-32003)".into())
        );
    }
}
