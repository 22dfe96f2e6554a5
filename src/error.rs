use alloy_primitives::{Address, B256};
use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the JSON-RPC endpoint or decoding what it returned
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("http {status}: {text}")]
    HttpStatus { status: StatusCode, text: String },

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed rpc response: {0}")]
    Malformed(String),

    #[error("call returned no data")]
    EmptyReturn,

    #[error("abi decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Why a prediction attempt did not reach success
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("connect a wallet before predicting")]
    NotConnected,

    #[error("please enter a valid amount")]
    InvalidAmount,

    #[error("market {0} is not open for predictions")]
    MarketNotOpen(Address),

    #[error("request targets market {requested} but {selected} is selected")]
    MarketMismatch { requested: Address, selected: Address },

    #[error("a prediction is already being processed")]
    InFlight,

    #[error("transaction rejected: {0}")]
    Rejected(#[source] RpcError),

    #[error("transaction {0} reverted")]
    Reverted(B256),

    #[error("confirmation failed: {0}")]
    Confirmation(#[source] RpcError),
}

impl SubmitError {
    /// True for errors raised before anything is sent to the network
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SubmitError::NotConnected
                | SubmitError::InvalidAmount
                | SubmitError::MarketNotOpen(_)
                | SubmitError::MarketMismatch { .. }
        )
    }
}
