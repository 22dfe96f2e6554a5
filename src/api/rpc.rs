use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::api::contracts;
use crate::api::ports::{ChainReader, ChainWriter};
use crate::error::RpcError;
use crate::models::{Direction, MarketSnapshot, TxReceipt};

/// JSON-RPC client for an EVM node.
///
/// Transactions go through `eth_sendTransaction`, so the account named in
/// `from` must be managed by the wallet behind the endpoint.
pub struct RpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
    receipt_poll_interval: Duration,
}

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Subset of `eth_getTransactionReceipt` we care about
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptResponse {
    transaction_hash: B256,
    block_number: Option<String>,
    gas_used: Option<String>,
    status: Option<String>,
}

impl RpcResponse {
    fn into_result<T: DeserializeOwned>(self) -> Result<T, RpcError> {
        if let Some(err) = self.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        Ok(serde_json::from_value(self.result)?)
    }
}

impl ReceiptResponse {
    fn into_receipt(self) -> Result<TxReceipt, RpcError> {
        // Pre-Byzantium receipts carry a state root instead of a status
        let success = match self.status.as_deref() {
            Some(status) => parse_quantity(status)? == 1,
            None => true,
        };

        let block_number = self.block_number.as_deref().map(parse_quantity).transpose()?;

        let gas_used = self
            .gas_used
            .as_deref()
            .map(|g| {
                U256::from_str_radix(g.trim_start_matches("0x"), 16)
                    .map_err(|e| RpcError::Malformed(format!("gasUsed {}: {}", g, e)))
            })
            .transpose()?;

        Ok(TxReceipt {
            transaction_hash: self.transaction_hash,
            success,
            block_number,
            gas_used,
        })
    }
}

/// Parse a hex quantity such as "0x1b4"
fn parse_quantity(raw: &str) -> Result<u64, RpcError> {
    let digits = raw.trim_start_matches("0x");
    if digits.is_empty() {
        return Err(RpcError::Malformed(format!("empty quantity '{}'", raw)));
    }

    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::Malformed(format!("quantity '{}': {}", raw, e)))
}

/// JSON-RPC over HTTP only; websocket URLs are mapped to their HTTP twin
pub fn normalize_rpc_url(rpc_url: &str) -> String {
    if let Some(rest) = rpc_url.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if let Some(rest) = rpc_url.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else {
        rpc_url.to_string()
    }
}

impl RpcClient {
    /// Create a new client for the given endpoint
    pub fn new(rpc_url: &str, receipt_poll_interval: Duration) -> Self {
        Self {
            client: Client::new(),
            url: normalize_rpc_url(rpc_url),
            next_id: AtomicU64::new(1),
            receipt_poll_interval,
        }
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!("RPC {} (id {})", method, id);

        let response = self.client.post(&self.url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RpcError::HttpStatus { status, text });
        }

        let envelope: RpcResponse = response.json().await?;
        envelope.into_result()
    }

    /// Read-only `eth_call` against the latest block
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    /// Receipt for `tx_hash`, or None while it is still pending
    pub async fn get_transaction_receipt(&self, tx_hash: B256) -> Result<Option<TxReceipt>, RpcError> {
        let receipt: Option<ReceiptResponse> = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;

        receipt.map(ReceiptResponse::into_receipt).transpose()
    }
}

#[async_trait]
impl ChainReader for RpcClient {
    async fn get_all_markets(&self, registry: Address) -> Result<Vec<Address>, RpcError> {
        let data = self
            .call(registry, contracts::encode_get_all_markets())
            .await?;
        contracts::decode_get_all_markets(&data)
    }

    async fn get_market_details(&self, market: Address) -> Result<MarketSnapshot, RpcError> {
        let data = self
            .call(market, contracts::encode_get_market_details())
            .await?;
        contracts::decode_market_details(market, &data)
    }
}

#[async_trait]
impl ChainWriter for RpcClient {
    async fn send_prediction(
        &self,
        from: Address,
        market: Address,
        direction: Direction,
        value: U256,
    ) -> Result<B256, RpcError> {
        let tx = json!({
            "from": from,
            "to": market,
            "value": format!("0x{:x}", value),
            "data": contracts::encode_predict(direction),
        });

        let tx_hash: B256 = self.request("eth_sendTransaction", json!([tx])).await?;
        info!("Prediction sent to {}: {}", market, tx_hash);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, RpcError> {
        loop {
            if let Some(receipt) = self.get_transaction_receipt(tx_hash).await? {
                return Ok(receipt);
            }

            debug!("Transaction {} not mined yet", tx_hash);
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(raw: &str) -> RpcResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_normalize_rpc_url() {
        assert_eq!(normalize_rpc_url("wss://node.example/v1"), "https://node.example/v1");
        assert_eq!(normalize_rpc_url("ws://127.0.0.1:8546"), "http://127.0.0.1:8546");
        assert_eq!(normalize_rpc_url("http://127.0.0.1:8545"), "http://127.0.0.1:8545");
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x1").unwrap(), 1);
        assert_eq!(parse_quantity("0x1b4").unwrap(), 436);
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_error_envelope() {
        let response = envelope(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":3,"message":"execution reverted"}}"#,
        );

        match response.into_result::<Bytes>() {
            Err(RpcError::Rpc { code, message }) => {
                assert_eq!(code, 3);
                assert_eq!(message, "execution reverted");
            }
            other => panic!("expected rpc error, got {:?}", other),
        }
    }

    #[test]
    fn test_call_result_envelope() {
        let response = envelope(r#"{"jsonrpc":"2.0","id":1,"result":"0x00ff"}"#);
        let data: Bytes = response.into_result().unwrap();
        assert_eq!(&data[..], &[0x00u8, 0xff]);

        let empty = envelope(r#"{"jsonrpc":"2.0","id":2,"result":"0x"}"#);
        let data: Bytes = empty.into_result().unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_pending_receipt_is_none() {
        let response = envelope(r#"{"jsonrpc":"2.0","id":1,"result":null}"#);
        let receipt: Option<ReceiptResponse> = response.into_result().unwrap();
        assert!(receipt.is_none());
    }

    #[test]
    fn test_receipt_conversion() {
        let hash = format!("0x{}", "ab".repeat(32));
        let raw = format!(
            r#"{{"jsonrpc":"2.0","id":1,"result":{{"transactionHash":"{}","blockNumber":"0x10","gasUsed":"0x5208","status":"0x1"}}}}"#,
            hash
        );

        let receipt: Option<ReceiptResponse> = envelope(&raw).into_result().unwrap();
        let receipt = receipt.unwrap().into_receipt().unwrap();

        assert!(receipt.success);
        assert_eq!(receipt.block_number, Some(16));
        assert_eq!(receipt.gas_used, Some(U256::from(21_000u64)));
        assert_eq!(receipt.transaction_hash, B256::repeat_byte(0xab));
    }

    #[test]
    fn test_reverted_receipt() {
        let raw = format!(
            r#"{{"jsonrpc":"2.0","id":1,"result":{{"transactionHash":"0x{}","blockNumber":"0x10","status":"0x0"}}}}"#,
            "00".repeat(32)
        );

        let receipt: Option<ReceiptResponse> = envelope(&raw).into_result().unwrap();
        let receipt = receipt.unwrap().into_receipt().unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.gas_used, None);
    }
}
