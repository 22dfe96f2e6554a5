use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;

use crate::error::RpcError;
use crate::models::{Direction, MarketSnapshot, TxReceipt};

/// Read side of the chain: registry listing and per-market views
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn get_all_markets(&self, registry: Address) -> Result<Vec<Address>, RpcError>;

    /// Fails rather than returning a partially populated snapshot
    async fn get_market_details(&self, market: Address) -> Result<MarketSnapshot, RpcError>;
}

/// Write side: transactions are signed by the wallet behind the endpoint
#[async_trait]
pub trait ChainWriter: Send + Sync {
    /// Dispatch `predict(direction)` with `value` wei attached; returns the tx hash
    async fn send_prediction(
        &self,
        from: Address,
        market: Address,
        direction: Direction,
        value: U256,
    ) -> Result<B256, RpcError>;

    /// Wait until the transaction is mined
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, RpcError>;
}
