use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{sol, SolCall};

use crate::error::RpcError;
use crate::models::{Direction, MarketSnapshot, MarketState};

sol! {
    interface IMarketFactory {
        function getAllMarkets() external view returns (address[] memory);
    }

    interface IMarket {
        function getMarketDetails() external view returns (
            uint256 targetPrice,
            uint256 endTime,
            uint8 state,
            uint256 totalPoolAbove,
            uint256 totalPoolBelow,
            uint256 finalPrice
        );

        function predict(bool direction) external payable;
    }
}

/// Calldata for `getAllMarkets()`
pub fn encode_get_all_markets() -> Bytes {
    IMarketFactory::getAllMarketsCall {}.abi_encode().into()
}

/// Decode the registry's address list
pub fn decode_get_all_markets(data: &[u8]) -> Result<Vec<Address>, RpcError> {
    let decoded = IMarketFactory::getAllMarketsCall::abi_decode_returns(data, true)
        .map_err(|e| RpcError::Decode(e.to_string()))?;

    Ok(decoded._0)
}

/// Calldata for `getMarketDetails()`
pub fn encode_get_market_details() -> Bytes {
    IMarket::getMarketDetailsCall {}.abi_encode().into()
}

/// Decode `getMarketDetails()` output into a snapshot for `address`.
///
/// The six-field tuple is validated as a whole; empty return data (no code at
/// the address, or an uninitialized proxy) is an error, never a zeroed market.
pub fn decode_market_details(address: Address, data: &[u8]) -> Result<MarketSnapshot, RpcError> {
    if data.is_empty() {
        return Err(RpcError::EmptyReturn);
    }

    let details = IMarket::getMarketDetailsCall::abi_decode_returns(data, true)
        .map_err(|e| RpcError::Decode(e.to_string()))?;

    let end_time = u64::try_from(details.endTime)
        .map_err(|_| RpcError::Decode(format!("endTime {} out of range", details.endTime)))?;

    Ok(MarketSnapshot {
        address,
        target_price: details.targetPrice,
        end_time,
        state: MarketState::from(details.state),
        total_pool_above: details.totalPoolAbove,
        total_pool_below: details.totalPoolBelow,
        final_price: details.finalPrice,
    })
}

/// Calldata for `predict(direction)`
pub fn encode_predict(direction: Direction) -> Bytes {
    IMarket::predictCall {
        direction: direction.as_bool(),
    }
    .abi_encode()
    .into()
}
