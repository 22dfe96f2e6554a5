use alloy_primitives::{Address, U256};
use serde::Serialize;

/// Lifecycle stage of a market contract, as reported by its `uint8` state field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketState {
    /// Accepting predictions
    Open,
    /// Prediction window closed, awaiting resolution
    Closed,
    /// Final price recorded, payouts available
    Resolved,
    /// Any value the market ABI does not define
    Unknown(u8),
}

impl From<u8> for MarketState {
    fn from(raw: u8) -> Self {
        match raw {
            0 => MarketState::Open,
            1 => MarketState::Closed,
            2 => MarketState::Resolved,
            other => MarketState::Unknown(other),
        }
    }
}

impl MarketState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketState::Open => "Open",
            MarketState::Closed => "Closed",
            MarketState::Resolved => "Resolved",
            MarketState::Unknown(_) => "Unknown",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, MarketState::Open)
    }
}

/// Read-only view of one market contract at fetch time.
///
/// Snapshots are never mutated after a fetch; a refresh produces new ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSnapshot {
    /// Market contract address
    pub address: Address,

    /// Threshold price, fixed point with 8 decimals
    pub target_price: U256,

    /// Prediction window close (Unix seconds)
    pub end_time: u64,

    /// Lifecycle stage
    pub state: MarketState,

    /// Cumulative stake on "above" (wei)
    pub total_pool_above: U256,

    /// Cumulative stake on "below" (wei)
    pub total_pool_below: U256,

    /// Settlement price, fixed point with 8 decimals; zero until resolved
    pub final_price: U256,
}

impl MarketSnapshot {
    /// Sum of both pools in wei
    pub fn total_pool(&self) -> U256 {
        self.total_pool_above.saturating_add(self.total_pool_below)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_raw() {
        assert_eq!(MarketState::from(0), MarketState::Open);
        assert_eq!(MarketState::from(1), MarketState::Closed);
        assert_eq!(MarketState::from(2), MarketState::Resolved);
        assert_eq!(MarketState::from(3), MarketState::Unknown(3));
        assert_eq!(MarketState::from(255), MarketState::Unknown(255));
    }

    #[test]
    fn test_only_open_is_open() {
        assert!(MarketState::Open.is_open());
        assert!(!MarketState::Closed.is_open());
        assert!(!MarketState::Resolved.is_open());
        assert!(!MarketState::Unknown(7).is_open());
    }

    #[test]
    fn test_total_pool() {
        let snapshot = MarketSnapshot {
            address: Address::ZERO,
            target_price: U256::ZERO,
            end_time: 0,
            state: MarketState::Open,
            total_pool_above: U256::from(3u64),
            total_pool_below: U256::from(4u64),
            final_price: U256::ZERO,
        };

        assert_eq!(snapshot.total_pool(), U256::from(7u64));
    }

    #[test]
    fn test_snapshot_log_json() {
        let mut snapshot = MarketSnapshot {
            address: Address::ZERO,
            target_price: U256::ZERO,
            end_time: 1_700_000_000,
            state: MarketState::Open,
            total_pool_above: U256::ZERO,
            total_pool_below: U256::ZERO,
            final_price: U256::ZERO,
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], "open");
        assert_eq!(json["end_time"], 1_700_000_000u64);

        snapshot.state = MarketState::Unknown(7);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], serde_json::json!({ "unknown": 7 }));
    }
}
