use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, B256, U256};
use serde::Serialize;

/// Which side of the target price a prediction backs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    /// Value passed as the `direction` argument of `predict(bool)`
    pub fn as_bool(&self) -> bool {
        matches!(self, Direction::Above)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Above => "Above",
            Direction::Below => "Below",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "above" | "up" => Ok(Direction::Above),
            "below" | "down" => Ok(Direction::Below),
            other => Err(format!("unknown direction '{}', expected above or below", other)),
        }
    }
}

/// User input for one prediction attempt; consumed by a single submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    /// Target market contract
    pub market: Address,

    /// Chosen side
    pub direction: Direction,

    /// Stake as entered, in ether (e.g. "0.5")
    pub amount: String,
}

impl PredictionRequest {
    pub fn new(market: Address, direction: Direction, amount: impl Into<String>) -> Self {
        Self {
            market,
            direction,
            amount: amount.into(),
        }
    }
}

/// Outcome of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub transaction_hash: B256,

    /// Receipt status; false means the call reverted
    pub success: bool,

    pub block_number: Option<u64>,

    pub gas_used: Option<U256>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse() {
        assert_eq!("above".parse::<Direction>(), Ok(Direction::Above));
        assert_eq!(" Below ".parse::<Direction>(), Ok(Direction::Below));
        assert_eq!("UP".parse::<Direction>(), Ok(Direction::Above));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_direction_as_bool() {
        assert!(Direction::Above.as_bool());
        assert!(!Direction::Below.as_bool());
    }
}
