use std::env;

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON-RPC endpoint of the node / wallet
    pub rpc_url: String,

    /// Market factory (registry) contract
    pub market_factory_address: Address,

    /// Account to act as; unset means no wallet is connected
    pub wallet_address: Option<Address>,

    /// Interval in seconds between directory refreshes
    pub refresh_interval: u64,

    /// Interval in milliseconds between receipt polls
    pub receipt_poll_interval: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            rpc_url: env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string()),

            market_factory_address: env::var("MARKET_FACTORY_ADDRESS")
                .context("MARKET_FACTORY_ADDRESS must be set")?
                .parse()
                .context("MARKET_FACTORY_ADDRESS must be a valid address")?,

            wallet_address: match env::var("WALLET_ADDRESS") {
                Ok(raw) if !raw.trim().is_empty() => Some(
                    raw.trim()
                        .parse()
                        .context("WALLET_ADDRESS must be a valid address")?,
                ),
                _ => None,
            },

            refresh_interval: parse_interval(
                "REFRESH_INTERVAL",
                &env::var("REFRESH_INTERVAL").unwrap_or_else(|_| "30".to_string()),
            )?,

            receipt_poll_interval: parse_interval(
                "RECEIPT_POLL_INTERVAL",
                &env::var("RECEIPT_POLL_INTERVAL").unwrap_or_else(|_| "1000".to_string()),
            )?,
        })
    }
}

/// Intervals drive tokio timers, which need a non-zero period
fn parse_interval(name: &str, raw: &str) -> Result<u64> {
    let value: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{} must be a valid number", name))?;

    if value == 0 {
        bail!("{} must be greater than zero", name);
    }

    Ok(value)
}
