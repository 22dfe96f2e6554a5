use alloy_primitives::Address;
use chrono::{DateTime, Utc};

use crate::models::{MarketSnapshot, MarketState};
use crate::view::format::{format_ether, format_price, time_remaining};

const CARD_TITLE: &str = "ETH/USD Prediction";

/// Visual treatment of the status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeStyle {
    /// Open market, accepting predictions
    Active,
    /// Resolved market
    Settled,
    /// Closed or unrecognized
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub style: BadgeStyle,
}

/// Defined for every state, including values the ABI does not know
pub fn status_badge(state: MarketState) -> StatusBadge {
    let style = match state {
        MarketState::Open => BadgeStyle::Active,
        MarketState::Resolved => BadgeStyle::Settled,
        MarketState::Closed | MarketState::Unknown(_) => BadgeStyle::Muted,
    };

    StatusBadge {
        label: state.as_str(),
        style,
    }
}

/// The card's call to action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardAction {
    pub label: &'static str,
    pub enabled: bool,
}

pub fn card_action(state: MarketState) -> CardAction {
    match state {
        MarketState::Open => CardAction {
            label: "Make Prediction",
            enabled: true,
        },
        MarketState::Closed => CardAction {
            label: "Closed",
            enabled: false,
        },
        MarketState::Resolved => CardAction {
            label: "Resolved",
            enabled: false,
        },
        MarketState::Unknown(_) => CardAction {
            label: "Unavailable",
            enabled: false,
        },
    }
}

/// Display fields for one market card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketCardView {
    pub address: Address,
    pub title: &'static str,
    /// "$3500.00"
    pub target_price: String,
    pub status: StatusBadge,
    pub time_remaining: String,
    /// Ether amounts, e.g. "1.5 ETH"
    pub pool_above: String,
    pub pool_below: String,
    pub total_pool: String,
    /// Only for resolved markets with a recorded price
    pub final_price: Option<String>,
    pub action: CardAction,
}

impl MarketCardView {
    pub fn from_snapshot(snapshot: &MarketSnapshot, now: DateTime<Utc>) -> Self {
        let final_price = (snapshot.state == MarketState::Resolved
            && !snapshot.final_price.is_zero())
        .then(|| format!("${}", format_price(snapshot.final_price)));

        Self {
            address: snapshot.address,
            title: CARD_TITLE,
            target_price: format!("${}", format_price(snapshot.target_price)),
            status: status_badge(snapshot.state),
            time_remaining: time_remaining(snapshot.end_time, snapshot.state, now),
            pool_above: format!("{} ETH", format_ether(snapshot.total_pool_above)),
            pool_below: format!("{} ETH", format_ether(snapshot.total_pool_below)),
            total_pool: format!("{} ETH", format_ether(snapshot.total_pool())),
            final_price,
            action: card_action(snapshot.state),
        }
    }
}
