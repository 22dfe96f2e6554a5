use std::fmt::Write;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};

use crate::directory::DirectoryView;
use crate::models::WalletSession;
use crate::submit::SubmissionState;
use crate::view::card::MarketCardView;
use crate::view::format::short_address;

const APP_TITLE: &str = "Predict and Win";
const TAGLINE: &str = "Decentralized prediction markets on Ethereum";

/// What the main screen shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageView {
    /// Landing screen, no wallet yet
    Disconnected,
    Connected { account: Address, body: PageBody },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageBody {
    Loading,
    Empty,
    Markets(Vec<MarketCardView>),
}

impl PageView {
    pub fn build(session: &WalletSession, view: &DirectoryView, now: DateTime<Utc>) -> Self {
        let Some(account) = session.address() else {
            return PageView::Disconnected;
        };

        let body = if view.loading {
            PageBody::Loading
        } else if view.markets.is_empty() {
            PageBody::Empty
        } else {
            PageBody::Markets(
                view.markets
                    .iter()
                    .map(|m| MarketCardView::from_snapshot(m, now))
                    .collect(),
            )
        };

        PageView::Connected { account, body }
    }
}

pub fn render_page(page: &PageView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", APP_TITLE);

    match page {
        PageView::Disconnected => {
            let _ = writeln!(out, "{}", TAGLINE);
            let _ = writeln!(out);
            let _ = writeln!(out, "Connect a wallet (set WALLET_ADDRESS) to see markets.");
        }
        PageView::Connected { account, body } => {
            let _ = writeln!(out, "Connected: {}", short_address(*account));
            let _ = writeln!(out);

            match body {
                PageBody::Loading => {
                    let _ = writeln!(out, "Loading markets...");
                }
                PageBody::Empty => {
                    let _ = writeln!(out, "No markets available. Create one to get started!");
                }
                PageBody::Markets(cards) => {
                    for card in cards {
                        out.push_str(&render_card(card));
                        out.push('\n');
                    }
                }
            }
        }
    }

    out
}

pub fn render_card(card: &MarketCardView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "+ {} [{}]", card.title, card.status.label);
    let _ = writeln!(out, "| Market:          {}", card.address);
    let _ = writeln!(out, "| Target:          {}", card.target_price);
    let _ = writeln!(out, "| Time Remaining:  {}", card.time_remaining);
    let _ = writeln!(out, "| Pool Above:      {}", card.pool_above);
    let _ = writeln!(out, "| Pool Below:      {}", card.pool_below);
    let _ = writeln!(out, "| Total Pool:      {}", card.total_pool);
    if let Some(final_price) = &card.final_price {
        let _ = writeln!(out, "| Final Price:     {}", final_price);
    }

    if card.action.enabled {
        let _ = writeln!(out, "+ [{}]", card.action.label);
    } else {
        let _ = writeln!(out, "+ ({})", card.action.label);
    }

    out
}

/// One-line status for the prediction dialog
pub fn render_submission(state: &SubmissionState) -> String {
    match state {
        SubmissionState::Idle {
            validation_error: None,
        } => String::new(),
        SubmissionState::Idle {
            validation_error: Some(error),
        } => format!("Error: {}", error),
        SubmissionState::Validating => "Validating...".to_string(),
        SubmissionState::Pending { market } => {
            format!("Processing... confirm the prediction on {} in your wallet", market)
        }
        SubmissionState::Confirming { tx_hash } => {
            format!("Processing... waiting for {} to be mined", tx_hash)
        }
        SubmissionState::Success { receipt } => match receipt.block_number {
            Some(block) => format!(
                "Success! Your prediction has been submitted successfully (tx {}, block {}).",
                receipt.transaction_hash, block
            ),
            None => format!(
                "Success! Your prediction has been submitted successfully (tx {}).",
                receipt.transaction_hash
            ),
        },
        SubmissionState::Failed { error } => format!("Transaction failed: {}", error),
    }
}
