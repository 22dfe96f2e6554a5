use std::sync::Arc;

use alloy_primitives::{utils, Address, B256, U256};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::api::ChainWriter;
use crate::error::SubmitError;
use crate::models::{MarketSnapshot, PredictionRequest, TxReceipt, WalletSession};
use crate::workers::RefreshTrigger;

/// Where the current prediction attempt stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    /// Nothing sent; carries the message of a failed validation, if any
    Idle { validation_error: Option<String> },
    /// Checking the request before anything touches the network
    Validating,
    /// `predict` dispatched, waiting for the wallet to accept it
    Pending { market: Address },
    /// Accepted, waiting for the transaction to be mined
    Confirming { tx_hash: B256 },
    /// Mined with a successful status
    Success { receipt: TxReceipt },
    /// Rejected, reverted, or confirmation failed; may be retried
    Failed { error: String },
}

impl SubmissionState {
    pub fn idle() -> Self {
        SubmissionState::Idle {
            validation_error: None,
        }
    }

    /// A transaction may be on its way; no new attempt can start
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            SubmissionState::Validating
                | SubmissionState::Pending { .. }
                | SubmissionState::Confirming { .. }
        )
    }
}

impl Default for SubmissionState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Parse an ether amount typed by the user into wei.
///
/// Accepts plain decimals only ("1", "0.5"); the result must be
/// strictly positive. There is no upper bound here, the market contract
/// enforces its own limits.
pub fn parse_stake(amount: &str) -> Result<U256, SubmitError> {
    let amount = amount.trim();

    let well_formed = amount.chars().any(|c| c.is_ascii_digit())
        && amount.chars().all(|c| c.is_ascii_digit() || c == '.')
        && amount.matches('.').count() <= 1;

    if !well_formed {
        return Err(SubmitError::InvalidAmount);
    }

    let wei = utils::parse_ether(amount).map_err(|_| SubmitError::InvalidAmount)?;

    if wei.is_zero() {
        return Err(SubmitError::InvalidAmount);
    }

    Ok(wei)
}

/// Drives one prediction at a time from input to mined transaction.
///
/// Every transition is published on a watch channel. A validated request
/// produces exactly one `predict` transaction; nothing is retried
/// automatically.
pub struct PredictionSubmitter {
    writer: Arc<dyn ChainWriter>,
    state: watch::Sender<SubmissionState>,
    refresh_tx: Option<mpsc::Sender<RefreshTrigger>>,
}

impl PredictionSubmitter {
    /// Create a new submitter
    pub fn new(writer: Arc<dyn ChainWriter>) -> Self {
        let (state, _) = watch::channel(SubmissionState::idle());

        Self {
            writer,
            state,
            refresh_tx: None,
        }
    }

    /// Ask for a directory refresh whenever a prediction is confirmed
    pub fn with_refresh_trigger(mut self, refresh_tx: mpsc::Sender<RefreshTrigger>) -> Self {
        self.refresh_tx = Some(refresh_tx);
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// Close the attempt and go back to Idle; ignored while in flight
    pub fn reset(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_in_flight() {
                false
            } else {
                *state = SubmissionState::idle();
                true
            }
        })
    }

    /// Validate `request` against `market` and, if it passes, send it.
    ///
    /// Starting from Failed counts as a retry and issues a fresh transaction.
    pub async fn submit(
        &self,
        session: &WalletSession,
        market: &MarketSnapshot,
        request: PredictionRequest,
    ) -> Result<TxReceipt, SubmitError> {
        let claimed = self.state.send_if_modified(|state| {
            if state.is_in_flight() {
                false
            } else {
                *state = SubmissionState::Validating;
                true
            }
        });

        if !claimed {
            return Err(SubmitError::InFlight);
        }

        let _attempt = AttemptGuard { state: &self.state };

        let (from, value) = match validate(session, market, &request) {
            Ok(checked) => checked,
            Err(e) => {
                warn!("Prediction not sent: {}", e);
                self.state.send_replace(SubmissionState::Idle {
                    validation_error: Some(e.to_string()),
                });
                return Err(e);
            }
        };

        self.state.send_replace(SubmissionState::Pending {
            market: request.market,
        });

        info!(
            "Submitting prediction | Market {} | {} | {} wei",
            request.market, request.direction, value
        );

        let tx_hash = match self
            .writer
            .send_prediction(from, request.market, request.direction, value)
            .await
        {
            Ok(hash) => hash,
            Err(e) => return Err(self.fail(SubmitError::Rejected(e))),
        };

        self.state
            .send_replace(SubmissionState::Confirming { tx_hash });

        let receipt = match self.writer.wait_for_receipt(tx_hash).await {
            Ok(receipt) => receipt,
            Err(e) => return Err(self.fail(SubmitError::Confirmation(e))),
        };

        if !receipt.success {
            return Err(self.fail(SubmitError::Reverted(tx_hash)));
        }

        info!(
            "Prediction confirmed | Tx {} | Block {:?}",
            tx_hash, receipt.block_number
        );
        debug!(
            "Receipt: {}",
            serde_json::to_string(&receipt).unwrap_or_default()
        );

        self.state.send_replace(SubmissionState::Success {
            receipt: receipt.clone(),
        });

        self.request_refresh(request.market, tx_hash).await;

        Ok(receipt)
    }

    fn fail(&self, err: SubmitError) -> SubmitError {
        error!("Prediction failed: {}", err);
        self.state.send_replace(SubmissionState::Failed {
            error: err.to_string(),
        });
        err
    }

    async fn request_refresh(&self, market: Address, tx_hash: B256) {
        let Some(refresh_tx) = &self.refresh_tx else {
            return;
        };

        let trigger = RefreshTrigger::PredictionConfirmed { market, tx_hash };
        if let Err(e) = refresh_tx.send(trigger).await {
            warn!("Failed to request market refresh: {}", e);
        }
    }
}

/// Fails the claimed attempt if `submit` is dropped before reaching a
/// terminal state, so a cancelled attempt can be retried or reset
struct AttemptGuard<'a> {
    state: &'a watch::Sender<SubmissionState>,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        let cancelled = self.state.send_if_modified(|state| {
            if state.is_in_flight() {
                *state = SubmissionState::Failed {
                    error: "cancelled".to_string(),
                };
                true
            } else {
                false
            }
        });

        if cancelled {
            warn!("Prediction attempt cancelled before completion");
        }
    }
}

/// Checks that need no network access; returns the sender and stake in wei
fn validate(
    session: &WalletSession,
    market: &MarketSnapshot,
    request: &PredictionRequest,
) -> Result<(Address, U256), SubmitError> {
    let value = parse_stake(&request.amount)?;

    let from = session.address().ok_or(SubmitError::NotConnected)?;

    if request.market != market.address {
        return Err(SubmitError::MarketMismatch {
            requested: request.market,
            selected: market.address,
        });
    }

    if !market.state.is_open() {
        return Err(SubmitError::MarketNotOpen(market.address));
    }

    Ok((from, value))
}
