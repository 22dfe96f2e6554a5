use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use tokio::sync::{mpsc, RwLock};
use tokio::time;
use tracing::{info, warn};

use crate::directory::RefreshOutcome;
use crate::state::AppState;

/// Reasons to re-read the market directory outside the regular interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Pools changed because our own prediction was mined
    PredictionConfirmed { market: Address, tx_hash: B256 },
}

/// Worker that keeps the market directory current
pub struct DirectoryRefresherWorker {
    app: Arc<RwLock<AppState>>,
    trigger_rx: mpsc::Receiver<RefreshTrigger>,
    refresh_interval: Duration,
}

impl DirectoryRefresherWorker {
    /// Create a new directory refresher worker
    pub fn new(
        app: Arc<RwLock<AppState>>,
        trigger_rx: mpsc::Receiver<RefreshTrigger>,
        refresh_interval_secs: u64,
    ) -> Self {
        Self {
            app,
            trigger_rx,
            refresh_interval: Duration::from_secs(refresh_interval_secs),
        }
    }

    /// Run the worker loop
    pub async fn run(mut self) {
        info!(
            "Directory refresher started (interval: {:?})",
            self.refresh_interval
        );

        // Run initial refresh immediately
        self.refresh().await;

        let mut interval = time::interval(self.refresh_interval);
        interval.tick().await; // Skip first tick (already ran)

        let mut triggers_open = true;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.refresh().await;
                }
                trigger = self.trigger_rx.recv(), if triggers_open => {
                    match trigger {
                        Some(trigger) => {
                            info!("Refresh requested: {:?}", trigger);
                            self.refresh().await;
                        }
                        None => {
                            warn!("Refresh trigger channel closed, interval refresh only");
                            triggers_open = false;
                        }
                    }
                }
            }
        }
    }

    /// Perform a single refresh against the current session
    pub async fn refresh(&self) -> RefreshOutcome {
        let app = self.app.read().await;
        let directory = Arc::clone(app.directory());
        // Claim the request while the session cannot change under us
        let request_id = directory.begin_refresh(app.session());
        drop(app); // Release lock before RPC calls

        match request_id {
            Some(request_id) => directory.finish_refresh(request_id).await,
            None => directory.cleared(),
        }
    }
}
