use std::sync::Arc;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::directory::{MarketDirectory, RefreshOutcome};
use crate::models::{MarketSnapshot, WalletSession};
use crate::view::PageView;

/// Everything the UI shows for one session: wallet, market list, and the
/// market whose prediction dialog is open
pub struct AppState {
    session: WalletSession,
    directory: Arc<MarketDirectory>,
    selected: Option<Address>,
}

impl AppState {
    pub fn new(directory: Arc<MarketDirectory>) -> Self {
        Self {
            session: WalletSession::disconnected(),
            directory,
            selected: None,
        }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn directory(&self) -> &Arc<MarketDirectory> {
        &self.directory
    }

    pub fn connect(&mut self, address: Address) {
        info!("Wallet connected: {}", address);
        self.session.connect(address);
    }

    /// Forget the account, close the dialog, and clear the market list
    pub fn disconnect(&mut self) {
        info!("Wallet disconnected");
        self.session.disconnect();
        self.selected = None;
        self.directory.reset();
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        self.directory.refresh(&self.session).await
    }

    /// Open the prediction dialog for an open market in the current list
    pub fn select_market(&mut self, address: Address) -> Option<MarketSnapshot> {
        let market = self
            .directory
            .find(address)
            .filter(|m| m.state.is_open())?;

        self.selected = Some(address);
        Some(market)
    }

    /// Latest snapshot of the selected market, if it is still listed
    pub fn selected_market(&self) -> Option<MarketSnapshot> {
        self.selected.and_then(|address| self.directory.find(address))
    }

    pub fn close_modal(&mut self) {
        self.selected = None;
    }

    pub fn page(&self, now: DateTime<Utc>) -> PageView {
        PageView::build(&self.session, &self.directory.view(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use async_trait::async_trait;

    use crate::api::ChainReader;
    use crate::error::RpcError;
    use crate::models::MarketState;

    struct StaticReader(Vec<MarketSnapshot>);

    #[async_trait]
    impl ChainReader for StaticReader {
        async fn get_all_markets(&self, _registry: Address) -> Result<Vec<Address>, RpcError> {
            Ok(self.0.iter().map(|m| m.address).collect())
        }

        async fn get_market_details(&self, market: Address) -> Result<MarketSnapshot, RpcError> {
            self.0
                .iter()
                .find(|m| m.address == market)
                .cloned()
                .ok_or(RpcError::EmptyReturn)
        }
    }

    fn market(byte: u8, state: MarketState) -> MarketSnapshot {
        MarketSnapshot {
            address: Address::repeat_byte(byte),
            target_price: U256::from(350_000_000_000u64),
            end_time: 4_000_000_000,
            state,
            total_pool_above: U256::ZERO,
            total_pool_below: U256::ZERO,
            final_price: U256::ZERO,
        }
    }

    async fn connected_app() -> AppState {
        let reader = StaticReader(vec![
            market(1, MarketState::Open),
            market(2, MarketState::Closed),
        ]);
        let directory = Arc::new(MarketDirectory::new(Arc::new(reader), Address::ZERO));
        let mut app = AppState::new(directory);
        app.connect(Address::repeat_byte(0xe0));
        app.refresh().await;
        app
    }

    #[tokio::test]
    async fn test_select_only_open_markets() {
        let mut app = connected_app().await;

        assert!(app.select_market(Address::repeat_byte(2)).is_none());
        assert!(app.selected_market().is_none());

        let selected = app.select_market(Address::repeat_byte(1)).unwrap();
        assert_eq!(selected.address, Address::repeat_byte(1));
        assert_eq!(app.selected_market().map(|m| m.address), Some(selected.address));

        app.close_modal();
        assert!(app.selected_market().is_none());
    }

    #[tokio::test]
    async fn test_disconnect_resets_state() {
        let mut app = connected_app().await;
        app.select_market(Address::repeat_byte(1));
        assert_eq!(app.directory().view().markets.len(), 2);

        app.disconnect();

        assert!(!app.session().is_connected());
        assert!(app.selected_market().is_none());
        assert!(app.directory().view().markets.is_empty());
        assert_eq!(app.page(Utc::now()), PageView::Disconnected);
    }
}
