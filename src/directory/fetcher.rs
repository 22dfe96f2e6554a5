use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::Address;
use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::ChainReader;
use crate::models::{MarketSnapshot, WalletSession};

/// What the market list currently shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryView {
    /// Snapshots in registry order
    pub markets: Vec<MarketSnapshot>,

    /// True only while a batch is in flight
    pub loading: bool,

    /// Request id of the batch that produced `markets` (0 = none yet)
    pub request_id: u64,
}

/// Result of one refresh call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The batch was the latest request and replaced the view
    Applied { request_id: u64, markets: usize },
    /// A newer request or a reset superseded the batch
    Discarded { request_id: u64 },
}

/// Fetches every market listed by the registry and publishes the result.
///
/// Each refresh takes a fresh request id; a batch only lands in the view if
/// its id is still the latest when it completes, so a slow superseded batch
/// can never overwrite newer data. Resetting (wallet disconnect) also bumps
/// the id, which orphans whatever is in flight.
pub struct MarketDirectory {
    reader: Arc<dyn ChainReader>,
    registry: Address,
    latest_request: AtomicU64,
    view: watch::Sender<DirectoryView>,
}

/// Clears the loading flag when a batch finishes, however it finishes
struct LoadingGuard<'a> {
    directory: &'a MarketDirectory,
    request_id: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let request_id = self.request_id;
        let latest = &self.directory.latest_request;

        self.directory.view.send_if_modified(|view| {
            if latest.load(Ordering::SeqCst) == request_id && view.loading {
                view.loading = false;
                true
            } else {
                false
            }
        });
    }
}

impl MarketDirectory {
    /// Create a directory reading from `registry`
    pub fn new(reader: Arc<dyn ChainReader>, registry: Address) -> Self {
        let (view, _) = watch::channel(DirectoryView::default());

        Self {
            reader,
            registry,
            latest_request: AtomicU64::new(0),
            view,
        }
    }

    /// Registry contract this directory lists
    pub fn registry(&self) -> Address {
        self.registry
    }

    /// Current view
    pub fn view(&self) -> DirectoryView {
        self.view.borrow().clone()
    }

    /// Receive every view change
    pub fn subscribe(&self) -> watch::Receiver<DirectoryView> {
        self.view.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.view.borrow().loading
    }

    /// Find a market in the current view
    pub fn find(&self, address: Address) -> Option<MarketSnapshot> {
        self.view
            .borrow()
            .markets
            .iter()
            .find(|m| m.address == address)
            .cloned()
    }

    /// Drop the current list and orphan any in-flight batch
    pub fn reset(&self) {
        self.view.send_modify(|view| {
            let request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
            view.markets.clear();
            view.loading = false;
            view.request_id = request_id;
        });
        debug!("Market directory reset");
    }

    /// Re-read the registry and every market it lists
    pub async fn refresh(&self, session: &WalletSession) -> RefreshOutcome {
        match self.begin_refresh(session) {
            Some(request_id) => self.finish_refresh(request_id).await,
            None => self.cleared(),
        }
    }

    /// Claim a request id for `session`, or reset when it is disconnected.
    ///
    /// Callers that share the session behind a lock should call this while
    /// still holding it: a disconnect that lands afterwards bumps the id and
    /// the batch is discarded.
    pub fn begin_refresh(&self, session: &WalletSession) -> Option<u64> {
        if !session.is_connected() {
            self.reset();
            return None;
        }

        Some(self.begin())
    }

    /// Fetch and publish the batch claimed by `begin_refresh`
    pub async fn finish_refresh(&self, request_id: u64) -> RefreshOutcome {
        let _loading = LoadingGuard {
            directory: self,
            request_id,
        };

        let markets = self.fetch_all().await;
        self.apply(request_id, markets)
    }

    /// Outcome of a refresh that only cleared the list
    pub fn cleared(&self) -> RefreshOutcome {
        RefreshOutcome::Applied {
            request_id: self.latest_request.load(Ordering::SeqCst),
            markets: 0,
        }
    }

    /// Issue a new request id and raise the loading flag
    fn begin(&self) -> u64 {
        let mut request_id = 0;
        self.view.send_modify(|view| {
            request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
            view.loading = true;
        });

        debug!("Market directory request {} started", request_id);
        request_id
    }

    /// Replace the view if `request_id` is still current
    fn apply(&self, request_id: u64, markets: Vec<MarketSnapshot>) -> RefreshOutcome {
        let count = markets.len();

        let applied = self.view.send_if_modified(|view| {
            if self.latest_request.load(Ordering::SeqCst) != request_id {
                return false;
            }
            view.markets = markets;
            view.loading = false;
            view.request_id = request_id;
            true
        });

        if applied {
            info!("Market directory updated: {} markets (request {})", count, request_id);
            RefreshOutcome::Applied {
                request_id,
                markets: count,
            }
        } else {
            debug!("Discarding stale market batch (request {})", request_id);
            RefreshOutcome::Discarded { request_id }
        }
    }

    /// Registry read followed by a concurrent fan-out over every market
    async fn fetch_all(&self) -> Vec<MarketSnapshot> {
        let addresses = match self.reader.get_all_markets(self.registry).await {
            Ok(addresses) => addresses,
            Err(e) => {
                error!("Failed to read market registry {}: {}", self.registry, e);
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let addresses: Vec<Address> = addresses
            .into_iter()
            .filter(|a| seen.insert(*a))
            .collect();

        if addresses.is_empty() {
            debug!("Registry lists no markets");
            return Vec::new();
        }

        debug!("Fetching details for {} markets", addresses.len());

        // join_all keeps input order regardless of completion order
        let results = join_all(addresses.iter().map(|&address| self.fetch_one(address))).await;

        results.into_iter().flatten().collect()
    }

    async fn fetch_one(&self, address: Address) -> Option<MarketSnapshot> {
        match self.reader.get_market_details(address).await {
            Ok(snapshot) => {
                debug!(
                    "Market {} is {}: {}",
                    address,
                    snapshot.state.as_str(),
                    serde_json::to_string(&snapshot).unwrap_or_default()
                );
                Some(snapshot)
            }
            Err(e) => {
                warn!("Failed to fetch market {}: {}", address, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicBool;

    use alloy_primitives::{address, U256};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::error::RpcError;
    use crate::models::MarketState;

    const REGISTRY: Address = address!("00000000000000000000000000000000000000f0");
    const USER: Address = address!("00000000000000000000000000000000000000e0");

    fn snapshot(address: Address) -> MarketSnapshot {
        MarketSnapshot {
            address,
            target_price: U256::from(350_000_000_000u64),
            end_time: 4_000_000_000,
            state: MarketState::Open,
            total_pool_above: U256::ZERO,
            total_pool_below: U256::ZERO,
            final_price: U256::ZERO,
        }
    }

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[derive(Default)]
    struct FakeReader {
        markets: Vec<Address>,
        registry_fails: bool,
        details: HashMap<Address, MarketSnapshot>,
        gate: Option<Arc<Notify>>,
        gated_once: AtomicBool,
    }

    impl FakeReader {
        fn listing(markets: Vec<Address>) -> Self {
            let details = markets.iter().map(|&a| (a, snapshot(a))).collect();
            Self {
                markets,
                details,
                ..Default::default()
            }
        }

        fn failing(mut self, address: Address) -> Self {
            self.details.remove(&address);
            self
        }
    }

    #[async_trait]
    impl ChainReader for FakeReader {
        async fn get_all_markets(&self, registry: Address) -> Result<Vec<Address>, RpcError> {
            assert_eq!(registry, REGISTRY);

            if let Some(gate) = &self.gate {
                if !self.gated_once.swap(true, Ordering::SeqCst) {
                    gate.notified().await;
                }
            }

            if self.registry_fails {
                return Err(RpcError::Malformed("registry down".to_string()));
            }
            Ok(self.markets.clone())
        }

        async fn get_market_details(&self, market: Address) -> Result<MarketSnapshot, RpcError> {
            self.details
                .get(&market)
                .cloned()
                .ok_or(RpcError::EmptyReturn)
        }
    }

    fn directory(reader: FakeReader) -> MarketDirectory {
        MarketDirectory::new(Arc::new(reader), REGISTRY)
    }

    #[tokio::test]
    async fn test_failing_markets_are_dropped() {
        let all: Vec<Address> = (1..=6).map(addr).collect();
        let reader = FakeReader::listing(all.clone())
            .failing(addr(2))
            .failing(addr(5));
        let directory = directory(reader);

        let outcome = directory.refresh(&WalletSession::connected(USER)).await;
        assert!(matches!(outcome, RefreshOutcome::Applied { markets: 4, .. }));

        let view = directory.view();
        let listed: Vec<Address> = view.markets.iter().map(|m| m.address).collect();
        assert_eq!(listed, vec![addr(1), addr(3), addr(4), addr(6)]);
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn test_registry_failure_yields_empty_list() {
        let mut reader = FakeReader::listing(vec![addr(1)]);
        reader.registry_fails = true;
        let directory = directory(reader);

        directory.refresh(&WalletSession::connected(USER)).await;

        let view = directory.view();
        assert!(view.markets.is_empty());
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn test_disconnected_session_yields_empty_list() {
        let directory = directory(FakeReader::listing(vec![addr(1)]));
        directory.refresh(&WalletSession::connected(USER)).await;
        assert_eq!(directory.view().markets.len(), 1);

        directory.refresh(&WalletSession::disconnected()).await;
        assert!(directory.view().markets.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_addresses_listed_once() {
        let mut reader = FakeReader::listing(vec![addr(1), addr(2)]);
        reader.markets = vec![addr(1), addr(2), addr(1)];
        let directory = directory(reader);

        directory.refresh(&WalletSession::connected(USER)).await;
        assert_eq!(directory.view().markets.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_batch_is_discarded() {
        let gate = Arc::new(Notify::new());
        let mut reader = FakeReader::listing(vec![addr(1)]);
        reader.gate = Some(Arc::clone(&gate));
        let directory = Arc::new(directory(reader));
        let session = WalletSession::connected(USER);

        let slow = {
            let directory = Arc::clone(&directory);
            let session = session.clone();
            tokio::spawn(async move { directory.refresh(&session).await })
        };

        while !directory.is_loading() {
            tokio::task::yield_now().await;
        }

        let fresh = directory.refresh(&session).await;
        assert!(matches!(fresh, RefreshOutcome::Applied { request_id: 2, .. }));

        gate.notify_one();
        let stale = slow.await.unwrap();
        assert_eq!(stale, RefreshOutcome::Discarded { request_id: 1 });

        let view = directory.view();
        assert_eq!(view.request_id, 2);
        assert_eq!(view.markets.len(), 1);
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn test_reset_orphans_in_flight_batch() {
        let gate = Arc::new(Notify::new());
        let mut reader = FakeReader::listing(vec![addr(1)]);
        reader.gate = Some(Arc::clone(&gate));
        let directory = Arc::new(directory(reader));

        let in_flight = {
            let directory = Arc::clone(&directory);
            tokio::spawn(async move { directory.refresh(&WalletSession::connected(USER)).await })
        };

        while !directory.is_loading() {
            tokio::task::yield_now().await;
        }

        directory.reset();
        gate.notify_one();

        let outcome = in_flight.await.unwrap();
        assert!(matches!(outcome, RefreshOutcome::Discarded { .. }));
        assert!(directory.view().markets.is_empty());
        assert!(!directory.is_loading());
    }

    #[tokio::test]
    async fn test_disconnect_after_claim_discards_batch() {
        let directory = directory(FakeReader::listing(vec![addr(1)]));

        // Session was read as connected, then the wallet disconnected
        let request_id = directory
            .begin_refresh(&WalletSession::connected(USER))
            .unwrap();
        directory.reset();

        let outcome = directory.finish_refresh(request_id).await;
        assert_eq!(outcome, RefreshOutcome::Discarded { request_id });

        let view = directory.view();
        assert!(view.markets.is_empty());
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn test_find() {
        let directory = directory(FakeReader::listing(vec![addr(1), addr(2)]));
        directory.refresh(&WalletSession::connected(USER)).await;

        assert_eq!(directory.registry(), REGISTRY);
        assert_eq!(directory.find(addr(2)).map(|m| m.address), Some(addr(2)));
        assert!(directory.find(addr(9)).is_none());
    }
}
