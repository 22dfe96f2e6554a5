pub mod fetcher;

pub use fetcher::{DirectoryView, MarketDirectory, RefreshOutcome};
