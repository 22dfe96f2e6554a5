pub mod market;
pub mod prediction;
pub mod session;

pub use market::{MarketSnapshot, MarketState};
pub use prediction::{Direction, PredictionRequest, TxReceipt};
pub use session::WalletSession;
