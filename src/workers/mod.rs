pub mod directory_refresher;

pub use directory_refresher::{DirectoryRefresherWorker, RefreshTrigger};
