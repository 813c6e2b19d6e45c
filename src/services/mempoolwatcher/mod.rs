//! Mempool watcher service.
//!
//! - Subscription loop with reconnect and backoff
//! - Per-transaction lookup tasks and their outcomes
//! - Error handling specific to watching pending transactions

mod error;
mod handler;
mod service;

pub use error::MempoolWatcherError;
pub use handler::{
	process_transaction, InFlightGuard, TransactionOutcome, WatcherStats, WatcherStatsSnapshot,
};
pub use service::{MempoolWatcherService, WatcherSettings, WatcherState};
