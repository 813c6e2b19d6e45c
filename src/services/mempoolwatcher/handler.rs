//! Per-transaction processing: lookup, filter, presentation.

use std::{
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
	time::Duration,
};

use alloy::primitives::TxHash;
use tracing::{debug, instrument};

use crate::{
	services::{
		blockchain::PendingTransactionClient,
		filter::SkipReason,
		notification::{Notifier, Presentation},
	},
	utils::{logging::error::TraceableError, metrics},
};

/// How the processing of one transaction hash ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
	/// A report was written
	Reported,
	/// The value filter dropped the transaction
	Filtered(SkipReason),
	/// The node does not know the transaction (anymore)
	NotFound,
	/// The lookup failed; carries the error's trace id
	LookupFailed(String),
	/// The lookup exceeded its timeout
	TimedOut,
	/// The record could not be presented; carries the error's trace id
	PresentationFailed(String),
}

/// Resolves a hash and presents the transaction.
///
/// Never fails: every problem is confined to the returned outcome.
#[instrument(skip_all, fields(tx_hash = %hash))]
pub async fn process_transaction<C, N>(
	client: Arc<C>,
	notifier: Arc<N>,
	hash: TxHash,
	lookup_timeout: Duration,
) -> TransactionOutcome
where
	C: PendingTransactionClient,
	N: Notifier,
{
	let transaction =
		match tokio::time::timeout(lookup_timeout, client.get_transaction_by_hash(hash)).await {
			Err(_) => {
				debug!(timeout_ms = lookup_timeout.as_millis() as u64, "lookup timed out");
				return TransactionOutcome::TimedOut;
			}
			Ok(Err(e)) => return TransactionOutcome::LookupFailed(e.trace_id()),
			Ok(Ok(None)) => {
				debug!("transaction not found");
				return TransactionOutcome::NotFound;
			}
			Ok(Ok(Some(transaction))) => transaction,
		};

	match notifier.present(&transaction) {
		Ok(Presentation::Emitted) => TransactionOutcome::Reported,
		Ok(Presentation::Skipped(reason)) => {
			debug!(%reason, "transaction filtered");
			TransactionOutcome::Filtered(reason)
		}
		Err(e) => TransactionOutcome::PresentationFailed(e.trace_id()),
	}
}

/// Point-in-time copy of [`WatcherStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatcherStatsSnapshot {
	pub received: u64,
	pub reported: u64,
	pub filtered: u64,
	pub not_found: u64,
	pub failed: u64,
	pub timed_out: u64,
	pub reconnects: u64,
	pub in_flight: u64,
	pub max_in_flight: u64,
}

impl WatcherStatsSnapshot {
	/// Transactions whose processing has ended, whatever the outcome
	pub fn completed(&self) -> u64 {
		self.reported + self.filtered + self.not_found + self.failed + self.timed_out
	}
}

/// Counters of a watcher run, mirrored into the Prometheus metrics
#[derive(Debug, Default)]
pub struct WatcherStats {
	received: AtomicU64,
	reported: AtomicU64,
	filtered: AtomicU64,
	not_found: AtomicU64,
	failed: AtomicU64,
	timed_out: AtomicU64,
	reconnects: AtomicU64,
	in_flight: AtomicU64,
	max_in_flight: AtomicU64,
}

impl WatcherStats {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record_received(&self) {
		self.received.fetch_add(1, Ordering::Relaxed);
		metrics::PENDING_TRANSACTIONS_RECEIVED.inc();
	}

	pub fn record_reconnect(&self) {
		self.reconnects.fetch_add(1, Ordering::Relaxed);
		metrics::SUBSCRIPTION_RECONNECTS.inc();
	}

	pub fn record_outcome(&self, outcome: &TransactionOutcome) {
		match outcome {
			TransactionOutcome::Reported => {
				self.reported.fetch_add(1, Ordering::Relaxed);
				metrics::REPORTS_EMITTED.inc();
			}
			TransactionOutcome::Filtered(_) => {
				self.filtered.fetch_add(1, Ordering::Relaxed);
				metrics::TRANSACTIONS_FILTERED.inc();
			}
			TransactionOutcome::NotFound => {
				self.not_found.fetch_add(1, Ordering::Relaxed);
				metrics::TRANSACTIONS_NOT_FOUND.inc();
			}
			TransactionOutcome::TimedOut => {
				self.timed_out.fetch_add(1, Ordering::Relaxed);
				metrics::LOOKUPS_TIMED_OUT.inc();
			}
			TransactionOutcome::LookupFailed(_) | TransactionOutcome::PresentationFailed(_) => {
				self.failed.fetch_add(1, Ordering::Relaxed);
				metrics::TRANSACTION_FAILURES.inc();
			}
		}
	}

	/// Marks a lookup as running until the returned guard is dropped
	pub fn track_in_flight(self: &Arc<Self>) -> InFlightGuard {
		let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_in_flight.fetch_max(current, Ordering::SeqCst);
		metrics::LOOKUPS_IN_FLIGHT.inc();
		InFlightGuard {
			stats: Arc::clone(self),
		}
	}

	pub fn snapshot(&self) -> WatcherStatsSnapshot {
		WatcherStatsSnapshot {
			received: self.received.load(Ordering::Relaxed),
			reported: self.reported.load(Ordering::Relaxed),
			filtered: self.filtered.load(Ordering::Relaxed),
			not_found: self.not_found.load(Ordering::Relaxed),
			failed: self.failed.load(Ordering::Relaxed),
			timed_out: self.timed_out.load(Ordering::Relaxed),
			reconnects: self.reconnects.load(Ordering::Relaxed),
			in_flight: self.in_flight.load(Ordering::SeqCst),
			max_in_flight: self.max_in_flight.load(Ordering::SeqCst),
		}
	}
}

/// Decrements the in-flight count on drop, including when the task is aborted
#[derive(Debug)]
pub struct InFlightGuard {
	stats: Arc<WatcherStats>,
}

impl Drop for InFlightGuard {
	fn drop(&mut self) {
		self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
		metrics::LOOKUPS_IN_FLIGHT.dec();
	}
}
