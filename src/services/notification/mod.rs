//! Notification service implementation.
//!
//! Presents pending transactions that pass the value filter as plain-text reports on an
//! output sink, standard output by default. Every report is written with a single
//! `write_all` so reports from concurrent lookups never interleave.

use std::{
	collections::HashMap,
	io::{Stdout, Write},
	sync::Mutex,
};

use tracing::warn;

mod error;
mod report;

use crate::{
	models::EVMTransaction,
	services::filter::{FilterDecision, SkipReason, ValueFilter},
};

pub use error::NotificationError;
pub use report::{render, GasPriceIssue, Report, INVALID_GAS_PRICE_MARKER, REPORT_BANNER};

/// Result of presenting a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
	/// A report was written
	Emitted,
	/// The transaction was filtered out
	Skipped(SkipReason),
}

/// Interface for presenting resolved transactions
///
/// Implementations are shared by all lookup tasks.
pub trait Notifier: Send + Sync + 'static {
	/// Presents a transaction
	///
	/// # Arguments
	/// * `transaction` - The record returned by the node
	///
	/// # Returns
	/// * `Result<Presentation, NotificationError>` - Whether a report was written
	fn present(&self, transaction: &EVMTransaction) -> Result<Presentation, NotificationError>;
}

/// Writes a report for every transaction passing its [`ValueFilter`]
pub struct ReportNotifier<W = Stdout> {
	output: Mutex<W>,
	filter: ValueFilter,
}

impl ReportNotifier<Stdout> {
	/// Creates a notifier writing to standard output
	pub fn stdout(filter: ValueFilter) -> Self {
		Self::new(std::io::stdout(), filter)
	}
}

impl<W: Write + Send + 'static> ReportNotifier<W> {
	pub fn new(output: W, filter: ValueFilter) -> Self {
		Self {
			output: Mutex::new(output),
			filter,
		}
	}

	pub fn filter(&self) -> &ValueFilter {
		&self.filter
	}

	fn write_report(&self, text: &str, tx_hash: &str) -> Result<(), NotificationError> {
		let mut output = self.output.lock().map_err(|_| {
			NotificationError::internal_error("Report output lock is poisoned", None, None)
		})?;

		output
			.write_all(text.as_bytes())
			.and_then(|_| output.flush())
			.map_err(|e| {
				NotificationError::write_error(
					"Failed to write transaction report",
					Some(Box::new(e)),
					Some(HashMap::from([("tx_hash".to_string(), tx_hash.to_string())])),
				)
			})
	}
}

impl<W: Write + Send + 'static> Notifier for ReportNotifier<W> {
	fn present(&self, transaction: &EVMTransaction) -> Result<Presentation, NotificationError> {
		let tx_hash = transaction.hash().unwrap_or_default();

		let ether = match self.filter.evaluate(transaction) {
			Ok(FilterDecision::Pass(ether)) => ether,
			Ok(FilterDecision::Skip(reason)) => return Ok(Presentation::Skipped(reason)),
			Err(e) => {
				return Err(NotificationError::invalid_transaction(
					"Transaction value cannot be decoded",
					Some(Box::new(e)),
					Some(HashMap::from([("tx_hash".to_string(), tx_hash.to_string())])),
				))
			}
		};

		let report = render(transaction, ether);
		match &report.gas_price_issue {
			Some(GasPriceIssue::Missing) => {
				warn!(tx_hash, "{}: gasPrice is missing", INVALID_GAS_PRICE_MARKER)
			}
			Some(GasPriceIssue::Invalid(e)) => {
				warn!(tx_hash, error = %e, "{}", INVALID_GAS_PRICE_MARKER)
			}
			None => {}
		}

		self.write_report(&report.text, tx_hash)?;
		Ok(Presentation::Emitted)
	}
}
