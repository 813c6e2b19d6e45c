//! Value filter for pending transactions.
//!
//! Decides whether a transaction is worth reporting based on its `value` field. Plain
//! transfers of zero value and records without a value are dropped. When the threshold
//! is applied, a transaction must carry strictly more than the threshold.

use std::{collections::HashMap, fmt};

use alloy::primitives::U256;
use rust_decimal::Decimal;

use crate::{
	models::{EVMTransaction, MonitorConfig},
	services::filter::error::FilterError,
	utils::units::{decode_quantity, ether_to_wei, wei_to_ether, Ether},
};

/// Why a transaction was not reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
	/// `value` is absent or not a string
	MissingValue,
	ZeroValue,
	/// `value` does not exceed the applied threshold
	BelowThreshold,
}

impl fmt::Display for SkipReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::MissingValue => write!(f, "missing value"),
			Self::ZeroValue => write!(f, "zero value"),
			Self::BelowThreshold => write!(f, "below threshold"),
		}
	}
}

/// Outcome of [`ValueFilter::evaluate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
	/// Report the transaction; carries its value in ether
	Pass(Ether),
	Skip(SkipReason),
}

/// Filters transactions on their transferred value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFilter {
	threshold: Decimal,
	threshold_wei: U256,
	apply_threshold: bool,
}

impl ValueFilter {
	/// Creates a filter. `threshold` is in ether and is only consulted when
	/// `apply_threshold` is set.
	pub fn new(threshold: Decimal, apply_threshold: bool) -> Result<Self, FilterError> {
		let threshold_wei = ether_to_wei(threshold).map_err(|e| {
			FilterError::invalid_threshold(
				"Value threshold cannot be expressed in wei",
				Some(Box::new(e)),
				Some(HashMap::from([(
					"threshold".to_string(),
					threshold.to_string(),
				)])),
			)
		})?;

		Ok(Self {
			threshold,
			threshold_wei,
			apply_threshold,
		})
	}

	pub fn from_config(config: &MonitorConfig) -> Result<Self, FilterError> {
		Self::new(config.value_threshold, config.apply_value_threshold)
	}

	pub fn threshold(&self) -> Decimal {
		self.threshold
	}

	pub fn applies_threshold(&self) -> bool {
		self.apply_threshold
	}

	/// Evaluates a transaction.
	///
	/// # Errors
	/// Returns [`FilterError::InvalidValue`] when `value` is a string that is not a valid
	/// hex quantity.
	pub fn evaluate(&self, transaction: &EVMTransaction) -> Result<FilterDecision, FilterError> {
		let Some(raw) = transaction.value() else {
			return Ok(FilterDecision::Skip(SkipReason::MissingValue));
		};

		let wei = decode_quantity(raw).map_err(|e| invalid_value(transaction, raw, e))?;
		if wei.is_zero() {
			return Ok(FilterDecision::Skip(SkipReason::ZeroValue));
		}
		if self.apply_threshold && wei <= self.threshold_wei {
			return Ok(FilterDecision::Skip(SkipReason::BelowThreshold));
		}

		Ok(FilterDecision::Pass(wei_to_ether(wei)))
	}
}

fn invalid_value(
	transaction: &EVMTransaction,
	raw: &str,
	error: crate::utils::units::UnitConversionError,
) -> FilterError {
	let mut metadata = HashMap::from([("value".to_string(), raw.to_string())]);
	if let Some(hash) = transaction.hash() {
		metadata.insert("tx_hash".to_string(), hash.to_string());
	}
	FilterError::invalid_value(
		"Failed to decode transaction value",
		Some(Box::new(error)),
		Some(metadata),
	)
}
