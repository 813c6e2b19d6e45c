//! Plain-text transaction report.

use std::fmt::Write;

use crate::{
	models::{EVMRecipient, EVMTransaction},
	utils::units::{value_in_sub_unit, Ether, UnitConversionError},
};

pub const REPORT_BANNER: &str = "*** NEW TX DETECTED ***";
pub const INVALID_GAS_PRICE_MARKER: &str = "Invalid gas price";

const UNKNOWN_FIELD: &str = "unknown";
const CONTRACT_CREATION: &str = "contract creation";

/// Why the gas price could not be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GasPriceIssue {
	/// `gasPrice` is absent or not a string
	Missing,
	Invalid(UnitConversionError),
}

/// A rendered report and any problem found while rendering it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
	pub text: String,
	pub gas_price_issue: Option<GasPriceIssue>,
}

/// Renders the report of a transaction whose value in ether is `ether`.
///
/// Without a usable gas price the report starts with the invalid gas price marker and
/// leaves out the `GAS PRICE` line.
pub fn render(transaction: &EVMTransaction, ether: Ether) -> Report {
	let gas_price = match transaction.gas_price() {
		Some(raw) => value_in_sub_unit(raw).map_err(GasPriceIssue::Invalid),
		None => Err(GasPriceIssue::Missing),
	};

	let recipient = match transaction.recipient() {
		EVMRecipient::Address(address) => address,
		EVMRecipient::ContractCreation => CONTRACT_CREATION,
		EVMRecipient::Unknown => UNKNOWN_FIELD,
	};

	// Writing into a String cannot fail
	let mut text = String::new();
	if gas_price.is_err() {
		let _ = writeln!(text, "{}", INVALID_GAS_PRICE_MARKER);
	}
	let _ = writeln!(text, "{}", REPORT_BANNER);
	let _ = writeln!(
		text,
		"TX HASH: {}",
		transaction.hash().unwrap_or(UNKNOWN_FIELD)
	);
	let _ = writeln!(
		text,
		"FROM: {}",
		transaction.sender().unwrap_or(UNKNOWN_FIELD)
	);
	let _ = writeln!(text, "TO: {}", recipient);
	if let Ok(gwei) = &gas_price {
		let _ = writeln!(text, "GAS PRICE: {} Gwei", gwei);
	}
	let _ = writeln!(text, "ETH: {}", ether);

	Report {
		text,
		gas_price_issue: gas_price.err(),
	}
}
