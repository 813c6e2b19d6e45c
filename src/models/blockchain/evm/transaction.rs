//! EVM pending transaction record.
//!
//! Pending transactions are kept as the raw JSON object returned by
//! `eth_getTransactionByHash`. Fields stay in their wire encoding; units are converted
//! only when a transaction is presented.

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Recipient of a transaction as found on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient<'a> {
	/// `to` holds an address
	Address(&'a str),
	/// `to` is `null`, the transaction deploys a contract
	ContractCreation,
	/// `to` is absent or not a string
	Unknown,
}

/// Wrapper around the JSON transaction object returned by the node
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Transaction(pub Map<String, Value>);

impl Transaction {
	/// Get a string field, `None` when absent or not a string
	pub fn str_field(&self, name: &str) -> Option<&str> {
		self.0.get(name).and_then(Value::as_str)
	}

	/// Get the transaction hash
	pub fn hash(&self) -> Option<&str> {
		self.str_field("hash")
	}

	/// Get the sender address
	pub fn sender(&self) -> Option<&str> {
		self.str_field("from")
	}

	/// Get the recipient
	pub fn recipient(&self) -> Recipient<'_> {
		match self.0.get("to") {
			Some(Value::String(address)) => Recipient::Address(address),
			Some(Value::Null) => Recipient::ContractCreation,
			_ => Recipient::Unknown,
		}
	}

	/// Get the raw hex encoded value in wei
	pub fn value(&self) -> Option<&str> {
		self.str_field("value")
	}

	/// Get the raw hex encoded gas price in wei
	///
	/// EIP-1559 transactions from some nodes omit `gasPrice` while pending; `maxFeePerGas` is
	/// not substituted.
	pub fn gas_price(&self) -> Option<&str> {
		self.str_field("gasPrice")
	}
}

impl From<Map<String, Value>> for Transaction {
	fn from(fields: Map<String, Value>) -> Self {
		Self(fields)
	}
}

impl Deref for Transaction {
	type Target = Map<String, Value>;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
