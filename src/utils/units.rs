//! Conversion between wire-encoded wei quantities and human units.
//!
//! Node RPC returns amounts as hex quantities (`"0x1bc16d674ec80000"`). Decoding follows the
//! JSON-RPC quantity rules: a `0x` prefix is mandatory, at least one digit is required,
//! leading zeros are rejected and the number must fit in 256 bits.
//!
//! Ether values are exact over the whole 256-bit range; gwei values are truncated toward zero.

use std::fmt;

use alloy::primitives::{utils::format_ether, U256};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::utils::constants::{ETHER_DECIMALS, WEI_PER_GWEI};

/// Errors produced while decoding or converting a wire quantity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitConversionError {
	#[error("empty hex string")]
	Empty,

	#[error("hex string without 0x prefix: {0}")]
	MissingPrefix(String),

	#[error("hex string \"0x\"")]
	EmptyNumber,

	#[error("hex number with leading zero digits: {0}")]
	LeadingZero(String),

	#[error("invalid hex string: {0}")]
	InvalidHex(String),

	#[error("hex number > 256 bits: {0}")]
	TooLarge(String),

	#[error("negative amounts are not allowed: {0}")]
	NegativeAmount(String),

	#[error("amount has more than {ETHER_DECIMALS} decimal places: {0}")]
	TooManyDecimals(String),
}

/// Decodes a hex quantity (`0x`-prefixed, no leading zeros) into a 256-bit integer.
pub fn decode_quantity(raw: &str) -> Result<U256, UnitConversionError> {
	if raw.is_empty() {
		return Err(UnitConversionError::Empty);
	}

	let digits = raw
		.strip_prefix("0x")
		.or_else(|| raw.strip_prefix("0X"))
		.ok_or_else(|| UnitConversionError::MissingPrefix(raw.to_string()))?;

	if digits.is_empty() {
		return Err(UnitConversionError::EmptyNumber);
	}
	if digits.len() > 1 && digits.starts_with('0') {
		return Err(UnitConversionError::LeadingZero(raw.to_string()));
	}
	if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
		return Err(UnitConversionError::InvalidHex(raw.to_string()));
	}
	if digits.len() > 64 {
		return Err(UnitConversionError::TooLarge(raw.to_string()));
	}

	U256::from_str_radix(digits, 16).map_err(|_| UnitConversionError::InvalidHex(raw.to_string()))
}

/// An amount in ether, stored as wei so that every 256-bit amount is exact.
///
/// Displays as a plain decimal without trailing zeros (`1`, `1.5`, `0.000000000000000001`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ether(U256);

impl Ether {
	pub const fn from_wei(wei: U256) -> Self {
		Self(wei)
	}

	pub const fn wei(&self) -> U256 {
		self.0
	}

	pub fn is_zero(&self) -> bool {
		self.0.is_zero()
	}
}

impl fmt::Display for Ether {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		// format_ether always prints all 18 decimals
		let full = format_ether(self.0);
		let trimmed = full.trim_end_matches('0').trim_end_matches('.');
		f.write_str(trimmed)
	}
}

/// Converts a wei amount into ether without rounding.
pub fn wei_to_ether(wei: U256) -> Ether {
	Ether::from_wei(wei)
}

/// Converts a wei amount into whole gwei, truncating toward zero.
pub fn wei_to_gwei(wei: U256) -> U256 {
	wei / U256::from(WEI_PER_GWEI)
}

/// Converts an ether amount into wei.
///
/// Fails for negative amounts and for amounts more precise than one wei.
pub fn ether_to_wei(ether: Decimal) -> Result<U256, UnitConversionError> {
	if ether < Decimal::ZERO {
		return Err(UnitConversionError::NegativeAmount(ether.to_string()));
	}

	let ether = ether.normalize();
	let scale = ether.scale();
	if scale > ETHER_DECIMALS {
		return Err(UnitConversionError::TooManyDecimals(ether.to_string()));
	}

	let mantissa = U256::from(ether.mantissa().unsigned_abs());
	Ok(mantissa * U256::from(10u64.pow(ETHER_DECIMALS - scale)))
}

/// Decodes `raw` and returns its value in ether (main unit).
pub fn value_in_main_unit(raw: &str) -> Result<Ether, UnitConversionError> {
	Ok(wei_to_ether(decode_quantity(raw)?))
}

/// Decodes `raw` and returns its value in whole gwei (sub-unit), truncated toward zero.
pub fn value_in_sub_unit(raw: &str) -> Result<U256, UnitConversionError> {
	Ok(wei_to_gwei(decode_quantity(raw)?))
}
