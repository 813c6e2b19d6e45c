//! Parsing utilities
//!
//! Helpers for turning environment and CLI strings into typed values.

use byte_unit::Byte;
use std::{str::FromStr, time::Duration};

/// Parses a string argument into a `u64` value representing a file size.
///
/// Accepts human-readable formats like "1GB", "500MB", "1024KB", etc.
/// Returns an error if the format is invalid.
pub fn parse_string_to_bytes_size(s: &str) -> Result<u64, String> {
	match Byte::from_str(s) {
		Ok(byte) => Ok(byte.as_u64()),
		Err(e) => Err(format!("Invalid size format: '{}'. Error: {}", s, e)),
	}
}

/// Normalizes a string by trimming whitespace and converting to lowercase.
pub fn normalize_string(input: &str) -> String {
	input.trim().to_lowercase()
}

/// Parses a boolean flag. Accepts `true/false`, `1/0`, `yes/no` and `on/off`, case-insensitive.
pub fn parse_bool_flag(input: &str) -> Result<bool, String> {
	match normalize_string(input).as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" => Ok(false),
		other => Err(format!("Invalid boolean value: '{}'", other)),
	}
}

/// Parses a whole number of milliseconds into a [`Duration`].
pub fn parse_duration_ms(input: &str) -> Result<Duration, String> {
	input
		.trim()
		.parse::<u64>()
		.map(Duration::from_millis)
		.map_err(|e| format!("Invalid millisecond value: '{}'. Error: {}", input, e))
}
