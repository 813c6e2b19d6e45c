//! Startup configuration of the mempool monitor.
//!
//! The configuration is read once from the process environment (after `.env` and CLI
//! overrides have been applied) and is immutable afterwards.

use rust_decimal::Decimal;
use std::{collections::HashMap, str::FromStr, time::Duration};
use url::Url;

use crate::{
	models::config::error::ConfigError,
	utils::{
		constants::{
			DEFAULT_LOOKUP_TIMEOUT, DEFAULT_MAX_CONCURRENT_LOOKUPS, DEFAULT_RECONNECT_INITIAL_BACKOFF,
			DEFAULT_RECONNECT_MAX_ATTEMPTS, DEFAULT_RECONNECT_MAX_BACKOFF,
			DEFAULT_SHUTDOWN_GRACE_PERIOD, DEFAULT_VALUE_THRESHOLD, ETHER_DECIMALS,
		},
		parse_bool_flag, parse_duration_ms,
	},
};

/// Reconnect policy for a lost pending transaction subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
	/// Attempts per outage. 0 disables reconnecting.
	pub max_attempts: u32,
	pub initial_backoff: Duration,
	pub max_backoff: Duration,
}

impl Default for ReconnectConfig {
	fn default() -> Self {
		Self {
			max_attempts: DEFAULT_RECONNECT_MAX_ATTEMPTS,
			initial_backoff: DEFAULT_RECONNECT_INITIAL_BACKOFF,
			max_backoff: DEFAULT_RECONNECT_MAX_BACKOFF,
		}
	}
}

impl ReconnectConfig {
	pub fn is_enabled(&self) -> bool {
		self.max_attempts > 0
	}
}

/// Configuration of a monitor run
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
	/// WebSocket endpoint of the node (`ws://` or `wss://`)
	pub node_url: Url,
	/// Minimum value in ether. Only consulted when `apply_value_threshold` is set.
	pub value_threshold: Decimal,
	pub apply_value_threshold: bool,
	/// Upper bound of concurrently running lookups
	pub max_concurrent_lookups: usize,
	pub lookup_timeout: Duration,
	pub reconnect: ReconnectConfig,
	/// Time in-flight lookups get to finish once shutdown is requested
	pub shutdown_grace_period: Duration,
}

impl MonitorConfig {
	/// Creates a configuration with default settings for the given node.
	pub fn new(node_url: Url) -> Self {
		Self {
			node_url,
			value_threshold: Decimal::from(DEFAULT_VALUE_THRESHOLD),
			apply_value_threshold: false,
			max_concurrent_lookups: DEFAULT_MAX_CONCURRENT_LOOKUPS,
			lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
			reconnect: ReconnectConfig::default(),
			shutdown_grace_period: DEFAULT_SHUTDOWN_GRACE_PERIOD,
		}
	}

	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through `lookup` and validates it.
	///
	/// Unset and empty variables take their default; `NODE_URL` has none.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

		let node_url = get("NODE_URL").ok_or_else(|| ConfigError::missing_variable("NODE_URL", None))?;
		let mut config = Self::new(parse_node_url(&node_url)?);

		if let Some(value) = get("VALUE_THRESHOLD") {
			config.value_threshold = parse_var("VALUE_THRESHOLD", &value, |v| {
				Decimal::from_str(v.trim()).map_err(|e| e.to_string())
			})?;
		}
		if let Some(value) = get("APPLY_VALUE_THRESHOLD") {
			config.apply_value_threshold = parse_var("APPLY_VALUE_THRESHOLD", &value, parse_bool_flag)?;
		}
		if let Some(value) = get("MAX_CONCURRENT_LOOKUPS") {
			config.max_concurrent_lookups = parse_var("MAX_CONCURRENT_LOOKUPS", &value, |v| {
				v.trim().parse::<usize>().map_err(|e| e.to_string())
			})?;
		}
		if let Some(value) = get("LOOKUP_TIMEOUT_MS") {
			config.lookup_timeout = parse_var("LOOKUP_TIMEOUT_MS", &value, parse_duration_ms)?;
		}
		if let Some(value) = get("RECONNECT_MAX_ATTEMPTS") {
			config.reconnect.max_attempts = parse_var("RECONNECT_MAX_ATTEMPTS", &value, |v| {
				v.trim().parse::<u32>().map_err(|e| e.to_string())
			})?;
		}
		if let Some(value) = get("RECONNECT_INITIAL_BACKOFF_MS") {
			config.reconnect.initial_backoff =
				parse_var("RECONNECT_INITIAL_BACKOFF_MS", &value, parse_duration_ms)?;
		}
		if let Some(value) = get("RECONNECT_MAX_BACKOFF_MS") {
			config.reconnect.max_backoff =
				parse_var("RECONNECT_MAX_BACKOFF_MS", &value, parse_duration_ms)?;
		}
		if let Some(value) = get("SHUTDOWN_GRACE_PERIOD_MS") {
			config.shutdown_grace_period =
				parse_var("SHUTDOWN_GRACE_PERIOD_MS", &value, parse_duration_ms)?;
		}

		config.validate()?;
		Ok(config)
	}

	/// Checks ranges and cross-field consistency.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.value_threshold.is_sign_negative() && !self.value_threshold.is_zero() {
			return Err(ConfigError::validation_error(
				"Value threshold must not be negative",
				None,
				Some(HashMap::from([(
					"value_threshold".to_string(),
					self.value_threshold.to_string(),
				)])),
			));
		}
		if self.value_threshold.normalize().scale() > ETHER_DECIMALS {
			return Err(ConfigError::validation_error(
				format!(
					"Value threshold must not have more than {} decimal places",
					ETHER_DECIMALS
				),
				None,
				Some(HashMap::from([(
					"value_threshold".to_string(),
					self.value_threshold.to_string(),
				)])),
			));
		}
		if self.max_concurrent_lookups == 0 {
			return Err(ConfigError::validation_error(
				"Max concurrent lookups must be greater than 0",
				None,
				None,
			));
		}
		if self.lookup_timeout.is_zero() {
			return Err(ConfigError::validation_error(
				"Lookup timeout must be greater than 0",
				None,
				None,
			));
		}
		if self.reconnect.initial_backoff > self.reconnect.max_backoff {
			return Err(ConfigError::validation_error(
				"Initial reconnect backoff must not exceed the maximum backoff",
				None,
				Some(HashMap::from([
					(
						"initial_backoff_ms".to_string(),
						self.reconnect.initial_backoff.as_millis().to_string(),
					),
					(
						"max_backoff_ms".to_string(),
						self.reconnect.max_backoff.as_millis().to_string(),
					),
				])),
			));
		}
		Ok(())
	}
}

fn parse_node_url(raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw.trim()).map_err(|e| {
		ConfigError::parse_error(
			"NODE_URL is not a valid URL",
			Some(Box::new(e)),
			Some(HashMap::from([("value".to_string(), raw.to_string())])),
		)
	})?;

	match url.scheme() {
		"ws" | "wss" => Ok(url),
		scheme => Err(ConfigError::validation_error(
			format!(
				"NODE_URL must use the ws or wss scheme, got {}",
				scheme
			),
			None,
			Some(HashMap::from([("value".to_string(), raw.to_string())])),
		)),
	}
}

fn parse_var<T>(
	name: &str,
	value: &str,
	parse: impl Fn(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
	parse(value).map_err(|reason| {
		ConfigError::parse_error(
			format!("Invalid {}: {}", name, reason),
			None,
			Some(HashMap::from([
				("variable".to_string(), name.to_string()),
				("value".to_string(), value.to_string()),
			])),
		)
	})
}
