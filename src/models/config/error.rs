//! Configuration error types.
//!
//! Errors raised while reading the startup environment and validating the resulting
//! [`MonitorConfig`](crate::models::MonitorConfig). All of them are fatal at startup.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents errors that can occur while building the configuration
#[derive(ThisError, Debug)]
pub enum ConfigError {
	/// A required environment variable is not set
	#[error("Missing variable: {0}")]
	MissingVariable(ErrorContext),

	/// A variable is set but cannot be parsed into its type
	#[error("Parse error: {0}")]
	ParseError(ErrorContext),

	/// Values parsed but are out of range or inconsistent
	#[error("Validation error: {0}")]
	ValidationError(ErrorContext),

	/// A `.env` file exists but cannot be read or parsed
	#[error("Env file error: {0}")]
	EnvFileError(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl ConfigError {
	// Configuration errors are logged once by the binary before exiting, not here.

	pub fn missing_variable(
		name: impl Into<String>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		let name = name.into();
		Self::MissingVariable(
			ErrorContext::new(format!("{} is required", name), None, metadata)
				.with_metadata("variable", name),
		)
	}

	pub fn parse_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ParseError(ErrorContext::new(msg, source, metadata))
	}

	pub fn validation_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ValidationError(ErrorContext::new(msg, source, metadata))
	}

	pub fn env_file_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::EnvFileError(ErrorContext::new(msg, source, metadata))
	}
}

impl TraceableError for ConfigError {
	fn trace_id(&self) -> String {
		match self {
			Self::MissingVariable(ctx) => ctx.trace_id.clone(),
			Self::ParseError(ctx) => ctx.trace_id.clone(),
			Self::ValidationError(ctx) => ctx.trace_id.clone(),
			Self::EnvFileError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}

impl From<dotenvy::Error> for ConfigError {
	fn from(err: dotenvy::Error) -> Self {
		Self::env_file_error("Failed to load .env file", Some(Box::new(err)), None)
	}
}
