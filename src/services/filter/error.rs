//! Error types for filter operations.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents errors that can occur while filtering a transaction
#[derive(ThisError, Debug)]
pub enum FilterError {
	/// The transaction carries a value that cannot be decoded
	#[error("Invalid value: {0}")]
	InvalidValue(ErrorContext),

	/// The filter itself is misconfigured
	#[error("Invalid threshold: {0}")]
	InvalidThreshold(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl FilterError {
	// Invalid value
	pub fn invalid_value(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InvalidValue(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Invalid threshold
	pub fn invalid_threshold(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InvalidThreshold(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for FilterError {
	fn trace_id(&self) -> String {
		match self {
			Self::InvalidValue(ctx) => ctx.trace_id.clone(),
			Self::InvalidThreshold(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
